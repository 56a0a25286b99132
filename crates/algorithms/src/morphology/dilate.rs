//! Binary morphological dilation
//!
//! A cell of the output is set when the structuring element, centred on
//! it, overlaps a set cell of the input. Cells outside the grid
//! count as unset, so growth never leaks in from the border.

use ndarray::Array2;
use crate::maybe_rayon::*;
use urclimask_core::raster::Mask;
use urclimask_core::{Algorithm, Error, Result};

use super::element::StructuringElement;

/// Parameters for binary dilation
#[derive(Debug, Clone, Default)]
pub struct DilateMaskParams {
    /// Structuring element shape
    pub element: StructuringElement,
}

/// Binary dilation algorithm
#[derive(Debug, Clone, Default)]
pub struct DilateMask;

impl Algorithm for DilateMask {
    type Input = Mask;
    type Output = Mask;
    type Params = DilateMaskParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "DilateMask"
    }

    fn description(&self) -> &'static str {
        "Binary dilation of a mask by a structuring element"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        dilate_mask(&input, &params.element)
    }
}

/// Dilate a binary mask
///
/// # Arguments
/// * `mask` - Input mask
/// * `element` - Structuring element defining the neighborhood shape
pub fn dilate_mask(mask: &Mask, element: &StructuringElement) -> Result<Mask> {
    element.validate()?;

    let (rows, cols) = mask.shape();
    let offsets = element.offsets();

    let output_data: Vec<bool> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![false; cols];

            for (col, out) in row_data.iter_mut().enumerate() {
                let r = row as isize;
                let c = col as isize;

                *out = offsets.iter().any(|&(dr, dc)| {
                    let nr = r + dr;
                    let nc = c + dc;
                    nr >= 0
                        && nc >= 0
                        && (nr as usize) < rows
                        && (nc as usize) < cols
                        && unsafe { mask.get_unchecked(nr as usize, nc as usize) }
                });
            }

            row_data
        })
        .collect();

    let data = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(Mask::from_array(data).with_transform(*mask.transform()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_cell(rows: usize, cols: usize, row: usize, col: usize) -> Mask {
        Mask::from_fn(rows, cols, |(r, c)| r == row && c == col)
    }

    #[test]
    fn test_plus_grows_four_neighbours() {
        let mask = single_cell(5, 5, 2, 2);
        let out = dilate_mask(&mask, &StructuringElement::plus()).unwrap();
        assert_eq!(out.count(), 5);
        assert!(out.get(1, 2).unwrap());
        assert!(out.get(2, 3).unwrap());
        assert!(!out.get(1, 1).unwrap());
    }

    #[test]
    fn test_full_grows_eight_neighbours() {
        let mask = single_cell(5, 5, 2, 2);
        let out = dilate_mask(&mask, &StructuringElement::full()).unwrap();
        assert_eq!(out.count(), 9);
        assert!(out.get(1, 1).unwrap());
        assert!(out.get(3, 3).unwrap());
    }

    #[test]
    fn test_border_is_not_padded() {
        let mask = single_cell(3, 3, 0, 0);
        let out = dilate_mask(&mask, &StructuringElement::full()).unwrap();
        assert_eq!(out.count(), 4);
        assert!(!out.get(2, 2).unwrap());
    }

    #[test]
    fn test_dilation_is_superset() {
        let mask = Mask::from_fn(6, 7, |(r, c)| (r * 7 + c) % 5 == 0);
        let out = dilate_mask(&mask, &StructuringElement::plus()).unwrap();
        assert!(mask.is_subset_of(&out).unwrap());
    }

    #[test]
    fn test_algorithm_trait() {
        let mask = single_cell(5, 5, 2, 2);
        let out = DilateMask.execute_default(mask).unwrap();
        assert_eq!(out.count(), 5);
        assert_eq!(DilateMask.name(), "DilateMask");
    }
}
