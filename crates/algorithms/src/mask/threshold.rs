//! Threshold a continuous layer into a binary mask

use ndarray::Array2;
use crate::maybe_rayon::*;
use urclimask_core::raster::{Mask, Raster};
use urclimask_core::{Error, Result};

/// Comparison applied between a cell value and the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl Comparison {
    fn test(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Greater => value > threshold,
            Comparison::GreaterOrEqual => value >= threshold,
            Comparison::Less => value < threshold,
            Comparison::LessOrEqual => value <= threshold,
        }
    }
}

/// Mask of cells whose value satisfies `value <cmp> threshold`.
///
/// NaN and nodata cells never pass.
///
/// # Example
/// ```ignore
/// // Cells with more than 10% urban cover
/// let urban = threshold(&urban_fraction, Comparison::Greater, 10.0)?;
/// ```
pub fn threshold(raster: &Raster<f64>, cmp: Comparison, value: f64) -> Result<Mask> {
    map_valid(raster, |v| cmp.test(v, value))
}

/// Mask of cells whose value lies in `[lo, hi]` (inclusive)
pub fn within(raster: &Raster<f64>, lo: f64, hi: f64) -> Result<Mask> {
    map_valid(raster, |v| v >= lo && v <= hi)
}

fn map_valid<F>(raster: &Raster<f64>, f: F) -> Result<Mask>
where
    F: Fn(f64) -> bool + Sync + Send,
{
    let (rows, cols) = raster.shape();
    let nodata = raster.nodata();

    let data: Vec<bool> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![false; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let val = unsafe { raster.get_unchecked(row, col) };

                if val.is_nan() {
                    continue;
                }
                if let Some(nd) = nodata {
                    if (val - nd).abs() < f64::EPSILON {
                        continue;
                    }
                }

                *out = f(val);
            }
            row_data
        })
        .collect();

    let array =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(Mask::from_array(array).with_transform(*raster.transform()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fraction_raster() -> Raster<f64> {
        let values = vec![
            0.0, 5.0, 10.0,
            15.0, f64::NAN, 50.0,
            -9999.0, 10.0, 80.0,
        ];
        let mut r = Raster::from_vec(values, 3, 3).unwrap();
        r.set_nodata(Some(-9999.0));
        r
    }

    #[test]
    fn test_greater_is_strict() {
        let mask = threshold(&fraction_raster(), Comparison::Greater, 10.0).unwrap();
        assert_eq!(mask.cells().collect::<Vec<_>>(), vec![(1, 0), (1, 2), (2, 2)]);
    }

    #[test]
    fn test_less_or_equal_skips_nodata() {
        let mask = threshold(&fraction_raster(), Comparison::LessOrEqual, 10.0).unwrap();
        // NaN at (1,1) and -9999 nodata at (2,0) never pass
        assert_eq!(
            mask.cells().collect::<Vec<_>>(),
            vec![(0, 0), (0, 1), (0, 2), (2, 1)]
        );
    }

    #[test]
    fn test_within_inclusive() {
        let mask = within(&fraction_raster(), 10.0, 50.0).unwrap();
        assert_eq!(mask.count(), 4);
        assert!(mask.get(0, 2).unwrap());
        assert!(mask.get(1, 2).unwrap());
    }
}
