//! Boolean mask over a raster grid

use crate::coords::CropWindow;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use ndarray::{s, Array2, Zip};

/// A binary mask sharing the georeferencing of the layers it was derived from.
///
/// Masks are value types: every combination returns a new mask and leaves
/// its operands untouched. Combining masks of different shapes is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    data: Array2<bool>,
    transform: GeoTransform,
}

impl Mask {
    /// Mask with no cells set
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), false))
    }

    /// Mask with every cell set
    pub fn full(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), true))
    }

    pub fn from_array(data: Array2<bool>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
        }
    }

    /// Build a mask by evaluating `f(row, col)` for every cell
    pub fn from_fn<F>(rows: usize, cols: usize, f: F) -> Self
    where
        F: FnMut((usize, usize)) -> bool,
    {
        Self::from_array(Array2::from_shape_fn((rows, cols), f))
    }

    /// Builder-style transform assignment
    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn data(&self) -> &Array2<bool> {
        &self.data
    }

    /// Get the cell at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<bool> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get the cell at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> bool {
        unsafe { *self.data.uget((row, col)) }
    }

    pub fn set(&mut self, row: usize, col: usize, value: bool) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Number of set cells
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// True when no cell is set
    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Iterate over (row, col) of set cells in raster-scan order
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.data
            .indexed_iter()
            .filter_map(|(idx, &v)| v.then_some(idx))
    }

    /// Cell-wise intersection
    pub fn and(&self, other: &Mask) -> Result<Mask> {
        self.combine(other, |a, b| a && b)
    }

    /// Cell-wise union
    pub fn or(&self, other: &Mask) -> Result<Mask> {
        self.combine(other, |a, b| a || b)
    }

    /// Cells set here but not in `other`
    pub fn and_not(&self, other: &Mask) -> Result<Mask> {
        self.combine(other, |a, b| a && !b)
    }

    /// Whether every set cell is also set in `other`
    pub fn is_subset_of(&self, other: &Mask) -> Result<bool> {
        self.ensure_same_shape(other)?;
        Ok(Zip::from(&self.data)
            .and(&other.data)
            .all(|&a, &b| !a || b))
    }

    pub fn ensure_same_shape(&self, other: &Mask) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::shape_mismatch(self.shape(), other.shape()));
        }
        Ok(())
    }

    /// Extract a sub-window; the transform is shifted to the window origin
    pub fn crop(&self, window: &CropWindow) -> Result<Mask> {
        window.check_within(self.shape())?;
        Ok(Mask {
            data: self
                .data
                .slice(s![window.row_start..window.row_end, window.col_start..window.col_end])
                .to_owned(),
            transform: self.transform.shifted(window.row_start, window.col_start),
        })
    }

    /// Encode as a float raster (1.0 set, 0.0 unset)
    pub fn to_raster(&self) -> Raster<f64> {
        let mut raster = Raster::from_array(self.data.mapv(|v| if v { 1.0 } else { 0.0 }));
        raster.set_transform(self.transform);
        raster
    }

    fn combine<F>(&self, other: &Mask, op: F) -> Result<Mask>
    where
        F: Fn(bool, bool) -> bool,
    {
        self.ensure_same_shape(other)?;
        let data = Zip::from(&self.data)
            .and(&other.data)
            .map_collect(|&a, &b| op(a, b));
        Ok(Mask {
            data,
            transform: self.transform,
        })
    }
}
