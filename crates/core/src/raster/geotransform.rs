//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and geographic coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// For the regular lat/lon grids this crate works with, `x` is longitude,
/// `y` is latitude and both rotations are zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
    /// Rotation about X axis (usually 0)
    pub row_rotation: f64,
    /// Rotation about Y axis (usually 0)
    pub col_rotation: f64,
}

impl GeoTransform {
    /// Create a new GeoTransform with no rotation (north-up image)
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Convert pixel coordinates to geographic coordinates of the pixel center
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        let col_f = col as f64 + 0.5;
        let row_f = row as f64 + 0.5;

        let x = self.origin_x + col_f * self.pixel_width + row_f * self.row_rotation;
        let y = self.origin_y + col_f * self.col_rotation + row_f * self.pixel_height;

        (x, y)
    }

    /// Transform of a sub-window whose upper-left cell is (row, col) of this grid
    pub fn shifted(&self, row: usize, col: usize) -> Self {
        let (r, c) = (row as f64, col as f64);
        Self {
            origin_x: self.origin_x + c * self.pixel_width + r * self.row_rotation,
            origin_y: self.origin_y + c * self.col_rotation + r * self.pixel_height,
            ..*self
        }
    }

    /// Get the cell size (assumes square pixels and no rotation)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Bounding box (min_x, min_y, max_x, max_y) of a grid with the given dimensions
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let corner = |col: usize, row: usize| {
            let (c, r) = (col as f64, row as f64);
            (
                self.origin_x + c * self.pixel_width + r * self.row_rotation,
                self.origin_y + c * self.col_rotation + r * self.pixel_height,
            )
        };
        let corners = [corner(0, 0), corner(width, 0), corner(0, height), corner(width, height)];

        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_to_geo_cell_center() {
        let gt = GeoTransform::new(-4.0, 41.0, 0.1, -0.1);

        let (x, y) = gt.pixel_to_geo(5, 10);

        assert_relative_eq!(x, -3.45, epsilon = 1e-10);
        assert_relative_eq!(y, 39.95, epsilon = 1e-10);
    }

    #[test]
    fn test_shifted_origin() {
        let gt = GeoTransform::new(-4.0, 41.0, 0.1, -0.1);
        let sub = gt.shifted(10, 20);

        assert_relative_eq!(sub.origin_x, -2.0, epsilon = 1e-10);
        assert_relative_eq!(sub.origin_y, 40.0, epsilon = 1e-10);
        assert_eq!(sub.pixel_width, gt.pixel_width);
    }

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::new(0.0, 100.0, 1.0, -1.0);
        let (min_x, min_y, max_x, max_y) = gt.bounds(100, 100);

        assert_relative_eq!(min_x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(min_y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(max_x, 100.0, epsilon = 1e-10);
        assert_relative_eq!(max_y, 100.0, epsilon = 1e-10);
    }
}
