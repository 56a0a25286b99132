//! Grid coordinates and cropping around a city center
//!
//! Layers arrive either on a regular grid (independent 1-D latitude and
//! longitude axes) or on a curvilinear grid (2-D latitude/longitude arrays,
//! typical of rotated-pole regional climate models). Both support locating
//! the cell nearest to a point and cutting a window around it.

use std::ops::Range;

use ndarray::{s, Array2};

use crate::error::{Error, Result};
use crate::raster::GeoTransform;

/// Approximate length of one degree of latitude, in kilometres
pub const KM_PER_DEGREE: f64 = 111.0;

/// Half-open row/column window into a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl CropWindow {
    pub fn new(rows: Range<usize>, cols: Range<usize>) -> Self {
        Self {
            row_start: rows.start,
            row_end: rows.end,
            col_start: cols.start,
            col_end: cols.end,
        }
    }

    pub fn rows(&self) -> usize {
        self.row_end.saturating_sub(self.row_start)
    }

    pub fn cols(&self) -> usize {
        self.col_end.saturating_sub(self.col_start)
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }

    /// Fail unless the window lies inside a grid of the given shape
    pub fn check_within(&self, shape: (usize, usize)) -> Result<()> {
        let (rows, cols) = shape;
        if self.row_start > self.row_end || self.row_end > rows {
            return Err(Error::IndexOutOfBounds {
                row: self.row_end,
                col: self.col_start,
                rows,
                cols,
            });
        }
        if self.col_start > self.col_end || self.col_end > cols {
            return Err(Error::IndexOutOfBounds {
                row: self.row_start,
                col: self.col_end,
                rows,
                cols,
            });
        }
        Ok(())
    }
}

/// Latitude/longitude of every cell of a grid
#[derive(Debug, Clone, PartialEq)]
pub enum GridCoords {
    /// Independent axes: `lat[row]`, `lon[col]`
    Regular { lat: Vec<f64>, lon: Vec<f64> },
    /// Per-cell coordinates: `lat[(row, col)]`, `lon[(row, col)]`
    Curvilinear { lat: Array2<f64>, lon: Array2<f64> },
}

impl GridCoords {
    pub fn regular(lat: Vec<f64>, lon: Vec<f64>) -> Self {
        GridCoords::Regular { lat, lon }
    }

    /// Curvilinear coordinates; both arrays must share a shape
    pub fn curvilinear(lat: Array2<f64>, lon: Array2<f64>) -> Result<Self> {
        if lat.dim() != lon.dim() {
            return Err(Error::shape_mismatch(lat.dim(), lon.dim()));
        }
        Ok(GridCoords::Curvilinear { lat, lon })
    }

    /// Regular axes from cell centers of a north-up transform (x = lon, y = lat)
    pub fn from_transform(transform: &GeoTransform, rows: usize, cols: usize) -> Self {
        let lat = (0..rows).map(|r| transform.pixel_to_geo(0, r).1).collect();
        let lon = (0..cols).map(|c| transform.pixel_to_geo(c, 0).0).collect();
        GridCoords::Regular { lat, lon }
    }

    /// Grid shape (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        match self {
            GridCoords::Regular { lat, lon } => (lat.len(), lon.len()),
            GridCoords::Curvilinear { lat, .. } => lat.dim(),
        }
    }

    /// Cell nearest to (lat, lon); `None` for an empty or all-NaN grid.
    ///
    /// Regular axes are searched independently; curvilinear grids by squared
    /// distance in degrees, first minimum in raster-scan order.
    pub fn nearest_index(&self, lat: f64, lon: f64) -> Option<(usize, usize)> {
        match self {
            GridCoords::Regular { lat: lats, lon: lons } => {
                let row = argmin(lats.iter().map(|&v| (v - lat).abs()))?;
                let col = argmin(lons.iter().map(|&v| (v - lon).abs()))?;
                Some((row, col))
            }
            GridCoords::Curvilinear { lat: lats, lon: lons } => {
                let cols = lats.ncols();
                let dist = lats
                    .iter()
                    .zip(lons.iter())
                    .map(|(&y, &x)| (y - lat).powi(2) + (x - lon).powi(2));
                argmin(dist).map(|i| (i / cols, i % cols))
            }
        }
    }

    /// Window of cells within `lat_lim`/`lon_lim` degrees of a center point.
    ///
    /// Regular grids select by coordinate value. Curvilinear grids count
    /// `floor(111 * lim / resolution_km)` cells either side of the nearest
    /// cell, so `resolution_km` is required for them.
    pub fn crop_window(
        &self,
        center_lat: f64,
        center_lon: f64,
        lat_lim: f64,
        lon_lim: f64,
        resolution_km: Option<f64>,
    ) -> Result<CropWindow> {
        let empty = || Error::EmptyWindow {
            lat: center_lat,
            lon: center_lon,
        };

        let window = match self {
            GridCoords::Regular { lat, lon } => {
                let rows = axis_range(lat, center_lat - lat_lim, center_lat + lat_lim)
                    .ok_or_else(empty)?;
                let cols = axis_range(lon, center_lon - lon_lim, center_lon + lon_lim)
                    .ok_or_else(empty)?;
                CropWindow::new(rows, cols)
            }
            GridCoords::Curvilinear { lat, .. } => {
                let res = match resolution_km {
                    Some(r) if r > 0.0 => r,
                    other => {
                        return Err(Error::InvalidParameter {
                            name: "resolution_km",
                            value: format!("{:?}", other),
                            reason: "curvilinear grids need a positive resolution".to_string(),
                        })
                    }
                };
                let dlat = (KM_PER_DEGREE * lat_lim / res).floor() as usize;
                let dlon = (KM_PER_DEGREE * lon_lim / res).floor() as usize;
                let (row, col) = self
                    .nearest_index(center_lat, center_lon)
                    .ok_or_else(empty)?;
                let (rows, cols) = lat.dim();
                CropWindow::new(
                    row.saturating_sub(dlat)..(row + dlat).min(rows),
                    col.saturating_sub(dlon)..(col + dlon).min(cols),
                )
            }
        };

        if window.is_empty() {
            return Err(empty());
        }
        Ok(window)
    }

    /// Coordinates of a sub-window
    pub fn crop(&self, window: &CropWindow) -> Result<GridCoords> {
        window.check_within(self.shape())?;
        Ok(match self {
            GridCoords::Regular { lat, lon } => GridCoords::Regular {
                lat: lat[window.row_start..window.row_end].to_vec(),
                lon: lon[window.col_start..window.col_end].to_vec(),
            },
            GridCoords::Curvilinear { lat, lon } => {
                let (rows, cols) = (window.row_start..window.row_end, window.col_start..window.col_end);
                GridCoords::Curvilinear {
                    lat: lat.slice(s![rows.clone(), cols.clone()]).to_owned(),
                    lon: lon.slice(s![rows, cols]).to_owned(),
                }
            }
        })
    }
}

/// Index of the smallest non-NaN value
fn argmin(values: impl Iterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| v < b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// Contiguous index range of a monotonic axis whose values fall in [lo, hi]
fn axis_range(axis: &[f64], lo: f64, hi: f64) -> Option<Range<usize>> {
    let mut inside = axis
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v >= lo && v <= hi)
        .map(|(i, _)| i);
    let first = inside.next()?;
    let last = inside.last().unwrap_or(first);
    Some(first..last + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular_grid() -> GridCoords {
        // 0.5 degree spacing, latitude descending like a north-up raster
        let lat = (0..10).map(|i| 45.0 - 0.5 * i as f64).collect();
        let lon = (0..12).map(|i| -5.0 + 0.5 * i as f64).collect();
        GridCoords::regular(lat, lon)
    }

    #[test]
    fn test_nearest_index_regular() {
        let grid = regular_grid();
        assert_eq!(grid.nearest_index(43.1, -3.4), Some((4, 3)));
        assert_eq!(grid.shape(), (10, 12));
    }

    #[test]
    fn test_nearest_index_curvilinear() {
        let lat = Array2::from_shape_fn((4, 5), |(r, c)| 40.0 + r as f64 + 0.1 * c as f64);
        let lon = Array2::from_shape_fn((4, 5), |(r, c)| -3.0 + c as f64 + 0.1 * r as f64);
        let grid = GridCoords::curvilinear(lat, lon).unwrap();
        assert_eq!(grid.nearest_index(42.2, -1.0), Some((2, 2)));
    }

    #[test]
    fn test_crop_window_regular_descending_axis() {
        let grid = regular_grid();
        let window = grid.crop_window(43.0, -2.0, 1.0, 1.0, None).unwrap();
        // lat in [42, 44] -> rows 2..=6, lon in [-3, -1] -> cols 4..=8
        assert_eq!(window, CropWindow::new(2..7, 4..9));

        let cropped = grid.crop(&window).unwrap();
        assert_eq!(cropped.shape(), (5, 5));
    }

    #[test]
    fn test_crop_window_outside_grid() {
        let grid = regular_grid();
        let result = grid.crop_window(10.0, 10.0, 0.1, 0.1, None);
        assert!(matches!(result, Err(Error::EmptyWindow { .. })));
    }

    #[test]
    fn test_crop_window_curvilinear_counts_cells() {
        let lat = Array2::from_shape_fn((20, 20), |(r, _)| 40.0 + 0.1 * r as f64);
        let lon = Array2::from_shape_fn((20, 20), |(_, c)| -3.0 + 0.1 * c as f64);
        let grid = GridCoords::curvilinear(lat, lon).unwrap();

        // 111 * 0.3 / 11 = 3.03 -> 3 cells each side
        let window = grid.crop_window(41.0, -2.0, 0.3, 0.3, Some(11.0)).unwrap();
        assert_eq!(window, CropWindow::new(7..13, 7..13));

        let near_edge = grid.crop_window(40.0, -3.0, 0.3, 0.3, Some(11.0)).unwrap();
        assert_eq!(near_edge, CropWindow::new(0..3, 0..3));
    }

    #[test]
    fn test_crop_window_curvilinear_requires_resolution() {
        let lat = Array2::zeros((3, 3));
        let lon = Array2::zeros((3, 3));
        let grid = GridCoords::curvilinear(lat, lon).unwrap();
        assert!(matches!(
            grid.crop_window(0.0, 0.0, 1.0, 1.0, None),
            Err(Error::InvalidParameter { name: "resolution_km", .. })
        ));
    }

    #[test]
    fn test_from_transform_cell_centers() {
        let gt = GeoTransform::new(-4.0, 41.0, 0.5, -0.5);
        match GridCoords::from_transform(&gt, 2, 3) {
            GridCoords::Regular { lat, lon } => {
                assert_eq!(lat, vec![40.75, 40.25]);
                assert_eq!(lon, vec![-3.75, -3.25, -2.75]);
            }
            other => panic!("expected regular grid, got {:?}", other),
        }
    }
}
