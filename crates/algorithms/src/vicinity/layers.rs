//! Co-registered input layers

use urclimask_core::raster::Raster;
use urclimask_core::{CropWindow, Error, GridCoords, Result};

/// The three static fields the engine needs, on one shared grid.
#[derive(Debug, Clone)]
pub struct StaticLayers {
    /// Urban fraction (0-1 or 0-100, matched by the configured thresholds)
    pub urban_fraction: Raster<f64>,
    /// Surface elevation (m)
    pub elevation: Raster<f64>,
    /// Land fraction (%)
    pub land_fraction: Raster<f64>,
    /// Cell coordinates, when known
    pub coords: Option<GridCoords>,
}

impl StaticLayers {
    /// Bundle three layers; fails with [`Error::SizeMismatch`] unless they share a shape
    pub fn new(
        urban_fraction: Raster<f64>,
        elevation: Raster<f64>,
        land_fraction: Raster<f64>,
    ) -> Result<Self> {
        urban_fraction.ensure_same_shape(&elevation)?;
        urban_fraction.ensure_same_shape(&land_fraction)?;
        Ok(Self {
            urban_fraction,
            elevation,
            land_fraction,
            coords: None,
        })
    }

    /// Attach cell coordinates; their shape must match the layers
    pub fn with_coords(mut self, coords: GridCoords) -> Result<Self> {
        if coords.shape() != self.shape() {
            return Err(Error::shape_mismatch(self.shape(), coords.shape()));
        }
        self.coords = Some(coords);
        Ok(self)
    }

    /// Attach regular coordinates derived from the urban layer's transform
    pub fn with_transform_coords(self) -> Result<Self> {
        let (rows, cols) = self.shape();
        let coords = GridCoords::from_transform(self.urban_fraction.transform(), rows, cols);
        self.with_coords(coords)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.urban_fraction.shape()
    }

    /// Cut every layer (and the coordinates) to a window
    pub fn crop(&self, window: &CropWindow) -> Result<Self> {
        Ok(Self {
            urban_fraction: self.urban_fraction.crop(window)?,
            elevation: self.elevation.crop(window)?,
            land_fraction: self.land_fraction.crop(window)?,
            coords: self.coords.as_ref().map(|c| c.crop(window)).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urclimask_core::GeoTransform;

    fn layer(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(-4.0, 41.0, 0.1, -0.1));
        r
    }

    #[test]
    fn test_rejects_mismatched_layers() {
        let result = StaticLayers::new(layer(5, 5, 0.0), layer(5, 6, 0.0), layer(5, 5, 0.0));
        assert!(matches!(result, Err(Error::SizeMismatch { .. })));
    }

    #[test]
    fn test_rejects_mismatched_coords() {
        let layers = StaticLayers::new(layer(3, 3, 0.0), layer(3, 3, 0.0), layer(3, 3, 0.0)).unwrap();
        let coords = GridCoords::regular(vec![0.0; 3], vec![0.0; 4]);
        assert!(layers.with_coords(coords).is_err());
    }

    #[test]
    fn test_crop_keeps_layers_aligned() {
        let layers = StaticLayers::new(layer(10, 10, 1.0), layer(10, 10, 2.0), layer(10, 10, 3.0))
            .unwrap()
            .with_transform_coords()
            .unwrap();
        let window = CropWindow::new(2..6, 3..8);
        let cropped = layers.crop(&window).unwrap();

        assert_eq!(cropped.shape(), (4, 5));
        assert_eq!(cropped.elevation.shape(), (4, 5));
        assert_eq!(cropped.coords.as_ref().map(|c| c.shape()), Some((4, 5)));
        assert_eq!(cropped.land_fraction.get(0, 0).unwrap(), 3.0);
    }
}
