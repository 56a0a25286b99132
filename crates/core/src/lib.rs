//! # urclimask core
//!
//! Core types and I/O for delineating urban areas and their rural vicinity
//! on gridded climate-model fields.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced 2-D grid for input layers
//! - `Mask`: boolean grid for derived masks
//! - `GridCoords`: latitude/longitude of grid cells, nearest-cell lookup and cropping
//! - `Error`/`Result`: the shared error taxonomy
//! - GeoTIFF reading/writing and JSON metadata sidecars

pub mod coords;
pub mod error;
pub mod io;
pub mod raster;

pub use coords::{CropWindow, GridCoords};
pub use error::{Error, Result};
pub use raster::{GeoTransform, Mask, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::coords::{CropWindow, GridCoords};
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Mask, Raster, RasterElement};
    pub use crate::Algorithm;
}

/// Core trait for the mask algorithms.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
