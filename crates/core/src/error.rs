//! Error types for urclimask

use thiserror::Error;

/// Main error type for urclimask operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Grid shape mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("No urban cells found in the urban-core mask")]
    EmptyUrbanMask,

    #[error("Every urban cell has nodata elevation; elevation envelope is undefined")]
    NoUrbanElevation,

    #[error(
        "Vicinity ratio unreachable: {accepted} cells accepted after {iterations} iterations, \
         target was more than {target}"
    )]
    RatioUnreachable {
        iterations: usize,
        accepted: usize,
        target: f64,
    },

    #[error("Crop window around ({lat}, {lon}) contains no cells")]
    EmptyWindow { lat: f64, lon: f64 },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a [`Error::SizeMismatch`] from an expected and an actual shape
    pub fn shape_mismatch(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Error::SizeMismatch {
            er: expected.0,
            ec: expected.1,
            ar: actual.0,
            ac: actual.1,
        }
    }

    /// Whether this error is a violated input precondition (bad layers or empty urban mask)
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::SizeMismatch { .. } | Error::EmptyUrbanMask | Error::NoUrbanElevation
        )
    }
}

/// Result type alias for urclimask operations
pub type Result<T> = std::result::Result<T, Error>;
