//! I/O for input layers and persisted masks

mod metadata;
mod native;

pub use metadata::{read_metadata, sidecar_path, write_metadata};
pub use native::{read_geotiff, write_geotiff, GeoTiffOptions};
