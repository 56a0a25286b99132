//! City outlines on the model grid
//!
//! - **GeoJSON**: `Polygon`, `MultiPolygon`, `Feature` and
//!   `FeatureCollection` objects read into a `geo` multipolygon
//! - **Coverage**: percentage of each grid cell covered by the city, an
//!   urban fraction layer for grids that ship without one

mod coverage;
mod geojson;

pub use coverage::{dissolve, polygon_coverage, FRACTION_VARIABLE};
pub use geojson::CityOutline;
