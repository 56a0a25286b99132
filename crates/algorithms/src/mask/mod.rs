//! Raster mask primitives
//!
//! Elementwise thresholding of continuous layers. Boolean combination of
//! the resulting masks lives on [`urclimask_core::Mask`] itself
//! (`and`, `or`, `and_not`, `not`).

mod threshold;

pub use threshold::{threshold, within, Comparison};
