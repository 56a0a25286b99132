//! Connected regions of binary masks
//!
//! - **Labeling**: flood-fill labeling with 4- or 8-connectivity, region
//!   sizes and centroids
//! - **Cleaning**: removal of regions below a size floor with a
//!   nearest-centroid fallback

mod clean;
mod label;

pub use clean::{remove_small_components, CleanOutcome, CleanParams, RemoveSmallComponents};
pub use label::{label_components, Connectivity, LabeledRegions, Region};
