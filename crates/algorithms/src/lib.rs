//! # urclimask algorithms
//!
//! Mask algorithms for separating urban cells from their rural vicinity on
//! gridded climate-model fields.
//!
//! ## Modules
//!
//! - **mask**: threshold and range masks over continuous layers
//! - **morphology**: binary dilation with plus or square elements
//! - **components**: connected-region labeling and small-region removal
//! - **vicinity**: the two-stage urban/vicinity delineation engine
//! - **vector**: urban fraction of grid cells from city polygons

pub mod components;
pub mod mask;
pub(crate) mod maybe_rayon;
pub mod morphology;
pub mod vector;
pub mod vicinity;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::components::{
        label_components, remove_small_components, CleanOutcome, CleanParams, Connectivity,
        LabeledRegions, Region, RemoveSmallComponents,
    };
    pub use crate::mask::{threshold, within, Comparison};
    pub use crate::morphology::{dilate_mask, DilateMask, DilateMaskParams, StructuringElement};
    pub use crate::vector::{polygon_coverage, CityOutline};
    pub use crate::vicinity::{
        DelineateVicinity, ElevationEnvelope, GrowthReport, MaskAttributes, MaskSet,
        StaticLayers, Termination, UrbanVicinity, VicinityMask, VicinityParams,
    };
    pub use urclimask_core::prelude::*;
}
