//! Binary mathematical morphology for mask growth
//!
//! - **Structuring elements**: 4-connected plus and 8-connected square of any radius
//! - **Dilation**: grows set regions of a mask by one element footprint

mod dilate;
mod element;

pub use dilate::{dilate_mask, DilateMask, DilateMaskParams};
pub use element::StructuringElement;
