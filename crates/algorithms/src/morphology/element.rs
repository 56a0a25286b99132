//! Structuring element definitions for mask dilation
//!
//! The growth engine alternates between two elements: the 4-connected
//! "plus" (`Cross(1)`) and the full 3×3 square (`Square(1)`).

use urclimask_core::{Error, Result};

/// Shape of a structuring element for morphological operations
#[derive(Debug, Clone, PartialEq)]
pub enum StructuringElement {
    /// Cross (plus-shaped) element of given radius
    Cross(usize),
    /// Square element of given radius (side = 2*radius + 1)
    Square(usize),
}

impl Default for StructuringElement {
    fn default() -> Self {
        StructuringElement::Cross(1)
    }
}

impl StructuringElement {
    /// 4-connected plus: center and its edge neighbours
    pub fn plus() -> Self {
        StructuringElement::Cross(1)
    }

    /// 8-connected full 3×3 square
    pub fn full() -> Self {
        StructuringElement::Square(1)
    }

    /// Validate the structuring element, returning an error for invalid configurations
    pub fn validate(&self) -> Result<()> {
        let (StructuringElement::Cross(r) | StructuringElement::Square(r)) = self;
        if *r == 0 {
            return Err(Error::InvalidParameter {
                name: "radius",
                value: "0".to_string(),
                reason: "structuring element radius must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Compute (dr, dc) offsets relative to center for all active cells
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        match self {
            StructuringElement::Cross(r) => {
                let r = *r as isize;
                let mut offsets = Vec::new();
                for d in -r..=r {
                    offsets.push((d, 0));
                    if d != 0 {
                        offsets.push((0, d));
                    }
                }
                offsets
            }
            StructuringElement::Square(r) => {
                let r = *r as isize;
                (-r..=r)
                    .flat_map(|dr| (-r..=r).map(move |dc| (dr, dc)))
                    .collect()
            }
        }
    }
}
