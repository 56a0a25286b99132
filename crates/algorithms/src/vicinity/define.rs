//! Mask definition stage
//!
//! Derives the four masks the growth engine works with from the static
//! layers: urban core, surrounding buffer candidates, elevation envelope
//! and land eligibility.

use serde::{Deserialize, Serialize};
use tracing::debug;
use urclimask_core::raster::{Mask, Raster};
use urclimask_core::{Error, Result};

use super::layers::StaticLayers;
use super::params::VicinityParams;
use crate::components::{remove_small_components, CleanParams};
use crate::mask::{threshold, within, Comparison};

/// Elevation range of the urban cells, widened by a tolerance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationEnvelope {
    /// Lowest elevation over the thresholded urban cells
    pub min: f64,
    /// Highest elevation over the thresholded urban cells
    pub max: f64,
    /// Margin added on both sides
    pub tolerance: f64,
}

impl ElevationEnvelope {
    pub fn lower(&self) -> f64 {
        self.min - self.tolerance
    }

    pub fn upper(&self) -> f64 {
        self.max + self.tolerance
    }

    /// Whether an elevation lies inside `[lower, upper]`
    pub fn contains(&self, elevation: f64) -> bool {
        elevation >= self.lower() && elevation <= self.upper()
    }

    /// Envelope of `elevation` over the cells set in `over`.
    ///
    /// NaN and nodata elevations are skipped; `None` when no valid cell remains.
    pub fn from_cells(elevation: &Raster<f64>, over: &Mask, tolerance: f64) -> Result<Option<Self>> {
        if elevation.shape() != over.shape() {
            return Err(Error::shape_mismatch(elevation.shape(), over.shape()));
        }

        let mut bounds: Option<(f64, f64)> = None;
        for (row, col) in over.cells() {
            let z = elevation.data()[(row, col)];
            if z.is_nan() || elevation.is_nodata(z) {
                continue;
            }
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(z), hi.max(z)),
                None => (z, z),
            });
        }

        Ok(bounds.map(|(min, max)| Self { min, max, tolerance }))
    }
}

/// The four masks produced by [`define_masks`]
#[derive(Debug, Clone)]
pub struct MaskSet {
    /// Cleaned urban cells on eligible land
    pub urban: Mask,
    /// Buffer cells that never become vicinity
    pub surrounding: Mask,
    /// Cells whose elevation lies in the envelope
    pub elevation: Mask,
    /// Cells with enough land
    pub land: Mask,
    /// Envelope behind `elevation`
    pub envelope: ElevationEnvelope,
    /// Cells above the urban threshold that the cleaner removed
    pub demoted_cells: usize,
    /// Whether the cleaner fell back to the region nearest the city center
    pub used_fallback: bool,
}

impl MaskSet {
    pub fn shape(&self) -> (usize, usize) {
        self.urban.shape()
    }

    /// Cells growth may enter: inside the envelope and on land
    pub fn eligible(&self) -> Result<Mask> {
        self.elevation.and(&self.land)
    }

    /// Fails unless all four masks share one shape
    pub fn check_shapes(&self) -> Result<()> {
        self.urban.ensure_same_shape(&self.surrounding)?;
        self.urban.ensure_same_shape(&self.elevation)?;
        self.urban.ensure_same_shape(&self.land)
    }
}

/// Derive the urban, surrounding, elevation and land masks.
///
/// `reference` is the city center in grid-index space (row, col), used by
/// the cleaner when no urban region reaches `min_city_size`.
///
/// # Errors
/// - [`Error::EmptyUrbanMask`] when no cell exceeds `urban_th`
/// - [`Error::NoUrbanElevation`] when every urban cell has nodata elevation
pub fn define_masks(
    layers: &StaticLayers,
    params: &VicinityParams,
    reference: (f64, f64),
) -> Result<MaskSet> {
    let urban_fraction = &layers.urban_fraction;

    let above = threshold(urban_fraction, Comparison::Greater, params.urban_th)?;
    if above.is_empty() {
        return Err(Error::EmptyUrbanMask);
    }

    let cleaned = remove_small_components(
        &above,
        &CleanParams {
            min_size: params.min_city_size,
            reference,
            connectivity: params.connectivity,
        },
    )?;
    let demoted = above.and_not(&cleaned.mask)?;

    let buffer_band = threshold(urban_fraction, Comparison::LessOrEqual, params.urban_th)?
        .and(&threshold(urban_fraction, Comparison::Greater, params.urban_sur_th)?)?;
    let surrounding = buffer_band.or(&demoted)?;

    let envelope = ElevationEnvelope::from_cells(&layers.elevation, &above, params.orog_diff)?
        .ok_or(Error::NoUrbanElevation)?;
    let elevation = within(&layers.elevation, envelope.lower(), envelope.upper())?;

    let land = threshold(&layers.land_fraction, Comparison::Greater, params.sftlf_th)?;

    let urban = cleaned.mask.and(&land)?;
    let surrounding = surrounding.and(&land)?;

    debug!(
        urban = urban.count(),
        surrounding = surrounding.count(),
        elevation = elevation.count(),
        land = land.count(),
        demoted = demoted.count(),
        min_elev = envelope.min,
        max_elev = envelope.max,
        "masks defined"
    );

    Ok(MaskSet {
        urban,
        surrounding,
        elevation,
        land,
        envelope,
        demoted_cells: demoted.count(),
        used_fallback: cleaned.used_fallback(),
    })
}
