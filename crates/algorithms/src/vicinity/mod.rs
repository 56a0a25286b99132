//! Urban core and rural vicinity delineation
//!
//! Two stages run over co-registered static layers:
//!
//! 1. [`UrbanVicinity::define_masks`] thresholds the urban fraction, removes
//!    small urban regions and derives the surrounding buffer, the elevation
//!    envelope and the land mask.
//! 2. [`UrbanVicinity::select_vicinity`] grows the urban core through
//!    eligible cells until the vicinity holds `ratio_r2u` times as many
//!    cells as the core, or no eligible cell is left within reach.
//!
//! The result is a [`VicinityMask`]: 1 urban, 0 vicinity, NaN excluded.

mod define;
mod growth;
mod layers;
mod output;
mod params;

pub use define::{define_masks, ElevationEnvelope, MaskSet};
pub use growth::{grow, Growth, GrowthReport, Grown, Step, Termination};
pub use layers::StaticLayers;
pub use output::{MaskAttributes, VicinityMask, URBAN, VARIABLE_NAME, VICINITY};
pub use params::VicinityParams;

use tracing::info;
use urclimask_core::{Algorithm, Error, Result};

/// Delineation engine holding a validated, frozen configuration
#[derive(Debug, Clone)]
pub struct UrbanVicinity {
    params: VicinityParams,
}

impl UrbanVicinity {
    /// Validate `params` and build the engine
    pub fn new(params: VicinityParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &VicinityParams {
        &self.params
    }

    /// City center in grid-index space (row, col).
    ///
    /// The configured center is snapped to the nearest cell when the layers
    /// carry coordinates; otherwise the middle of the grid is used.
    pub fn reference_index(&self, layers: &StaticLayers) -> (f64, f64) {
        let nearest = self
            .params
            .city_center()
            .zip(layers.coords.as_ref())
            .and_then(|((lat, lon), coords)| coords.nearest_index(lat, lon));

        match nearest {
            Some((row, col)) => (row as f64, col as f64),
            None => {
                let (rows, cols) = layers.shape();
                (
                    rows.saturating_sub(1) as f64 / 2.0,
                    cols.saturating_sub(1) as f64 / 2.0,
                )
            }
        }
    }

    /// Cut the layers to `lat_lim`/`lon_lim` degrees around the city center.
    ///
    /// Needs coordinates on the layers and a configured center;
    /// `resolution_km` is required for curvilinear grids.
    pub fn crop_layers(
        &self,
        layers: &StaticLayers,
        resolution_km: Option<f64>,
    ) -> Result<StaticLayers> {
        let (lat, lon) = self.params.city_center().ok_or_else(|| Error::InvalidParameter {
            name: "lat_city/lon_city",
            value: "unset".to_string(),
            reason: "cropping needs a city center".to_string(),
        })?;
        let coords = layers
            .coords
            .as_ref()
            .ok_or_else(|| Error::Algorithm("cropping needs layer coordinates".to_string()))?;

        let window = coords.crop_window(
            lat,
            lon,
            self.params.lat_lim,
            self.params.lon_lim,
            resolution_km,
        )?;
        info!(
            rows = window.rows(),
            cols = window.cols(),
            row_start = window.row_start,
            col_start = window.col_start,
            "layers cropped around city center"
        );
        layers.crop(&window)
    }

    /// Derive the four masks of the first stage
    pub fn define_masks(&self, layers: &StaticLayers) -> Result<MaskSet> {
        let reference = self.reference_index(layers);
        let masks = define_masks(layers, &self.params, reference)?;
        info!(
            urban = masks.urban.count(),
            surrounding = masks.surrounding.count(),
            min_elev = masks.envelope.min,
            max_elev = masks.envelope.max,
            fallback = masks.used_fallback,
            "urban masks defined"
        );
        Ok(masks)
    }

    /// Grow the vicinity around the urban core of `masks`.
    ///
    /// `ratio` overrides the configured `ratio_r2u` for this call.
    pub fn select_vicinity(&self, masks: &MaskSet, ratio: Option<f64>) -> Result<VicinityMask> {
        let ratio = ratio.unwrap_or(self.params.ratio_r2u);
        params::validate_ratio(ratio)?;

        let grown = grow(masks, ratio, self.params.max_iterations)?;
        let report = grown.report;
        info!(
            iterations = report.iterations,
            urban = report.urban_cells,
            vicinity = report.vicinity_cells,
            achieved_ratio = report.achieved_ratio,
            termination = ?report.termination,
            "vicinity selected"
        );

        let params = VicinityParams {
            ratio_r2u: ratio,
            ..self.params.clone()
        };
        VicinityMask::assemble(&masks.urban, &grown.vicinity, masks.envelope, report, params)
    }

    /// Run both stages
    pub fn delineate(&self, layers: &StaticLayers) -> Result<(MaskSet, VicinityMask)> {
        let masks = self.define_masks(layers)?;
        let mask = self.select_vicinity(&masks, None)?;
        Ok((masks, mask))
    }
}

/// Both delineation stages as an [`Algorithm`]
#[derive(Debug, Clone, Default)]
pub struct DelineateVicinity;

impl Algorithm for DelineateVicinity {
    type Input = StaticLayers;
    type Output = VicinityMask;
    type Params = VicinityParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "DelineateVicinity"
    }

    fn description(&self) -> &'static str {
        "Delineate the urban core and a rural vicinity of comparable elevation"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (_, mask) = UrbanVicinity::new(params)?.delineate(&input)?;
        Ok(mask)
    }
}
