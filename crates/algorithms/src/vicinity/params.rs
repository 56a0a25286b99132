//! Configuration of the urban/vicinity engine

use serde::{Deserialize, Serialize};
use urclimask_core::{Error, Result};

use crate::components::Connectivity;

/// Parameters for urban/vicinity delineation.
///
/// Fixed when the engine is built and never mutated during a run.
/// Deserializes from JSON with every field optional; missing fields take
/// the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VicinityParams {
    /// Urban fraction above which a cell is urban
    pub urban_th: f64,
    /// Urban fraction above which a non-urban cell is part of the urban buffer
    pub urban_sur_th: f64,
    /// Elevation tolerance (m) around the urban min/max elevation
    pub orog_diff: f64,
    /// Land fraction (%) a cell needs to be eligible
    pub sftlf_th: f64,
    /// Target ratio of vicinity cells to urban cells
    #[serde(alias = "scale")]
    pub ratio_r2u: f64,
    /// Urban regions smaller than this many cells are removed
    pub min_city_size: usize,
    /// Longitude of the city center
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon_city: Option<f64>,
    /// Latitude of the city center
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat_city: Option<f64>,
    /// Half-width (degrees) of the study window in longitude
    pub lon_lim: f64,
    /// Half-height (degrees) of the study window in latitude
    pub lat_lim: f64,
    /// Climate model name, descriptive only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Model domain, descriptive only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Name of the urban fraction variable in the source dataset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urban_var: Option<String>,
    /// Neighbourhood joining urban cells into regions
    pub connectivity: Connectivity,
    /// Upper bound on growth iterations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
}

impl Default for VicinityParams {
    fn default() -> Self {
        Self {
            urban_th: 0.1,
            urban_sur_th: 0.1,
            orog_diff: 100.0,
            sftlf_th: 70.0,
            ratio_r2u: 2.0,
            min_city_size: 0,
            lon_city: None,
            lat_city: None,
            lon_lim: 1.0,
            lat_lim: 1.0,
            model: None,
            domain: None,
            urban_var: None,
            connectivity: Connectivity::Four,
            max_iterations: None,
        }
    }
}

impl VicinityParams {
    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        finite("urban_th", self.urban_th)?;
        finite("urban_sur_th", self.urban_sur_th)?;
        finite("sftlf_th", self.sftlf_th)?;
        non_negative("orog_diff", self.orog_diff)?;
        validate_ratio(self.ratio_r2u)?;
        positive("lon_lim", self.lon_lim)?;
        positive("lat_lim", self.lat_lim)?;

        if let Some(lat) = self.lat_city {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(invalid("lat_city", lat, "latitude must lie in [-90, 90]"));
            }
        }
        if let Some(lon) = self.lon_city {
            finite("lon_city", lon)?;
        }
        if self.max_iterations == Some(0) {
            return Err(Error::InvalidParameter {
                name: "max_iterations",
                value: "0".to_string(),
                reason: "at least one growth iteration is required".to_string(),
            });
        }
        Ok(())
    }

    /// City center as (lat, lon) when both are configured
    pub fn city_center(&self) -> Option<(f64, f64)> {
        self.lat_city.zip(self.lon_city)
    }
}

/// Validate a vicinity-to-urban ratio
pub(crate) fn validate_ratio(ratio: f64) -> Result<()> {
    non_negative("ratio_r2u", ratio)
}

fn invalid(name: &'static str, value: f64, reason: &str) -> Error {
    Error::InvalidParameter {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn finite(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(invalid(name, value, "must be a finite number"));
    }
    Ok(())
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(invalid(name, value, "must not be negative"));
    }
    Ok(())
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    finite(name, value)?;
    if value <= 0.0 {
        return Err(invalid(name, value, "must be greater than zero"));
    }
    Ok(())
}
