//! Tri-state urban/vicinity mask and its persisted form

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use urclimask_core::io::{write_geotiff, write_metadata, GeoTiffOptions};
use urclimask_core::raster::{Mask, Raster};
use urclimask_core::Result;

use super::define::ElevationEnvelope;
use super::growth::GrowthReport;
use super::params::VicinityParams;

/// Value of urban cells in the output raster
pub const URBAN: f64 = 1.0;
/// Value of vicinity cells in the output raster
pub const VICINITY: f64 = 0.0;

/// Name of the mask variable in the persisted dataset
pub const VARIABLE_NAME: &str = "urmask";

/// Final mask: 1 urban, 0 vicinity, NaN excluded
#[derive(Debug, Clone)]
pub struct VicinityMask {
    raster: Raster<f64>,
    envelope: ElevationEnvelope,
    report: GrowthReport,
    params: VicinityParams,
}

impl VicinityMask {
    pub(crate) fn assemble(
        urban: &Mask,
        vicinity: &Mask,
        envelope: ElevationEnvelope,
        report: GrowthReport,
        params: VicinityParams,
    ) -> Result<Self> {
        urban.ensure_same_shape(vicinity)?;
        let data = ndarray::Zip::from(urban.data())
            .and(vicinity.data())
            .map_collect(|&u, &v| {
                if u {
                    URBAN
                } else if v {
                    VICINITY
                } else {
                    f64::NAN
                }
            });

        let mut raster = Raster::from_array(data);
        raster.set_transform(*urban.transform());
        Ok(Self {
            raster,
            envelope,
            report,
            params,
        })
    }

    pub fn raster(&self) -> &Raster<f64> {
        &self.raster
    }

    /// Elevation envelope of the urban cells the mask was grown under
    pub fn envelope(&self) -> &ElevationEnvelope {
        &self.envelope
    }

    pub fn report(&self) -> &GrowthReport {
        &self.report
    }

    pub fn params(&self) -> &VicinityParams {
        &self.params
    }

    pub fn shape(&self) -> (usize, usize) {
        self.raster.shape()
    }

    /// Cells labelled urban
    pub fn urban_mask(&self) -> Mask {
        self.value_mask(URBAN)
    }

    /// Cells labelled vicinity
    pub fn vicinity_mask(&self) -> Mask {
        self.value_mask(VICINITY)
    }

    fn value_mask(&self, value: f64) -> Mask {
        Mask::from_array(self.raster.data().mapv(|v| v == value))
            .with_transform(*self.raster.transform())
    }

    /// Descriptive attributes stored next to the persisted mask
    pub fn attributes(&self) -> MaskAttributes {
        let p = &self.params;
        MaskAttributes {
            variable: VARIABLE_NAME.to_string(),
            long_name: "Urban vicinity mask (1 urban, 0 vicinity)".to_string(),
            urban_th: p.urban_th,
            urban_sur_th: p.urban_sur_th,
            orog_diff: p.orog_diff,
            sftlf_th: p.sftlf_th,
            ratio_r2u: p.ratio_r2u,
            min_city_size: p.min_city_size,
            lon_city: p.lon_city,
            lat_city: p.lat_city,
            lon_lim: p.lon_lim,
            lat_lim: p.lat_lim,
            model: p.model.clone(),
            domain: p.domain.clone(),
            urban_var: p.urban_var.clone(),
            envelope: self.envelope,
            report: self.report,
        }
    }

    /// Write the mask as a GeoTIFF (NaN nodata) plus its JSON sidecar.
    ///
    /// Returns the sidecar path.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        write_geotiff(&self.raster, path, Some(GeoTiffOptions { nan_nodata: true }))?;
        write_metadata(path, &self.attributes())
    }
}

/// Attributes of a persisted vicinity mask; informational only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskAttributes {
    pub variable: String,
    pub long_name: String,
    pub urban_th: f64,
    pub urban_sur_th: f64,
    pub orog_diff: f64,
    pub sftlf_th: f64,
    pub ratio_r2u: f64,
    pub min_city_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon_city: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat_city: Option<f64>,
    pub lon_lim: f64,
    pub lat_lim: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urban_var: Option<String>,
    pub envelope: ElevationEnvelope,
    pub report: GrowthReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vicinity::growth::Termination;
    use urclimask_core::io::{read_geotiff, read_metadata};
    use urclimask_core::GeoTransform;

    fn sample() -> VicinityMask {
        let urban = Mask::from_fn(3, 3, |(r, c)| r == 1 && c == 1)
            .with_transform(GeoTransform::new(-4.0, 41.0, 0.5, -0.5));
        let vicinity = Mask::from_fn(3, 3, |(r, c)| r == 0 && c < 2);
        let envelope = ElevationEnvelope { min: 600.0, max: 700.0, tolerance: 100.0 };
        let report = GrowthReport {
            iterations: 1,
            urban_cells: 1,
            vicinity_cells: 2,
            buffer_cells: 0,
            achieved_ratio: 2.0,
            termination: Termination::Stalled,
        };
        let params = VicinityParams {
            model: Some("REMO".to_string()),
            ..Default::default()
        };
        VicinityMask::assemble(&urban, &vicinity, envelope, report, params).unwrap()
    }

    #[test]
    fn test_tri_state_values() {
        let mask = sample();
        let raster = mask.raster();
        assert_eq!(raster.get(1, 1).unwrap(), URBAN);
        assert_eq!(raster.get(0, 0).unwrap(), VICINITY);
        assert!(raster.get(2, 2).unwrap().is_nan());
        assert_eq!(mask.urban_mask().count(), 1);
        assert_eq!(mask.vicinity_mask().count(), 2);
        assert_eq!(raster.transform().origin_x, -4.0);
    }

    #[test]
    fn test_urban_wins_over_vicinity() {
        let both = Mask::full(2, 2);
        let base = sample();
        let mask = VicinityMask::assemble(
            &both,
            &both,
            base.envelope,
            base.report,
            VicinityParams::default(),
        )
        .unwrap();
        assert_eq!(mask.vicinity_mask().count(), 0);
    }

    #[test]
    fn test_attributes_omit_unset_values() {
        let json = serde_json::to_value(sample().attributes()).unwrap();
        assert_eq!(json["model"], "REMO");
        assert_eq!(json["variable"], "urmask");
        assert_eq!(json["report"]["termination"], "stalled");
        assert!(json.get("domain").is_none());
        assert!(json.get("lat_city").is_none());
    }

    #[test]
    fn test_write_roundtrip() {
        let mask = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.tif");

        let sidecar = mask.write(&path).unwrap();
        assert!(sidecar.exists());

        let back: Raster<f64> = read_geotiff(&path).unwrap();
        assert_eq!(back.get(1, 1).unwrap(), URBAN);
        assert!(back.get(2, 0).unwrap().is_nan());

        let attrs: MaskAttributes = read_metadata(&path).unwrap();
        assert_eq!(attrs, mask.attributes());
    }
}
