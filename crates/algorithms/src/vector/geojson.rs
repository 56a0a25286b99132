//! Minimal GeoJSON reader for city outlines

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use urclimask_core::{Error, Result};

type Ring = Vec<Vec<f64>>;

/// GeoJSON object holding polygonal city geometry.
///
/// Positions may carry a third (altitude) value; it is ignored. Feature
/// properties are ignored as well.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum CityOutline {
    Polygon {
        coordinates: Vec<Ring>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Ring>>,
    },
    Feature {
        geometry: Option<Box<CityOutline>>,
    },
    FeatureCollection {
        features: Vec<CityOutline>,
    },
}

impl CityOutline {
    /// All polygons of the outline, in document order
    pub fn to_multi_polygon(&self) -> Result<MultiPolygon<f64>> {
        let mut polygons = Vec::new();
        self.collect(&mut polygons)?;
        Ok(MultiPolygon::new(polygons))
    }

    fn collect(&self, out: &mut Vec<Polygon<f64>>) -> Result<()> {
        match self {
            CityOutline::Polygon { coordinates } => out.push(polygon(coordinates)?),
            CityOutline::MultiPolygon { coordinates } => {
                for rings in coordinates {
                    out.push(polygon(rings)?);
                }
            }
            CityOutline::Feature { geometry } => {
                if let Some(geometry) = geometry {
                    geometry.collect(out)?;
                }
            }
            CityOutline::FeatureCollection { features } => {
                for feature in features {
                    feature.collect(out)?;
                }
            }
        }
        Ok(())
    }
}

/// First ring is the exterior, the rest are holes
fn polygon(rings: &[Ring]) -> Result<Polygon<f64>> {
    let (exterior, holes) = rings.split_first().ok_or_else(|| Error::InvalidParameter {
        name: "coordinates",
        value: "[]".to_string(),
        reason: "polygon has no exterior ring".to_string(),
    })?;
    let interiors = holes.iter().map(|r| ring(r)).collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(ring(exterior)?, interiors))
}

fn ring(positions: &[Vec<f64>]) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(Error::InvalidParameter {
                name: "coordinates",
                value: format!("{:?}", p),
                reason: "position needs longitude and latitude".to_string(),
            }),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}
