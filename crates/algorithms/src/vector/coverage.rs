//! Percentage of each grid cell covered by city polygons
//!
//! A cell is the box centred on its (lon, lat) with the spacing of the
//! first two axis values. Overlapping polygons are dissolved first so
//! shared ground counts once.

use geo::{Area, BooleanOps, BoundingRect, Coord, Intersects, MultiPolygon, Rect};
use ndarray::Array2;
use tracing::debug;
use urclimask_core::{Error, GeoTransform, GridCoords, Raster, Result};

use crate::maybe_rayon::*;

/// Variable name of an urban fraction layer built from city polygons
pub const FRACTION_VARIABLE: &str = "sfturf";

/// Union of all polygons of `city`
pub fn dissolve(city: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    city.0.iter().fold(MultiPolygon::new(Vec::new()), |merged, polygon| {
        merged.union(&MultiPolygon::new(vec![polygon.clone()]))
    })
}

/// Urban fraction (0..=100 %) of every cell of a regular lat/lon grid.
///
/// The result carries a north-up or south-up transform matching the axis
/// order of `coords`. Curvilinear grids are rejected.
///
/// # Arguments
/// * `city` - City outline in the grid's lon/lat coordinates
/// * `coords` - Cell-center coordinates of the target grid
pub fn polygon_coverage(city: &MultiPolygon<f64>, coords: &GridCoords) -> Result<Raster<f64>> {
    let (lat, lon) = match coords {
        GridCoords::Regular { lat, lon } => (lat, lon),
        GridCoords::Curvilinear { .. } => {
            return Err(Error::InvalidParameter {
                name: "coords",
                value: "curvilinear".to_string(),
                reason: "cell boxes need regular latitude and longitude axes".to_string(),
            })
        }
    };
    let dlat = axis_step(lat, "lat")?;
    let dlon = axis_step(lon, "lon")?;
    let (rows, cols) = (lat.len(), lon.len());

    let city = dissolve(city);
    let extent = city.bounding_rect();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0.0; cols];
            let Some(extent) = extent else {
                return row_data;
            };

            for (col, out) in row_data.iter_mut().enumerate() {
                let cell = Rect::new(
                    Coord { x: lon[col] - 0.5 * dlon, y: lat[row] - 0.5 * dlat },
                    Coord { x: lon[col] + 0.5 * dlon, y: lat[row] + 0.5 * dlat },
                );
                if !cell.intersects(&extent) {
                    continue;
                }
                let covered = MultiPolygon::new(vec![cell.to_polygon()])
                    .intersection(&city)
                    .unsigned_area();
                *out = covered / cell.unsigned_area() * 100.0;
            }

            row_data
        })
        .collect();

    let data = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| Error::Other(e.to_string()))?;
    let mut raster = Raster::from_array(data);
    raster.set_transform(GeoTransform::new(
        lon[0] - 0.5 * dlon,
        lat[0] - 0.5 * dlat,
        dlon,
        dlat,
    ));

    debug!(rows, cols, polygons = city.0.len(), "city polygons rasterized");
    Ok(raster)
}

fn axis_step(axis: &[f64], name: &'static str) -> Result<f64> {
    match axis {
        [first, second, ..] if (second - first).is_normal() => Ok(second - first),
        _ => Err(Error::InvalidParameter {
            name,
            value: format!("{} values", axis.len()),
            reason: "cell size needs two distinct leading coordinates".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::polygon;

    fn unit_grid(rows: usize, cols: usize) -> GridCoords {
        // Cell centers at half-integers, latitude descending
        let lat = (0..rows).map(|r| rows as f64 - 0.5 - r as f64).collect();
        let lon = (0..cols).map(|c| c as f64 + 0.5).collect();
        GridCoords::regular(lat, lon)
    }

    #[test]
    fn test_half_covered_cell_is_fifty_percent() {
        // Western half of the single cell [0, 1] x [0, 1]
        let city = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 0.5, y: 0.0),
            (x: 0.5, y: 1.0),
            (x: 0.0, y: 1.0),
        ]]);
        let fraction = polygon_coverage(&city, &GridCoords::regular(vec![0.5, 1.5], vec![0.5, 1.5]))
            .unwrap();
        assert_relative_eq!(fraction.get(0, 0).unwrap(), 50.0, epsilon = 1e-9);
        assert_eq!(fraction.get(0, 1).unwrap(), 0.0);
        // Shares only an edge with the city
        assert_relative_eq!(fraction.get(1, 0).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_covered_and_partial_cells() {
        // Square from (0.5, 0.5) to (2, 2) on a 3x3 unit grid
        let city = MultiPolygon::new(vec![polygon![
            (x: 0.5, y: 0.5),
            (x: 2.0, y: 0.5),
            (x: 2.0, y: 2.0),
            (x: 0.5, y: 2.0),
        ]]);
        let fraction = polygon_coverage(&city, &unit_grid(3, 3)).unwrap();

        // Row 1 spans latitudes 1..2, row 2 spans 0..1
        assert_relative_eq!(fraction.get(1, 1).unwrap(), 100.0, epsilon = 1e-9);
        assert_relative_eq!(fraction.get(1, 0).unwrap(), 50.0, epsilon = 1e-9);
        assert_relative_eq!(fraction.get(2, 1).unwrap(), 50.0, epsilon = 1e-9);
        assert_relative_eq!(fraction.get(2, 0).unwrap(), 25.0, epsilon = 1e-9);
        assert_relative_eq!(fraction.get(0, 0).unwrap(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(fraction.get(1, 2).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_overlapping_polygons_count_once() {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        let city = MultiPolygon::new(vec![square.clone(), square]);
        let fraction = polygon_coverage(&city, &unit_grid(1, 1)).unwrap();
        assert_relative_eq!(fraction.get(0, 0).unwrap(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_transform_matches_cell_edges() {
        let fraction = polygon_coverage(&MultiPolygon::new(Vec::new()), &unit_grid(3, 4)).unwrap();
        let gt = fraction.transform();
        assert_eq!(fraction.shape(), (3, 4));
        assert_relative_eq!(gt.origin_x, 0.0);
        assert_relative_eq!(gt.origin_y, 3.0);
        assert_relative_eq!(gt.pixel_height, -1.0);
        assert!(fraction.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_single_cell_axis_rejected() {
        let coords = GridCoords::regular(vec![0.5], vec![0.5, 1.5]);
        assert!(matches!(
            polygon_coverage(&MultiPolygon::new(Vec::new()), &coords),
            Err(Error::InvalidParameter { name: "lat", .. })
        ));
    }
}
