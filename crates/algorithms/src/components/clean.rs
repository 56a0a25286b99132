//! Removal of small connected regions from a binary mask
//!
//! Regions smaller than a minimum size are dropped. When that would drop
//! every region, the single region whose centroid lies closest to a
//! reference cell (the city center) is kept instead.

use tracing::debug;
use urclimask_core::raster::Mask;
use urclimask_core::{Algorithm, Error, Result};

use super::label::{label_components, Connectivity};

/// Parameters for [`remove_small_components`]
#[derive(Debug, Clone, Default)]
pub struct CleanParams {
    /// Regions with fewer cells than this are removed
    pub min_size: usize,
    /// Fallback anchor in grid-index space (row, col)
    pub reference: (f64, f64),
    /// Neighbourhood used to join cells into regions
    pub connectivity: Connectivity,
}

/// Result of cleaning a mask
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    /// Cleaned mask
    pub mask: Mask,
    /// Number of regions in the input
    pub regions: usize,
    /// Number of regions present in the output
    pub kept: usize,
    /// Label of the region kept by the nearest-centroid fallback, if taken
    pub fallback_label: Option<u32>,
}

impl CleanOutcome {
    pub fn used_fallback(&self) -> bool {
        self.fallback_label.is_some()
    }
}

/// Small-region removal algorithm
#[derive(Debug, Clone, Default)]
pub struct RemoveSmallComponents;

impl Algorithm for RemoveSmallComponents {
    type Input = Mask;
    type Output = CleanOutcome;
    type Params = CleanParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "RemoveSmallComponents"
    }

    fn description(&self) -> &'static str {
        "Remove connected regions below a size floor, keeping the region nearest a reference if none survive"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        remove_small_components(&input, &params)
    }
}

/// Drop connected regions of `mask` smaller than `params.min_size`.
///
/// - At least one region survives: the output is the union of survivors.
/// - No region survives: the output is exactly the original region whose
///   centroid is nearest to `params.reference`; ties go to the lower label.
/// - Empty input: empty output, the fallback is not taken.
pub fn remove_small_components(mask: &Mask, params: &CleanParams) -> Result<CleanOutcome> {
    let (ref_row, ref_col) = params.reference;
    if !ref_row.is_finite() || !ref_col.is_finite() {
        return Err(Error::InvalidParameter {
            name: "reference",
            value: format!("({}, {})", ref_row, ref_col),
            reason: "reference cell must be finite".to_string(),
        });
    }

    let labeled = label_components(mask, params.connectivity);
    let regions = labeled.len();

    let kept = labeled
        .regions()
        .iter()
        .filter(|r| r.size() >= params.min_size)
        .count();

    let (cleaned, kept, fallback_label) = if regions == 0 || kept > 0 {
        let cleaned = labeled.mask_where(|r| r.size() >= params.min_size);
        (cleaned, kept, None)
    } else {
        let mut nearest = &labeled.regions()[0];
        let mut best = nearest.distance_to(params.reference);
        for region in &labeled.regions()[1..] {
            let d = region.distance_to(params.reference);
            if d < best {
                best = d;
                nearest = region;
            }
        }
        debug!(
            label = nearest.label,
            size = nearest.size(),
            distance = best,
            "no region reaches the minimum size, keeping the one nearest the reference"
        );
        let label = nearest.label;
        (labeled.mask_where(|r| r.label == label), 1, Some(label))
    };

    debug!(regions, kept, min_size = params.min_size, "small regions removed");

    Ok(CleanOutcome {
        mask: cleaned.with_transform(*mask.transform()),
        regions,
        kept,
        fallback_label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> Mask {
        Mask::from_fn(rows.len(), rows[0].len(), |(r, c)| rows[r].as_bytes()[c] == b'#')
    }

    fn params(min_size: usize, reference: (f64, f64)) -> CleanParams {
        CleanParams {
            min_size,
            reference,
            connectivity: Connectivity::Four,
        }
    }

    #[test]
    fn test_keeps_union_of_large_regions() {
        let mask = mask_from(&[
            "##...#",
            "##....",
            "....##",
            "....##",
        ]);
        let out = remove_small_components(&mask, &params(3, (0.0, 0.0))).unwrap();
        assert_eq!(out.regions, 3);
        assert_eq!(out.kept, 2);
        assert!(!out.used_fallback());
        assert_eq!(out.mask.count(), 8);
        assert!(!out.mask.get(0, 5).unwrap());
        assert!(out.mask.is_subset_of(&mask).unwrap());
    }

    #[test]
    fn test_fallback_picks_nearest_centroid() {
        // Two 2x2 blobs, centroids (1.5, 1.5) and (1.5, 7.5)
        let mask = mask_from(&[
            "..........",
            ".##....##.",
            ".##....##.",
            "..........",
        ]);
        let out = remove_small_components(&mask, &params(10, (1.5, 6.0))).unwrap();
        assert_eq!(out.fallback_label, Some(2));
        assert_eq!(out.kept, 1);
        assert_eq!(out.mask.count(), 4);
        assert!(out.mask.get(1, 7).unwrap());
        assert!(!out.mask.get(1, 1).unwrap());
    }

    #[test]
    fn test_fallback_tie_goes_to_lower_label() {
        let mask = mask_from(&[
            ".##....##.",
            ".##....##.",
        ]);
        // Reference exactly between both centroids
        let out = remove_small_components(&mask, &params(5, (0.5, 4.5))).unwrap();
        assert_eq!(out.fallback_label, Some(1));
        assert!(out.mask.get(0, 1).unwrap());
    }

    #[test]
    fn test_fallback_returns_whole_original_region() {
        let mask = mask_from(&[
            "###.",
            "#...",
            "....",
            "...#",
        ]);
        let out = remove_small_components(&mask, &params(100, (0.0, 0.0))).unwrap();
        assert_eq!(out.mask.count(), 4);
        assert_eq!(out.mask, mask_from(&["###.", "#...", "....", "...."]));
    }

    #[test]
    fn test_zero_min_size_keeps_mask() {
        let mask = mask_from(&["#.#", "...", "#.."]);
        let out = remove_small_components(&mask, &params(0, (0.0, 0.0))).unwrap();
        assert_eq!(out.mask, mask);
        assert!(!out.used_fallback());
    }

    #[test]
    fn test_empty_mask_skips_fallback() {
        let mask = Mask::empty(5, 5);
        let out = remove_small_components(&mask, &params(3, (2.0, 2.0))).unwrap();
        assert!(out.mask.is_empty());
        assert_eq!(out.regions, 0);
        assert!(!out.used_fallback());
    }

    #[test]
    fn test_rejects_nan_reference() {
        let mask = mask_from(&["#"]);
        assert!(remove_small_components(&mask, &params(1, (f64::NAN, 0.0))).is_err());
    }

    #[test]
    fn test_algorithm_trait_defaults() {
        let mask = mask_from(&["#.#"]);
        let out = RemoveSmallComponents.execute_default(mask.clone()).unwrap();
        assert_eq!(out.mask, mask);
    }
}
