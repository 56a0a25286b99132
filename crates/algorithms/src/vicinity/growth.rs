//! Constrained iterative dilation of the urban core
//!
//! The grown mask starts as the urban core and is dilated one ring at a
//! time, keeping only cells inside the elevation envelope and on land.
//! A plus-shaped step is tried first; when it adds nothing the same step is
//! retried with the full 3x3 square. Cells of the surrounding buffer may be
//! crossed but never count towards the ratio.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use urclimask_core::raster::Mask;
use urclimask_core::{Error, Result};

use super::define::MaskSet;
use crate::morphology::{dilate_mask, StructuringElement};

/// Why growth stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Accepted cells exceeded `urban_cells * ratio`
    RatioReached,
    /// Neither element could add an eligible cell
    Stalled,
}

/// Summary of one growth run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthReport {
    pub iterations: usize,
    pub urban_cells: usize,
    /// Cells labelled vicinity in the final mask
    pub vicinity_cells: usize,
    /// Grown cells dropped because they lie in the surrounding buffer
    pub buffer_cells: usize,
    /// `vicinity_cells / urban_cells`
    pub achieved_ratio: f64,
    pub termination: Termination,
}

/// Result of a single dilation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The plus element added cells
    Plus,
    /// Only the square retry added cells
    Square,
    /// Neither element added cells; the mask is unchanged
    Stalled,
}

/// Growth state carried between iterations
#[derive(Debug, Clone)]
pub struct Growth<'a> {
    masks: &'a MaskSet,
    eligible: Mask,
    grown: Mask,
    accepted: usize,
    iterations: usize,
}

impl<'a> Growth<'a> {
    /// Start from the urban core of `masks`
    pub fn new(masks: &'a MaskSet) -> Result<Self> {
        masks.check_shapes()?;
        Ok(Self {
            masks,
            eligible: masks.eligible()?,
            grown: masks.urban.clone(),
            accepted: 0,
            iterations: 0,
        })
    }

    pub fn grown(&self) -> &Mask {
        &self.grown
    }

    /// Grown cells outside the urban core and the surrounding buffer
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Dilate once, retrying with the square element if the plus adds nothing.
    ///
    /// Only steps that add cells count as iterations.
    pub fn step(&mut self) -> Result<Step> {
        let (candidate, step) = match self.dilate(&StructuringElement::plus())? {
            Some(candidate) => (candidate, Step::Plus),
            None => match self.dilate(&StructuringElement::full())? {
                Some(candidate) => (candidate, Step::Square),
                None => return Ok(Step::Stalled),
            },
        };

        self.iterations += 1;
        self.grown = candidate;
        self.accepted = self
            .grown
            .and_not(&self.masks.urban)?
            .and_not(&self.masks.surrounding)?
            .count();

        debug!(
            iteration = self.iterations,
            ?step,
            grown = self.grown.count(),
            accepted = self.accepted,
            "growth step"
        );
        Ok(step)
    }

    /// Grown mask extended by one eligible ring, or `None` if nothing new is reachable
    fn dilate(&self, element: &StructuringElement) -> Result<Option<Mask>> {
        let ring = dilate_mask(&self.grown, element)?
            .and(&self.eligible)?
            .and_not(&self.grown)?;
        if ring.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.grown.or(&ring)?))
    }
}

/// Outcome of [`grow`]: the vicinity cells and the run summary
#[derive(Debug, Clone)]
pub struct Grown {
    pub vicinity: Mask,
    pub report: GrowthReport,
}

/// Grow the urban core until the accepted cells exceed `urban_cells * ratio`.
///
/// A stall is not an error: growth stops with fewer vicinity cells and the
/// report says [`Termination::Stalled`]. If `max_iterations` productive
/// steps leave the target unmet and the next step would still add cells,
/// the result is [`Error::RatioUnreachable`]. The cap defaults to the
/// number of grid cells.
pub fn grow(masks: &MaskSet, ratio: f64, max_iterations: Option<usize>) -> Result<Grown> {
    let mut growth = Growth::new(masks)?;
    let (rows, cols) = masks.shape();
    let cap = max_iterations.unwrap_or(rows * cols + 1);
    let urban_cells = masks.urban.count();
    let target = urban_cells as f64 * ratio;

    let termination = loop {
        if growth.accepted() as f64 > target {
            break Termination::RatioReached;
        }
        // At the cap one more attempt decides between a stall and an unreachable ratio
        let at_cap = growth.iterations() >= cap;
        let (iterations, accepted) = (growth.iterations(), growth.accepted());
        if growth.step()? == Step::Stalled {
            let achieved = if urban_cells > 0 {
                accepted as f64 / urban_cells as f64
            } else {
                0.0
            };
            warn!(
                iterations,
                accepted,
                achieved_ratio = achieved,
                target_ratio = ratio,
                "vicinity growth stalled before reaching the target ratio"
            );
            break Termination::Stalled;
        }
        if at_cap {
            return Err(Error::RatioUnreachable { iterations, accepted, target });
        }
    };

    let vicinity = growth
        .grown()
        .and_not(&masks.urban)?
        .and_not(&masks.surrounding)?;
    let buffer_cells = growth.grown().and(&masks.surrounding)?.count();
    let vicinity_cells = vicinity.count();

    let report = GrowthReport {
        iterations: growth.iterations(),
        urban_cells,
        vicinity_cells,
        buffer_cells,
        achieved_ratio: if urban_cells > 0 {
            vicinity_cells as f64 / urban_cells as f64
        } else {
            0.0
        },
        termination,
    };

    Ok(Grown { vicinity, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vicinity::define::ElevationEnvelope;

    fn mask_from(rows: &[&str]) -> Mask {
        Mask::from_fn(rows.len(), rows[0].len(), |(r, c)| rows[r].as_bytes()[c] == b'#')
    }

    fn masks(urban: Mask, surrounding: Mask, eligible: Mask) -> MaskSet {
        let (rows, cols) = urban.shape();
        MaskSet {
            urban,
            surrounding,
            elevation: eligible,
            land: Mask::full(rows, cols),
            envelope: ElevationEnvelope { min: 0.0, max: 0.0, tolerance: 0.0 },
            demoted_cells: 0,
            used_fallback: false,
        }
    }

    #[test]
    fn test_plus_step_adds_edge_neighbours() {
        let set = masks(
            mask_from(&[".....", ".....", "..#..", ".....", "....."]),
            Mask::empty(5, 5),
            Mask::full(5, 5),
        );
        let mut growth = Growth::new(&set).unwrap();
        assert_eq!(growth.step().unwrap(), Step::Plus);
        assert_eq!(
            growth.grown(),
            &mask_from(&[".....", "..#..", ".###.", "..#..", "....."])
        );
        assert_eq!(growth.accepted(), 4);
    }

    #[test]
    fn test_square_retry_crosses_diagonal() {
        // Only the diagonal neighbour is eligible
        let set = masks(
            mask_from(&["#..", "...", "..."]),
            Mask::empty(3, 3),
            mask_from(&["#..", ".##", ".##"]),
        );
        let mut growth = Growth::new(&set).unwrap();
        assert_eq!(growth.step().unwrap(), Step::Square);
        assert!(growth.grown().get(1, 1).unwrap());
        assert_eq!(growth.step().unwrap(), Step::Plus);
        assert_eq!(growth.accepted(), 3);
    }

    #[test]
    fn test_buffer_cells_do_not_count() {
        let set = masks(
            mask_from(&["...", ".#.", "..."]),
            mask_from(&[".#.", "#.#", ".#."]),
            Mask::full(3, 3),
        );
        let mut growth = Growth::new(&set).unwrap();
        growth.step().unwrap();
        assert_eq!(growth.grown().count(), 5);
        assert_eq!(growth.accepted(), 0);
    }

    #[test]
    fn test_grow_reaches_ratio() {
        let set = masks(
            mask_from(&["......", "......", "..##..", "..##..", "......", "......"]),
            Mask::empty(6, 6),
            Mask::full(6, 6),
        );
        let out = grow(&set, 1.0, None).unwrap();
        assert_eq!(out.report.termination, Termination::RatioReached);
        assert_eq!(out.report.iterations, 1);
        assert_eq!(out.report.vicinity_cells, 8);
        assert!(out.report.vicinity_cells as f64 > 4.0);
        assert!(!out.vicinity.get(2, 2).unwrap());
    }

    #[test]
    fn test_grow_stalls_when_enclosed() {
        let set = masks(
            mask_from(&[".....", ".....", "..#..", ".....", "....."]),
            Mask::empty(5, 5),
            mask_from(&[".....", ".###.", ".###.", ".###.", "....."]),
        );
        let out = grow(&set, 100.0, None).unwrap();
        assert_eq!(out.report.termination, Termination::Stalled);
        assert_eq!(out.report.vicinity_cells, 8);
        // two plus steps fill the 3x3; the stalled attempt is not counted
        assert_eq!(out.report.iterations, 2);
    }

    #[test]
    fn test_stall_at_iteration_cap_is_not_an_error() {
        let set = masks(
            mask_from(&[".....", ".....", "..#..", ".....", "....."]),
            Mask::empty(5, 5),
            mask_from(&[".....", ".###.", ".###.", ".###.", "....."]),
        );
        let out = grow(&set, 100.0, Some(2)).unwrap();
        assert_eq!(out.report.termination, Termination::Stalled);
        assert_eq!(out.report.vicinity_cells, 8);
        assert_eq!(out.report.iterations, 2);

        // One step short of filling the island, the next step still adds cells
        let err = grow(&set, 100.0, Some(1)).unwrap_err();
        assert!(matches!(
            err,
            Error::RatioUnreachable { iterations: 1, accepted: 4, .. }
        ));
    }

    #[test]
    fn test_final_cleanup_drops_buffer() {
        let set = masks(
            mask_from(&["...", ".#.", "..."]),
            mask_from(&[".#.", "...", "..."]),
            Mask::full(3, 3),
        );
        let out = grow(&set, 1.0, None).unwrap();
        assert_eq!(out.report.buffer_cells, 1);
        assert!(!out.vicinity.get(0, 1).unwrap());
        assert!(out.vicinity.and(&set.surrounding).unwrap().is_empty());
    }

    #[test]
    fn test_iteration_cap_raises_unreachable() {
        let set = masks(
            mask_from(&["#.........", "..........", ".........."]),
            Mask::empty(3, 10),
            Mask::full(3, 10),
        );
        let err = grow(&set, 20.0, Some(2)).unwrap_err();
        match err {
            Error::RatioUnreachable { iterations, target, .. } => {
                assert_eq!(iterations, 2);
                assert_eq!(target, 20.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mismatched_masks_rejected() {
        let set = masks(Mask::empty(3, 3), Mask::empty(3, 4), Mask::full(3, 3));
        assert!(matches!(
            Growth::new(&set).unwrap_err(),
            Error::SizeMismatch { .. }
        ));
    }
}
