//! Connected-component labeling of a binary mask

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use urclimask_core::raster::Mask;

/// Which neighbours join two set cells into one region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Edge neighbours only
    #[default]
    Four,
    /// Edge and corner neighbours
    Eight,
}

impl Connectivity {
    #[rustfmt::skip]
    fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &[(-1, 0), (1, 0), (0, -1), (0, 1)],
            Connectivity::Eight => &[
                (-1, -1), (-1, 0), (-1, 1),
                (0, -1), (0, 1),
                (1, -1), (1, 0), (1, 1),
            ],
        }
    }
}

/// One connected region
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Positive label, assigned in raster-scan order of first encounter
    pub label: u32,
    /// Member cells as (row, col)
    pub cells: Vec<(usize, usize)>,
    /// Mean (row, col) of the member cells
    pub centroid: (f64, f64),
}

impl Region {
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Euclidean distance from the centroid to a point in grid-index space
    pub fn distance_to(&self, point: (f64, f64)) -> f64 {
        let dr = self.centroid.0 - point.0;
        let dc = self.centroid.1 - point.1;
        (dr * dr + dc * dc).sqrt()
    }
}

/// Output of [`label_components`]
#[derive(Debug, Clone)]
pub struct LabeledRegions {
    /// Label of each cell, 0 for background
    labels: Array2<u32>,
    /// Regions ordered by label
    regions: Vec<Region>,
}

impl LabeledRegions {
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Label at (row, col); 0 means background or out of bounds
    pub fn label_at(&self, row: usize, col: usize) -> u32 {
        self.labels.get((row, col)).copied().unwrap_or(0)
    }

    /// Union of the regions accepted by `keep`, as a mask on the labeled grid
    pub fn mask_where<F>(&self, mut keep: F) -> Mask
    where
        F: FnMut(&Region) -> bool,
    {
        let (rows, cols) = self.labels.dim();
        let mut mask = Array2::from_elem((rows, cols), false);
        for region in &self.regions {
            if !keep(region) {
                continue;
            }
            for &cell in &region.cells {
                mask[cell] = true;
            }
        }
        Mask::from_array(mask)
    }
}

/// Label the connected regions of `mask`.
///
/// Uses an explicit-stack flood fill; labels run 1..=n in the raster-scan
/// order in which each region is first met.
pub fn label_components(mask: &Mask, connectivity: Connectivity) -> LabeledRegions {
    let (rows, cols) = mask.shape();
    let mut labels = Array2::<u32>::zeros((rows, cols));
    let mut regions = Vec::new();
    let offsets = connectivity.offsets();

    for (start, &set) in mask.data().indexed_iter() {
        if !set || labels[start] != 0 {
            continue;
        }

        let label = regions.len() as u32 + 1;
        let mut cells = Vec::new();
        let mut stack = vec![start];
        labels[start] = label;

        while let Some((r, c)) = stack.pop() {
            cells.push((r, c));

            for &(dr, dc) in offsets {
                let nr = r as isize + dr;
                let nc = c as isize + dc;
                if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                    continue;
                }
                let next = (nr as usize, nc as usize);
                if mask.data()[next] && labels[next] == 0 {
                    labels[next] = label;
                    stack.push(next);
                }
            }
        }

        let n = cells.len() as f64;
        let (sum_r, sum_c) = cells
            .iter()
            .fold((0.0, 0.0), |(sr, sc), &(r, c)| (sr + r as f64, sc + c as f64));

        regions.push(Region {
            label,
            cells,
            centroid: (sum_r / n, sum_c / n),
        });
    }

    LabeledRegions { labels, regions }
}
