//! Single-pass foreground/background region statistics
//!
//! One traversal folds every pixel into one of two accumulators, so both
//! partitions are measured for the cost of one pass. Relabeling which side
//! is "the object" is done afterwards with [`DualRegionResult::swap`].

use log::debug;
use rayon::prelude::*;

use crate::config;
use crate::models::{
    BinaryMask, BoundingBox, Centroid, DualRegionResult, PixelGrid, RegionResult, RegionStats,
};
use crate::utils::binarization::{Binarizer, ThresholdRule};
use crate::utils::traversal;

/// Running area, index sums and extent of one partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RegionAccumulator {
    area: u64,
    sum_i: u64,
    sum_j: u64,
    min_i: usize,
    min_j: usize,
    max_i: usize,
    max_j: usize,
}

impl Default for RegionAccumulator {
    fn default() -> Self {
        Self {
            area: 0,
            sum_i: 0,
            sum_j: 0,
            min_i: usize::MAX,
            min_j: usize::MAX,
            max_i: 0,
            max_j: 0,
        }
    }
}

impl RegionAccumulator {
    #[inline]
    fn push(self, i: usize, j: usize) -> Self {
        Self {
            area: self.area + 1,
            sum_i: self.sum_i + i as u64,
            sum_j: self.sum_j + j as u64,
            min_i: self.min_i.min(i),
            min_j: self.min_j.min(j),
            max_i: self.max_i.max(i),
            max_j: self.max_j.max(j),
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            area: self.area + other.area,
            sum_i: self.sum_i + other.sum_i,
            sum_j: self.sum_j + other.sum_j,
            min_i: self.min_i.min(other.min_i),
            min_j: self.min_j.min(other.min_j),
            max_i: self.max_i.max(other.max_i),
            max_j: self.max_j.max(other.max_j),
        }
    }

    fn finish(self) -> RegionResult {
        if self.area == 0 {
            return RegionResult::Empty;
        }
        let area = self.area as f64;
        RegionResult::Object(RegionStats {
            area: self.area,
            centroid: Centroid::new(self.sum_j as f64 / area, self.sum_i as f64 / area),
            bbox: BoundingBox {
                min_i: self.min_i,
                min_j: self.min_j,
                max_i: self.max_i,
                max_j: self.max_j,
            },
        })
    }
}

type Partials = (RegionAccumulator, RegionAccumulator);

#[inline]
fn fold_row(acc: Partials, i: usize, row: &[u8], rule: ThresholdRule) -> Partials {
    row.iter().enumerate().fold(acc, |(fg, bg), (j, &g)| {
        if rule.matches(g) {
            (fg.push(i, j), bg)
        } else {
            (fg, bg.push(i, j))
        }
    })
}

fn finish(grid: &PixelGrid, (fg, bg): Partials, path: &str) -> DualRegionResult {
    debug!(
        "region stats ({path}) on {}x{}: primary area {}, complement area {}",
        grid.rows(),
        grid.cols(),
        fg.area,
        bg.area
    );
    DualRegionResult::new(fg.finish(), bg.finish())
}

/// Measure `g >= threshold` (primary) and `g < threshold` (complement) in one pass
pub fn measure_both(grid: &PixelGrid, threshold: u8) -> DualRegionResult {
    measure_rule(grid, ThresholdRule::SingleHigh(threshold))
}

/// Measure the binarizer's foreground (primary) and the rest (complement) in one pass
pub fn measure_both_with(grid: &PixelGrid, binarizer: &Binarizer) -> DualRegionResult {
    measure_rule(grid, binarizer.rule())
}

fn measure_rule(grid: &PixelGrid, rule: ThresholdRule) -> DualRegionResult {
    traversal::record();
    let partials = grid
        .row_iter()
        .enumerate()
        .fold(Partials::default(), |acc, (i, row)| fold_row(acc, i, row, rule));
    finish(grid, partials, "sequential")
}

/// Row-parallel variant of [`measure_both_with`]
///
/// Each row is folded independently, then the per-row partials are merged
/// in ascending row order. All sums are integers, so the result is identical
/// to the sequential pass for any thread count.
pub fn measure_both_par(grid: &PixelGrid, binarizer: &Binarizer) -> DualRegionResult {
    traversal::record();
    let rule = binarizer.rule();
    let rows: Vec<Partials> = grid
        .as_bytes()
        .par_chunks(grid.cols())
        .enumerate()
        .map(|(i, row)| fold_row(Partials::default(), i, row, rule))
        .collect();
    let partials = rows
        .into_iter()
        .fold(Partials::default(), |(fg, bg), (rfg, rbg)| (fg.merge(rfg), bg.merge(rbg)));
    finish(grid, partials, "parallel")
}

/// Pick the parallel path for grids of at least `config::parallel_min_pixels()` pixels
pub fn measure_both_auto(grid: &PixelGrid, binarizer: &Binarizer) -> DualRegionResult {
    if grid.len() >= config::parallel_min_pixels() {
        measure_both_par(grid, binarizer)
    } else {
        measure_both_with(grid, binarizer)
    }
}

/// Region of pixels with `g >= threshold`
pub fn measure_white(grid: &PixelGrid, threshold: u8) -> RegionResult {
    measure_both(grid, threshold).primary
}

/// Region of pixels with `g < threshold`
pub fn measure_black(grid: &PixelGrid, threshold: u8) -> RegionResult {
    measure_both(grid, threshold).complement
}

/// Measure set bits (primary) and clear bits (complement) of a mask
pub fn measure_mask(mask: &BinaryMask) -> DualRegionResult {
    traversal::record();
    let (fg, bg) = (0..mask.rows()).fold(Partials::default(), |acc, i| {
        (0..mask.cols()).fold(acc, |(fg, bg), j| {
            if mask.get(i, j) {
                (fg.push(i, j), bg)
            } else {
                (fg, bg.push(i, j))
            }
        })
    });
    DualRegionResult::new(fg.finish(), bg.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::traversal::grid_traversals;

    fn square_on_black() -> PixelGrid {
        // 2x2 bright square at rows 2..=3, cols 3..=4 on a 6x8 grid
        let mut data = vec![0u8; 6 * 8];
        for i in 2..=3 {
            for j in 3..=4 {
                data[i * 8 + j] = 255;
            }
        }
        PixelGrid::new(6, 8, data).unwrap()
    }

    #[test]
    fn test_measure_both_square() {
        let grid = square_on_black();
        let dual = measure_both(&grid, 128);

        let white = dual.primary.stats().copied().unwrap();
        assert_eq!(white.area, 4);
        assert_eq!(white.centroid, Centroid::new(3.5, 2.5));
        assert_eq!(dual.primary.bbox_or_sentinel(), (2, 3, 3, 4));

        let black = dual.complement.stats().copied().unwrap();
        assert_eq!(black.area, 44);
        assert_eq!(dual.complement.bbox_or_sentinel(), (0, 0, 5, 7));
        assert_eq!(dual.total_area(), 48);
    }

    #[test]
    fn test_centroid_is_column_then_row() {
        // one bright pixel at row 1, column 4
        let mut data = vec![0u8; 3 * 6];
        data[6 + 4] = 200;
        let grid = PixelGrid::new(3, 6, data).unwrap();
        let white = measure_white(&grid, 100);
        assert_eq!(white.centroid_x(), 4.0);
        assert_eq!(white.centroid_y(), 1.0);
    }

    #[test]
    fn test_uniform_grid_has_empty_partition() {
        let grid = PixelGrid::filled(4, 5, 200).unwrap();
        let dual = measure_both(&grid, 128);
        assert_eq!(dual.primary.area(), 20);
        assert_eq!(dual.complement, RegionResult::Empty);
        assert!(dual.complement.centroid_x().is_nan());
        assert!(dual.complement.centroid_y().is_nan());
        assert_eq!(dual.complement.bbox_or_sentinel(), (-1, -1, -1, -1));

        let black = measure_black(&PixelGrid::filled(3, 3, 10).unwrap(), 0);
        assert_eq!(black, RegionResult::Empty);
    }

    #[test]
    fn test_areas_partition_grid() {
        let data: Vec<u8> = (0..11 * 13).map(|k| ((k * 31 + 7) % 256) as u8).collect();
        let grid = PixelGrid::new(11, 13, data).unwrap();
        for t in [0u8, 1, 64, 128, 200, 255] {
            assert_eq!(measure_both(&grid, t).total_area(), 11 * 13);
        }
        for (t1, t2) in [(10, 20), (100, 50), (0, 255), (255, 0)] {
            let b = Binarizer::band(t1, t2);
            assert_eq!(measure_both_with(&grid, &b).total_area(), 11 * 13);
        }
    }

    #[test]
    fn test_swap_does_not_traverse() {
        let grid = square_on_black();
        let dual = measure_both(&grid, 128);
        let before = grid_traversals();
        let swapped = dual.swap();
        assert_eq!(grid_traversals(), before);
        assert_eq!(swapped.primary, measure_black(&grid, 128));
        assert_eq!(swapped.swap(), dual);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let data: Vec<u8> = (0..57 * 41).map(|k| ((k * 131 + k / 41) % 256) as u8).collect();
        let grid = PixelGrid::new(57, 41, data).unwrap();
        for b in [Binarizer::single_high(128), Binarizer::band(40, 90), Binarizer::single_low(3)] {
            assert_eq!(measure_both_par(&grid, &b), measure_both_with(&grid, &b));
            assert_eq!(measure_both_auto(&grid, &b), measure_both_with(&grid, &b));
        }
    }

    #[test]
    fn test_measure_mask_matches_grid_stats() {
        let grid = square_on_black();
        let b = Binarizer::single_high(128);
        let mask = b.binarize(&grid).mask;
        assert_eq!(measure_mask(&mask), measure_both_with(&grid, &b));
    }

    #[test]
    fn test_band_regions_use_corrected_thresholds() {
        let grid = PixelGrid::from_rows(&[[48u8, 49, 75], [101, 102, 200]]).unwrap();
        let b = Binarizer::band(100, 50);
        let dual = measure_both_with(&grid, &b);
        assert_eq!(dual.primary.area(), 3);
        assert_eq!(dual.primary.bbox_or_sentinel(), (0, 0, 1, 2));
    }
}
