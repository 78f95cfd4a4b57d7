//! region_moments - geometric region statistics and Hu invariant moments
//!
//! Works on thresholded gray images. A [`PixelGrid`] is split by a threshold
//! rule into foreground and background; both partitions are measured in a
//! single pass (area, centroid, bounding box), and the foreground mask is
//! reduced to raw, central and normalized central moments plus the seven Hu
//! invariants.
//!
//! Coordinates are always `(i, j)` = (row, column); centroids report
//! `x` = column and `y` = row.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Numeric engines (region statistics, moments, shape matching)
pub mod analysis;
/// Environment-driven tuning knobs
pub mod config;
/// Error types
pub mod error;
/// Core data structures (PixelGrid, BinaryMask, RegionResult, MomentSet)
pub mod models;
/// Image loading adapter
pub mod tools;
/// Utility functions (binarization, traversal instrumentation)
pub mod utils;

pub use analysis::{MomentEngine, ReferenceShape, ShapeClassifier, ShapeMatch};
pub use error::{AnalysisError, Result};
pub use models::{
    BinaryMask, BoundingBox, CentralMoments, Centroid, DualRegionResult, HuInvariants, MomentSet,
    NormalizedMoments, PixelGrid, RawMoments, RegionResult, RegionStats,
};
pub use utils::binarization::{
    Binarization, Binarizer, ThresholdCorrection, ThresholdMode, ThresholdRule,
};

use log::debug;

/// Everything the core derives from one grid and one threshold rule
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Foreground (primary) and background (complement) regions
    pub regions: DualRegionResult,
    /// Moments of the foreground mask
    pub moments: MomentSet,
    /// The foreground mask itself
    pub mask: BinaryMask,
    /// Present when band thresholds had to be reordered
    pub correction: Option<ThresholdCorrection>,
}

impl Analysis {
    /// Classify the foreground shape against the shared templates
    pub fn shape(&self) -> ShapeMatch {
        ShapeClassifier::shared().classify(&self.moments)
    }
}

/// Run the full core over a grid
///
/// # Arguments
/// * `grid` - Gray values, `rows` x `cols`
/// * `mode` - Threshold rule; band bounds out of order are corrected and reported
///
/// # Returns
/// Region statistics of both partitions, moments of the foreground, the mask,
/// and any threshold correction
pub fn analyze(grid: &PixelGrid, mode: ThresholdMode) -> Analysis {
    let binarizer = Binarizer::new(mode);

    // Step 1: Both partitions in one pass (row-parallel on large grids)
    let regions = analysis::measure_both_auto(grid, &binarizer);

    // Step 2: Foreground mask
    let Binarization { mask, correction } = binarizer.binarize(grid);

    // Step 3: Moments of the mask
    let moments = MomentEngine::from_mask(&mask).compute();

    debug!(
        "analyzed {}x{} grid with {:?}: area {}, M00 {}",
        grid.rows(),
        grid.cols(),
        binarizer.rule(),
        regions.primary.area(),
        moments.raw.m00
    );

    Analysis {
        regions,
        moments,
        mask,
        correction,
    }
}
