//! Threshold rules that turn a gray grid into a {0,1} mask
//!
//! Four rules are supported: single high (`g >= T`), single low (`g < T`),
//! the inclusive band (`T1 <= g <= T2`) and its complement. Thresholds are
//! clamped to `0..=255`. A band whose bounds arrive out of order is repaired
//! with a fixed rule and the repair is reported back through
//! [`ThresholdCorrection`].

use log::{debug, warn};
use rayon::prelude::*;

use crate::models::{BinaryMask, PixelGrid};
use crate::utils::traversal;

/// Threshold parameters as requested by the caller, before clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMode {
    /// Foreground iff `g >= T`
    SingleHigh(i32),
    /// Foreground iff `g < T`
    SingleLow(i32),
    /// Foreground iff `T1 <= g <= T2`
    Band(i32, i32),
    /// Foreground iff `g < T1 || g > T2`
    BandComplement(i32, i32),
}

/// Resolved rule with clamped, ordered thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdRule {
    /// Foreground iff `g >= T`
    SingleHigh(u8),
    /// Foreground iff `g < T`
    SingleLow(u8),
    /// Foreground iff `low <= g <= high`
    Band {
        /// Inclusive lower bound
        low: u8,
        /// Inclusive upper bound
        high: u8,
    },
    /// Foreground iff `g < low || g > high`
    BandComplement {
        /// Values below this are foreground
        low: u8,
        /// Values above this are foreground
        high: u8,
    },
}

impl ThresholdRule {
    /// Classify a single gray value
    #[inline]
    pub fn matches(&self, gray: u8) -> bool {
        match *self {
            Self::SingleHigh(t) => gray >= t,
            Self::SingleLow(t) => gray < t,
            Self::Band { low, high } => low <= gray && gray <= high,
            Self::BandComplement { low, high } => gray < low || gray > high,
        }
    }
}

/// Record of a band whose bounds had to be reordered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdCorrection {
    /// `(T1, T2)` after clamping, as the caller asked for them
    pub requested: (u8, u8),
    /// `(T1, T2)` actually used
    pub applied: (u8, u8),
}

fn clamp_gray(t: i32) -> u8 {
    t.clamp(0, 255) as u8
}

/// Reorder band bounds when `t1 >= t2`
///
/// `T1` becomes `clamp(0, 254, T2 - 1)` and `T2` becomes
/// `clamp(1, 255, old T1 + 1)`. The rule is asymmetric and downstream
/// consumers rely on it exactly, so it must not be replaced by a plain swap.
pub fn correct_band(t1: i32, t2: i32) -> (u8, u8, Option<ThresholdCorrection>) {
    let t1 = clamp_gray(t1);
    let t2 = clamp_gray(t2);
    if t1 < t2 {
        return (t1, t2, None);
    }

    let old1 = t1 as i32;
    let new1 = (t2 as i32 - 1).clamp(0, 254) as u8;
    let new2 = (old1 + 1).clamp(1, 255) as u8;
    let correction = ThresholdCorrection {
        requested: (t1, t2),
        applied: (new1, new2),
    };
    warn!(
        "band thresholds out of order (T1={t1}, T2={t2}); adjusted to T1={new1}, T2={new2}"
    );
    (new1, new2, Some(correction))
}

/// Mask produced by a [`Binarizer`], with any threshold correction attached
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Binarization {
    /// Foreground bits
    pub mask: BinaryMask,
    /// Present when band bounds were reordered
    pub correction: Option<ThresholdCorrection>,
}

/// Resolved threshold rule, ready to classify pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binarizer {
    rule: ThresholdRule,
    correction: Option<ThresholdCorrection>,
}

impl Binarizer {
    /// Resolve a mode: clamp thresholds and repair band ordering
    pub fn new(mode: ThresholdMode) -> Self {
        let (rule, correction) = match mode {
            ThresholdMode::SingleHigh(t) => (ThresholdRule::SingleHigh(clamp_gray(t)), None),
            ThresholdMode::SingleLow(t) => (ThresholdRule::SingleLow(clamp_gray(t)), None),
            ThresholdMode::Band(t1, t2) => {
                let (low, high, correction) = correct_band(t1, t2);
                (ThresholdRule::Band { low, high }, correction)
            }
            ThresholdMode::BandComplement(t1, t2) => {
                let (low, high, correction) = correct_band(t1, t2);
                (ThresholdRule::BandComplement { low, high }, correction)
            }
        };
        Self { rule, correction }
    }

    /// `g >= t` is foreground
    pub fn single_high(t: i32) -> Self {
        Self::new(ThresholdMode::SingleHigh(t))
    }

    /// `g < t` is foreground
    pub fn single_low(t: i32) -> Self {
        Self::new(ThresholdMode::SingleLow(t))
    }

    /// `t1 <= g <= t2` is foreground
    pub fn band(t1: i32, t2: i32) -> Self {
        Self::new(ThresholdMode::Band(t1, t2))
    }

    /// The resolved rule
    pub fn rule(&self) -> ThresholdRule {
        self.rule
    }

    /// The band correction applied during resolution, if any
    pub fn correction(&self) -> Option<ThresholdCorrection> {
        self.correction
    }

    /// Classify a single gray value
    #[inline]
    pub fn classify(&self, gray: u8) -> bool {
        self.rule.matches(gray)
    }

    /// Binarize a grid in row-major order
    pub fn binarize(&self, grid: &PixelGrid) -> Binarization {
        traversal::record();
        let rule = self.rule;
        let mask = BinaryMask::pack(
            grid.rows(),
            grid.cols(),
            grid.as_bytes().iter().map(|&g| rule.matches(g)),
        );
        debug!(
            "binarized {}x{} grid with {:?}: {} foreground pixels",
            grid.rows(),
            grid.cols(),
            rule,
            mask.count_ones()
        );
        Binarization {
            mask,
            correction: self.correction,
        }
    }

    /// Binarize with rows classified in parallel; same mask as [`Self::binarize`]
    pub fn binarize_par(&self, grid: &PixelGrid) -> Binarization {
        traversal::record();
        let rule = self.rule;
        let flags: Vec<bool> = grid
            .as_bytes()
            .par_chunks(grid.cols())
            .flat_map_iter(|row| row.iter().map(move |&g| rule.matches(g)))
            .collect();
        Binarization {
            mask: BinaryMask::pack(grid.rows(), grid.cols(), flags),
            correction: self.correction,
        }
    }
}

/// Simple global threshold binarization, `g >= threshold` is foreground
pub fn threshold_binarize(grid: &PixelGrid, threshold: u8) -> BinaryMask {
    Binarizer::single_high(threshold as i32).binarize(grid).mask
}
