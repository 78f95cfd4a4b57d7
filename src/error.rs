//! Error types for grid construction and image loading

use thiserror::Error;

/// Errors raised at the boundary of the analysis core
///
/// Empty regions and out-of-order band thresholds are not errors: the former
/// are represented by [`crate::RegionResult::Empty`] and zero moments, the
/// latter by a [`crate::ThresholdCorrection`].
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Grid or mask shape is unusable (zero dimension, buffer mismatch, ragged rows)
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Human-readable description of what was wrong
        reason: String,
    },
    /// Image decoding failed in the I/O adapter
    #[error("failed to load image: {0}")]
    Image(#[from] image::ImageError),
}

impl AnalysisError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, AnalysisError>;
