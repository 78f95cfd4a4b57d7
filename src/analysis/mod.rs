//! Numeric engines over grids and masks
//!
//! - Region statistics: area, centroid and bounding box of both partitions in one pass
//! - Moments: raw, central, normalized central and Hu invariants
//! - Shape: nearest reference shape by Hu invariants
//! - Learn: decision tree and random forest over log-scaled Hu features

pub mod learn;
pub mod moments;
pub mod region_stats;
pub mod shape;

pub use learn::{
    CrossValidation, Dataset, DecisionTree, ForestParams, RandomForest, ShapeModel, TreeParams,
    build_mock_dataset, extract_features, k_fold_cross_validation, train_default,
};
pub use moments::{MomentEngine, compute_grid_moments, compute_moments, hu_from_normalized};
pub use region_stats::{
    measure_black, measure_both, measure_both_auto, measure_both_par, measure_both_with,
    measure_mask, measure_white,
};
pub use shape::{ReferenceShape, ShapeClassifier, ShapeMatch};
