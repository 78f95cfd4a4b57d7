//! Learned shape classifiers over log-scaled Hu features
//!
//! A Gini decision tree and a bootstrap random forest, trained on
//! synthetic masks drawn from the reference shapes at random sizes. Both
//! implement [`ShapeModel`], so they can be scored with
//! [`k_fold_cross_validation`] and applied to any mask.
//!
//! Every random choice goes through a seeded [`StdRng`], so training the
//! same data with the same seed always yields the same model.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::error::{AnalysisError, Result};
use crate::models::BinaryMask;

use super::moments::compute_moments;
use super::shape::{self, ReferenceShape};

/// Hu features are `-log10|φk|` for k in 1..=7
pub type Features = [f64; 7];

/// Number of shape classes
const N_CLASSES: usize = ReferenceShape::ALL.len();

/// Splits that gain less Gini purity than this become leaves
const MIN_GAIN: f64 = 1e-12;

/// Log-scaled Hu vector of a mask
pub fn extract_features(mask: &BinaryMask) -> Features {
    compute_moments(mask).hu.log_scaled()
}

/// Labeled feature vectors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// One feature vector per sample
    pub features: Vec<Features>,
    /// One label per sample
    pub labels: Vec<ReferenceShape>,
}

impl Dataset {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when there is no sample
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Add one sample
    pub fn push(&mut self, features: Features, label: ReferenceShape) {
        self.features.push(features);
        self.labels.push(label);
    }

    /// Add the features of a mask
    pub fn push_mask(&mut self, mask: &BinaryMask, label: ReferenceShape) {
        self.push(extract_features(mask), label);
    }

    /// Samples at the given positions, in that order
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: indices.iter().map(|&k| self.features[k]).collect(),
            labels: indices.iter().map(|&k| self.labels[k]).collect(),
        }
    }

    /// Distinct labels, in [`ReferenceShape::ALL`] order
    pub fn classes(&self) -> Vec<ReferenceShape> {
        let counts = class_counts(self.labels.iter().copied());
        ReferenceShape::ALL
            .into_iter()
            .filter(|s| counts[s.index()] > 0)
            .collect()
    }

    fn check(&self) -> Result<()> {
        if self.features.len() != self.labels.len() {
            return Err(AnalysisError::invalid(format!(
                "{} feature vectors but {} labels",
                self.features.len(),
                self.labels.len()
            )));
        }
        if self.is_empty() {
            return Err(AnalysisError::invalid("cannot train on an empty dataset"));
        }
        Ok(())
    }
}

fn class_counts(labels: impl IntoIterator<Item = ReferenceShape>) -> [usize; N_CLASSES] {
    let mut counts = [0usize; N_CLASSES];
    for label in labels {
        counts[label.index()] += 1;
    }
    counts
}

/// Most frequent class; ties go to the earlier shape in [`ReferenceShape::ALL`]
fn majority(counts: &[usize; N_CLASSES]) -> ReferenceShape {
    let mut best = 0;
    for k in 1..N_CLASSES {
        if counts[k] > counts[best] {
            best = k;
        }
    }
    ReferenceShape::ALL[best]
}

fn gini(counts: &[usize; N_CLASSES], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / total).powi(2)).sum::<f64>()
}

/// A trained classifier over [`Features`]
pub trait ShapeModel {
    /// Classes seen during training, in [`ReferenceShape::ALL`] order
    fn classes(&self) -> &[ReferenceShape];

    /// Predicted class of one sample
    fn predict_one(&self, x: &Features) -> ReferenceShape;

    /// Probability per class of one sample, aligned with [`ShapeModel::classes`]
    fn predict_proba_one(&self, x: &Features) -> Vec<f64>;

    /// Predicted class of every sample
    fn predict(&self, xs: &[Features]) -> Vec<ReferenceShape> {
        xs.iter().map(|x| self.predict_one(x)).collect()
    }

    /// Class probabilities of every sample
    fn predict_proba(&self, xs: &[Features]) -> Vec<Vec<f64>> {
        xs.iter().map(|x| self.predict_proba_one(x)).collect()
    }

    /// Predicted class of a mask and the probability given to it
    fn classify_mask(&self, mask: &BinaryMask) -> (ReferenceShape, f64) {
        let x = extract_features(mask);
        let label = self.predict_one(&x);
        let proba = self.predict_proba_one(&x);
        let confidence = self
            .classes()
            .iter()
            .position(|&c| c == label)
            .map_or(0.0, |k| proba[k]);
        (label, confidence)
    }
}

/// Decision tree hyperparameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// Deepest level a split may sit at; `None` grows until pure
    pub max_depth: Option<usize>,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: Some(10),
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(ReferenceShape),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Binary tree that splits on `x[feature] <= threshold` to minimize Gini impurity
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    root: Node,
    classes: Vec<ReferenceShape>,
}

impl DecisionTree {
    /// Grow a tree on a dataset
    pub fn fit(data: &Dataset, params: TreeParams) -> Result<Self> {
        data.check()?;
        let indices: Vec<usize> = (0..data.len()).collect();
        let root = build(data, &indices, 0, &params);
        Ok(Self {
            root,
            classes: data.classes(),
        })
    }

    /// Number of split nodes from the root to the deepest leaf
    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf(_) => 0,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }
}

impl ShapeModel for DecisionTree {
    fn classes(&self) -> &[ReferenceShape] {
        &self.classes
    }

    fn predict_one(&self, x: &Features) -> ReferenceShape {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(label) => return *label,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { left.as_ref() } else { right.as_ref() };
                }
            }
        }
    }

    /// One-hot on the predicted class
    fn predict_proba_one(&self, x: &Features) -> Vec<f64> {
        let label = self.predict_one(x);
        self.classes
            .iter()
            .map(|&c| if c == label { 1.0 } else { 0.0 })
            .collect()
    }
}

fn build(data: &Dataset, indices: &[usize], depth: usize, params: &TreeParams) -> Node {
    let counts = class_counts(indices.iter().map(|&k| data.labels[k]));
    let leaf = || Node::Leaf(majority(&counts));

    if counts.iter().filter(|&&c| c > 0).count() == 1 {
        return leaf();
    }
    let too_deep = params.max_depth.is_some_and(|max| depth >= max);
    if too_deep || indices.len() < params.min_samples_split {
        return leaf();
    }
    let Some((feature, threshold, gain)) = best_split(data, indices, &counts) else {
        return leaf();
    };
    if gain <= MIN_GAIN {
        return leaf();
    }

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&k| data.features[k][feature] <= threshold);
    Node::Split {
        feature,
        threshold,
        left: Box::new(build(data, &left, depth + 1, params)),
        right: Box::new(build(data, &right, depth + 1, params)),
    }
}

/// Best `(feature, threshold, gain)`; the threshold is always a sample value
fn best_split(
    data: &Dataset,
    indices: &[usize],
    counts: &[usize; N_CLASSES],
) -> Option<(usize, f64, f64)> {
    let total = indices.len();
    let parent = gini(counts, total);
    let mut best: Option<(usize, f64, f64)> = None;

    for feature in 0..7 {
        let mut order: Vec<(f64, ReferenceShape)> = indices
            .iter()
            .map(|&k| (data.features[k][feature], data.labels[k]))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Sweep thresholds in ascending order, moving samples left as we go.
        let mut left = [0usize; N_CLASSES];
        let mut n_left = 0;
        let mut k = 0;
        while k < order.len() {
            let threshold = order[k].0;
            while k < order.len() && order[k].0 == threshold {
                left[order[k].1.index()] += 1;
                n_left += 1;
                k += 1;
            }
            let n_right = total - n_left;
            if n_right == 0 {
                break;
            }
            let mut right = *counts;
            for c in 0..N_CLASSES {
                right[c] -= left[c];
            }
            let split = (n_left as f64 / total as f64) * gini(&left, n_left)
                + (n_right as f64 / total as f64) * gini(&right, n_right);
            let gain = parent - split;
            if best.is_none_or(|(_, _, g)| gain > g) {
                best = Some((feature, threshold, gain));
            }
        }
    }
    best
}

/// Random forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Parameters of every tree
    pub tree: TreeParams,
    /// Bootstrap sample size as a fraction of the dataset
    pub sample_ratio: f64,
    /// Seed of the bootstrap sampler
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            tree: TreeParams::default(),
            sample_ratio: 0.8,
            seed: 0,
        }
    }
}

/// Majority vote of decision trees grown on bootstrap samples
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    classes: Vec<ReferenceShape>,
}

impl RandomForest {
    /// Grow `n_estimators` trees, each on a bootstrap sample drawn with replacement
    ///
    /// Samples are drawn up front from one seeded generator, then the trees
    /// are grown in parallel; the result does not depend on thread count.
    pub fn fit(data: &Dataset, params: ForestParams) -> Result<Self> {
        data.check()?;
        if params.n_estimators == 0 {
            return Err(AnalysisError::invalid("a forest needs at least one tree"));
        }
        if params.sample_ratio.is_nan() || params.sample_ratio <= 0.0 {
            return Err(AnalysisError::invalid(format!(
                "sample ratio must be positive, got {}",
                params.sample_ratio
            )));
        }

        let n = data.len();
        let sample_size = ((n as f64 * params.sample_ratio) as usize).max(1);
        let mut rng = StdRng::seed_from_u64(params.seed);
        let samples: Vec<Vec<usize>> = (0..params.n_estimators)
            .map(|_| (0..sample_size).map(|_| rng.random_range(0..n)).collect())
            .collect();

        let trees = samples
            .par_iter()
            .map(|idx| DecisionTree::fit(&data.select(idx), params.tree))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "random forest: {} trees on {} samples of {}",
            trees.len(),
            sample_size,
            n
        );
        Ok(Self {
            trees,
            classes: data.classes(),
        })
    }

    /// The grown trees
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    fn votes(&self, x: &Features) -> [usize; N_CLASSES] {
        class_counts(self.trees.iter().map(|t| t.predict_one(x)))
    }
}

impl ShapeModel for RandomForest {
    fn classes(&self) -> &[ReferenceShape] {
        &self.classes
    }

    fn predict_one(&self, x: &Features) -> ReferenceShape {
        majority(&self.votes(x))
    }

    /// Share of trees voting for each class
    fn predict_proba_one(&self, x: &Features) -> Vec<f64> {
        let votes = self.votes(x);
        let total = self.trees.len() as f64;
        self.classes
            .iter()
            .map(|c| votes[c.index()] as f64 / total)
            .collect()
    }
}

/// Per-fold and mean accuracy of a k-fold run
#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidation {
    /// Fraction of correctly predicted test samples, per fold
    pub fold_accuracies: Vec<f64>,
}

impl CrossValidation {
    /// Mean of the fold accuracies
    pub fn mean_accuracy(&self) -> f64 {
        self.fold_accuracies.iter().sum::<f64>() / self.fold_accuracies.len() as f64
    }
}

/// Shuffle once, cut into `k` folds of `len / k` samples, and test on each fold in turn
///
/// Samples left over after the last full fold are always in the training part.
pub fn k_fold_cross_validation<M, F>(
    data: &Dataset,
    k: usize,
    seed: u64,
    fit: F,
) -> Result<CrossValidation>
where
    M: ShapeModel,
    F: Fn(&Dataset) -> Result<M>,
{
    data.check()?;
    if k < 2 || k > data.len() {
        return Err(AnalysisError::invalid(format!(
            "need 2 <= k <= {} folds, got {k}",
            data.len()
        )));
    }

    let mut order: Vec<usize> = (0..data.len()).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let fold_size = data.len() / k;

    let mut fold_accuracies = Vec::with_capacity(k);
    for fold in 0..k {
        let (start, end) = (fold * fold_size, (fold + 1) * fold_size);
        let test = data.select(&order[start..end]);
        let train_idx: Vec<usize> = order[..start].iter().chain(&order[end..]).copied().collect();
        let model = fit(&data.select(&train_idx))?;

        let predicted = model.predict(&test.features);
        let correct = predicted.iter().zip(&test.labels).filter(|(p, t)| p == t).count();
        let accuracy = correct as f64 / test.len() as f64;
        debug!(
            "fold {}/{k}: accuracy {:.3} (train {}, test {})",
            fold + 1,
            accuracy,
            train_idx.len(),
            test.len()
        );
        fold_accuracies.push(accuracy);
    }
    Ok(CrossValidation { fold_accuracies })
}

/// Synthetic training set: `per_class` masks of every reference shape on an
/// `n` x `n` canvas, each drawn at a random size
///
/// Rectangles are kept clearly elongated so they do not overlap squares.
pub fn build_mock_dataset(n: usize, per_class: usize, seed: u64) -> Result<Dataset> {
    if n < 32 {
        return Err(AnalysisError::invalid(format!(
            "mock canvas must be at least 32 pixels, got {n}"
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let span = |rng: &mut StdRng, lo: f64, hi: f64| {
        rng.random_range((lo * n as f64) as usize..=(hi * n as f64) as usize)
    };
    let mut data = Dataset::default();

    for _ in 0..per_class {
        let r = span(&mut rng, 0.1, 0.45);
        data.push_mask(&shape::circle(n, r), ReferenceShape::Circle);
    }
    for _ in 0..per_class {
        let side = span(&mut rng, 0.15, 0.75);
        data.push_mask(&shape::square(n, side), ReferenceShape::Square);
    }
    for _ in 0..per_class {
        let side = span(&mut rng, 0.2, 0.8);
        data.push_mask(&shape::triangle(n, side), ReferenceShape::Triangle);
    }
    for _ in 0..per_class {
        let mut w = span(&mut rng, 0.2, 0.8);
        let h = span(&mut rng, 0.15, 0.5);
        if w.abs_diff(h) < (0.15 * n as f64) as usize {
            w += (0.2 * n as f64) as usize;
        }
        data.push_mask(&shape::rectangle(n, h, w), ReferenceShape::Rectangle);
    }
    debug!("mock dataset: {} samples on {n}x{n} canvases", data.len());
    Ok(data)
}

/// Tree and forest trained on the default mock dataset
pub fn train_default(seed: u64) -> Result<(DecisionTree, RandomForest)> {
    let data = build_mock_dataset(200, 25, seed)?;
    let tree = DecisionTree::fit(&data, TreeParams::default())?;
    let forest = RandomForest::fit(
        &data,
        ForestParams {
            seed,
            ..ForestParams::default()
        },
    )?;
    Ok((tree, forest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> Dataset {
        let mut data = Dataset::default();
        for k in 0..4 {
            let v = k as f64;
            data.push([v, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], ReferenceShape::Circle);
            data.push([v + 10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], ReferenceShape::Square);
        }
        data
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[4, 0, 0, 0], 4), 0.0);
        assert_eq!(gini(&[2, 2, 0, 0], 4), 0.5);
        assert_eq!(gini(&[0; 4], 0), 0.0);
    }

    #[test]
    fn test_majority_tie_goes_to_first_shape() {
        assert_eq!(majority(&[0, 3, 3, 1]), ReferenceShape::Square);
        assert_eq!(majority(&[0, 0, 0, 2]), ReferenceShape::Triangle);
    }

    #[test]
    fn test_tree_splits_on_sample_value() {
        let tree = DecisionTree::fit(&toy(), TreeParams::default()).unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.classes(), &[ReferenceShape::Circle, ReferenceShape::Square]);
        let x = |v: f64| [v, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        // split is at the largest circle value, x <= 3 goes left
        assert_eq!(tree.predict_one(&x(3.0)), ReferenceShape::Circle);
        assert_eq!(tree.predict_one(&x(3.5)), ReferenceShape::Square);
        assert_eq!(tree.predict_proba_one(&x(-5.0)), vec![1.0, 0.0]);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let mut data = Dataset::default();
        data.push([1.0; 7], ReferenceShape::Triangle);
        data.push([2.0; 7], ReferenceShape::Triangle);
        let tree = DecisionTree::fit(&data, TreeParams::default()).unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict_one(&[9.0; 7]), ReferenceShape::Triangle);
    }

    #[test]
    fn test_max_depth_zero_predicts_majority() {
        let mut data = toy();
        data.push([20.0; 7], ReferenceShape::Square);
        let params = TreeParams {
            max_depth: Some(0),
            ..TreeParams::default()
        };
        let tree = DecisionTree::fit(&data, params).unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict_one(&[0.0; 7]), ReferenceShape::Square);
    }

    #[test]
    fn test_empty_or_mismatched_dataset_rejected() {
        assert!(DecisionTree::fit(&Dataset::default(), TreeParams::default()).is_err());
        let mut data = toy();
        data.labels.pop();
        assert!(DecisionTree::fit(&data, TreeParams::default()).is_err());
        let params = ForestParams {
            n_estimators: 0,
            ..ForestParams::default()
        };
        assert!(RandomForest::fit(&toy(), params).is_err());
    }

    #[test]
    fn test_forest_is_seeded() {
        let data = toy();
        let params = ForestParams {
            n_estimators: 9,
            seed: 42,
            ..ForestParams::default()
        };
        let a = RandomForest::fit(&data, params).unwrap();
        let b = RandomForest::fit(&data, params).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.trees().len(), 9);

        let proba = a.predict_proba_one(&[0.0; 7]);
        assert_eq!(proba.len(), 2);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mock_dataset_shape() {
        let data = build_mock_dataset(64, 3, 7).unwrap();
        assert_eq!(data.len(), 12);
        assert_eq!(data.classes(), ReferenceShape::ALL.to_vec());
        assert_eq!(data, build_mock_dataset(64, 3, 7).unwrap());
        assert!(build_mock_dataset(16, 3, 7).is_err());
    }

    #[test]
    fn test_models_learn_reference_shapes() {
        let data = build_mock_dataset(100, 12, 1).unwrap();
        let tree = DecisionTree::fit(&data, TreeParams::default()).unwrap();
        assert_eq!(tree.predict(&data.features), data.labels);

        let forest = RandomForest::fit(
            &data,
            ForestParams {
                n_estimators: 15,
                seed: 1,
                ..ForestParams::default()
            },
        )
        .unwrap();
        for shape in ReferenceShape::ALL {
            let (label, confidence) = forest.classify_mask(&shape.render(100));
            assert_eq!(label, shape);
            assert!(confidence > 0.5);
        }
    }

    #[test]
    fn test_k_fold() {
        let data = build_mock_dataset(100, 10, 3).unwrap();
        let fit_tree = |d: &Dataset| DecisionTree::fit(d, TreeParams::default());
        let cv = k_fold_cross_validation(&data, 5, 3, fit_tree).unwrap();
        assert_eq!(cv.fold_accuracies.len(), 5);
        assert!(cv.mean_accuracy() >= 0.9);

        assert!(k_fold_cross_validation(&data, 1, 3, fit_tree).is_err());
    }
}
