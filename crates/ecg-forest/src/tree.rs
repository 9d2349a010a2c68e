//! Single CART decision tree: growth, traversal and per-tree importances.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::ForestError;
use crate::node::{Impurity, Node, NodeIndex};
use crate::split::{SplitCriterion, SplitSearch};

/// Settings for growing a single CART tree.
///
/// | Parameter           | Default            |
/// |---------------------|--------------------|
/// | `criterion`         | `Gini`             |
/// | `max_depth`         | `None` (unlimited) |
/// | `min_samples_split` | 2                  |
/// | `min_samples_leaf`  | 1                  |
/// | `max_features`      | `None` (all)       |
/// | `seed`              | 42                 |
#[derive(Debug, Clone)]
pub struct TreeConfig {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeConfig {
    /// Create a config with the defaults listed above.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }

    /// Set the split criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Limit the depth of the tree; the root sits at depth 0.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum node size eligible for splitting.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum size of each child produced by a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set how many informative features each split examines.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the seed for feature sampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the settings against the data width and resolve `max_features`.
    pub(crate) fn validate(&self, n_features: usize) -> Result<usize, ForestError> {
        if let Some(max_depth) = self.max_depth
            && max_depth == 0
        {
            return Err(ForestError::InvalidMaxDepth { max_depth });
        }
        if self.min_samples_split < 2 {
            return Err(ForestError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf == 0 {
            return Err(ForestError::InvalidMinSamplesLeaf { min_samples_leaf: 0 });
        }
        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(ForestError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }
        Ok(max_features)
    }

    /// Fit a tree on row-major `features` and zero-based class `labels`.
    ///
    /// # Errors
    ///
    /// Any input validation error from [`ForestError`], or an invalid
    /// setting (`max_depth == Some(0)`, `min_samples_split < 2`,
    /// `min_samples_leaf == 0`, `max_features` outside `[1, n_features]`).
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
    ) -> Result<DecisionTree, ForestError> {
        let n_features = validate_training_data(features, labels)?;
        let n_classes = labels.iter().max().map_or(1, |&m| m + 1);
        self.validate(n_features)?;

        let columns = to_columns(features, n_features);
        let samples: Vec<usize> = (0..features.len()).collect();
        Ok(self.grow(&columns, labels, &samples, n_classes))
    }

    /// Grow a tree over pre-validated column-major data.
    ///
    /// `samples` indexes into the columns and may repeat indices.
    pub(crate) fn grow(
        &self,
        columns: &[Vec<f64>],
        labels: &[usize],
        samples: &[usize],
        n_classes: usize,
    ) -> DecisionTree {
        let search = SplitSearch {
            columns,
            labels,
            n_classes,
            criterion: self.criterion,
            max_features: self.max_features.unwrap_or(columns.len()),
            min_samples_leaf: self.min_samples_leaf,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        // Slots are reserved before their subtree is grown so a parent can
        // record its children's indices up front.
        let mut nodes = vec![Node::leaf(&[], Impurity::new(0.0))];
        let mut pending: Vec<(usize, Vec<usize>, usize)> = vec![(0, samples.to_vec(), 0)];

        while let Some((slot, node_samples, depth)) = pending.pop() {
            let mut counts = vec![0usize; n_classes];
            for &s in &node_samples {
                counts[labels[s]] += 1;
            }
            let n_samples = node_samples.len();
            let impurity = self.criterion.impurity(&counts, n_samples);

            let splittable = n_samples >= self.min_samples_split
                && !impurity.is_pure()
                && self.max_depth.is_none_or(|max| depth < max);
            let split = if splittable {
                search.best_split(&node_samples, &counts, &mut rng)
            } else {
                None
            };

            let Some(split) = split else {
                nodes[slot] = Node::leaf(&counts, impurity);
                continue;
            };

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::leaf(&[], impurity));
            nodes.push(Node::leaf(&[], impurity));
            nodes[slot] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: NodeIndex::new(left),
                right: NodeIndex::new(right),
                impurity,
                n_samples,
                gain: split.gain,
            };
            pending.push((right, split.right, depth + 1));
            pending.push((left, split.left, depth + 1));
        }

        debug!(n_nodes = nodes.len(), n_classes, "tree grown");

        DecisionTree {
            nodes,
            n_features: columns.len(),
            n_classes,
        }
    }
}

/// Check shape, finiteness and label count; return the row width.
pub(crate) fn validate_training_data(
    features: &[Vec<f64>],
    labels: &[usize],
) -> Result<usize, ForestError> {
    let Some(first) = features.first() else {
        return Err(ForestError::EmptyDataset);
    };
    let n_features = first.len();
    if n_features == 0 {
        return Err(ForestError::ZeroFeatures);
    }
    if features.len() != labels.len() {
        return Err(ForestError::LabelCountMismatch {
            n_rows: features.len(),
            n_labels: labels.len(),
        });
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(ForestError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(ForestError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

/// Transpose row-major data into one `Vec` per feature.
pub(crate) fn to_columns(features: &[Vec<f64>], n_features: usize) -> Vec<Vec<f64>> {
    (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect()
}

/// A fitted CART tree stored as a flat node arena rooted at index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Class probabilities of the leaf reached by `sample`.
    ///
    /// # Errors
    ///
    /// [`ForestError::PredictionFeatureMismatch`] when the width is wrong.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<&[f64], ForestError> {
        if sample.len() != self.n_features {
            return Err(ForestError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(self.leaf_proba(sample))
    }

    /// Most probable class for `sample`; ties go to the lowest class code.
    ///
    /// # Errors
    ///
    /// [`ForestError::PredictionFeatureMismatch`] when the width is wrong.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, ForestError> {
        Ok(crate::predict::argmax(self.predict_proba(sample)?))
    }

    pub(crate) fn leaf_proba(&self, sample: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proba, .. } => return proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Mean-decrease-in-impurity importances, normalized to sum to 1.
    ///
    /// All zeros for a single-leaf tree.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split { feature, gain, .. } = node {
                totals[feature.index()] += gain;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the nodes in arena order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the number of classes the leaves carry probabilities for.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of leaves.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the longest root-to-leaf path length; a lone leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => deepest = deepest.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((left.index(), d + 1));
                    stack.push((right.index(), d + 1));
                }
            }
        }
        deepest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_groups() -> (Vec<Vec<f64>>, Vec<usize>) {
        let features = vec![
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![3.0, 0.0],
            vec![10.0, 0.0],
            vec![11.0, 0.0],
            vec![12.0, 0.0],
        ];
        (features, vec![0, 0, 0, 1, 1, 1])
    }

    #[test]
    fn pure_labels_make_a_single_leaf() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let tree = TreeConfig::new().fit(&features, &[1, 1, 1]).unwrap();
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.predict(&[5.0]).unwrap(), 1);
    }

    #[test]
    fn separable_groups_are_learned() {
        let (features, labels) = two_groups();
        let tree = TreeConfig::new().fit(&features, &labels).unwrap();
        assert_eq!(tree.predict(&[2.5, 0.0]).unwrap(), 0);
        assert_eq!(tree.predict(&[10.5, 0.0]).unwrap(), 1);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn xor_needs_two_levels() {
        let features = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let tree = TreeConfig::new().fit(&features, &[0, 1, 1, 0]).unwrap();
        assert!(tree.depth() >= 2);
        for (row, label) in features.iter().zip([0, 1, 1, 0]) {
            assert_eq!(tree.predict(row).unwrap(), label);
        }
    }

    #[test]
    fn max_depth_caps_growth() {
        let features = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let tree = TreeConfig::new()
            .with_max_depth(Some(1))
            .fit(&features, &[0, 1, 1, 0])
            .unwrap();
        assert!(tree.depth() <= 1);
    }

    #[test]
    fn min_samples_split_keeps_small_nodes_whole() {
        let features = vec![vec![1.0], vec![2.0]];
        let tree = TreeConfig::new()
            .with_min_samples_split(3)
            .fit(&features, &[0, 1])
            .unwrap();
        assert_eq!(tree.nodes().len(), 1);
        let proba = tree.predict_proba(&[1.0]).unwrap();
        assert!((proba[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn leaf_probabilities_sum_to_one() {
        let features = vec![vec![1.0], vec![1.0], vec![1.0], vec![2.0]];
        let tree = TreeConfig::new().fit(&features, &[0, 1, 1, 2]).unwrap();
        for x in [0.0, 1.0, 1.5, 3.0] {
            let sum: f64 = tree.predict_proba(&[x]).unwrap().iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn importances_favour_the_informative_column() {
        let (features, labels) = two_groups();
        let importances = TreeConfig::new().fit(&features, &labels).unwrap().feature_importances();
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((importances[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let (features, labels) = two_groups();
        assert!(matches!(
            TreeConfig::new().with_max_depth(Some(0)).fit(&features, &labels),
            Err(ForestError::InvalidMaxDepth { .. })
        ));
        assert!(matches!(
            TreeConfig::new().with_min_samples_split(1).fit(&features, &labels),
            Err(ForestError::InvalidMinSamplesSplit { .. })
        ));
        assert!(matches!(
            TreeConfig::new().with_min_samples_leaf(0).fit(&features, &labels),
            Err(ForestError::InvalidMinSamplesLeaf { .. })
        ));
        assert!(matches!(
            TreeConfig::new().with_max_features(Some(3)).fit(&features, &labels),
            Err(ForestError::InvalidMaxFeatures { .. })
        ));
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        assert!(matches!(
            TreeConfig::new().fit(&[], &[]),
            Err(ForestError::EmptyDataset)
        ));
        assert!(matches!(
            TreeConfig::new().fit(&[vec![1.0], vec![2.0, 3.0]], &[0, 1]),
            Err(ForestError::FeatureCountMismatch { sample_index: 1, .. })
        ));
        assert!(matches!(
            TreeConfig::new().fit(&[vec![f64::NAN]], &[0]),
            Err(ForestError::NonFiniteValue { .. })
        ));
        assert!(matches!(
            TreeConfig::new().fit(&[vec![1.0]], &[0, 1]),
            Err(ForestError::LabelCountMismatch { .. })
        ));
    }

    #[test]
    fn wrong_prediction_width_is_rejected() {
        let (features, labels) = two_groups();
        let tree = TreeConfig::new().fit(&features, &labels).unwrap();
        assert!(matches!(
            tree.predict(&[1.0]),
            Err(ForestError::PredictionFeatureMismatch { expected: 2, got: 1 })
        ));
    }
}
