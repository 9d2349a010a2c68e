//! Builder for random forest training.

use crate::error::ForestError;
use crate::forest::RandomForest;
use crate::split::SplitCriterion;

/// How many features each split examines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`, at least 1.
    Sqrt,
    /// `floor(log2(n_features))`, at least 1.
    Log2,
    /// `floor(fraction * n_features)`, at least 1.
    Fraction(f64),
    /// An explicit count.
    Fixed(usize),
    /// Every feature.
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` columns.
    ///
    /// # Errors
    ///
    /// [`ForestError::InvalidMaxFeatures`] when the count falls outside
    /// `[1, n_features]`.
    pub fn resolve(self, n_features: usize) -> Result<usize, ForestError> {
        let n = n_features as f64;
        let resolved = match self {
            MaxFeatures::Sqrt => (n.sqrt().floor() as usize).max(1),
            MaxFeatures::Log2 => (n.log2().floor() as usize).max(1),
            MaxFeatures::Fraction(f) => ((n * f).floor() as usize).max(1),
            MaxFeatures::Fixed(k) => k,
            MaxFeatures::All => n_features,
        };
        if resolved == 0 || resolved > n_features {
            return Err(ForestError::InvalidMaxFeatures {
                max_features: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

/// Random forest hyperparameters.
///
/// Construct via [`ForestConfig::new`], then chain `with_*` methods.
///
/// | Parameter           | Default  |
/// |---------------------|----------|
/// | `max_features`      | `Sqrt`   |
/// | `max_depth`         | `None`   |
/// | `min_samples_split` | 2        |
/// | `min_samples_leaf`  | 1        |
/// | `criterion`         | `Gini`   |
/// | `bootstrap`         | `true`   |
/// | `n_classes`         | inferred |
/// | `seed`              | 42       |
#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) bootstrap: bool,
    pub(crate) n_classes: Option<usize>,
    pub(crate) seed: u64,
}

impl ForestConfig {
    /// Create a config for an ensemble of `n_trees` trees.
    ///
    /// # Errors
    ///
    /// [`ForestError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, ForestError> {
        if n_trees == 0 {
            return Err(ForestError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: SplitCriterion::Gini,
            bootstrap: true,
            n_classes: None,
            seed: 42,
        })
    }

    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// `None` grows every tree until its leaves are pure or too small.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// When `false`, every tree sees the full training set once.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Fix the width of the probability vectors.
    ///
    /// Without it the class count is `max(label) + 1`, which drops any
    /// trailing class absent from the training labels.
    #[must_use]
    pub fn with_n_classes(mut self, n_classes: Option<usize>) -> Self {
        self.n_classes = n_classes;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    #[must_use]
    pub fn bootstrap(&self) -> bool {
        self.bootstrap
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a forest.
    ///
    /// `features[sample][feature]` is row-major; `labels[sample]` is a
    /// zero-based class code; `feature_names` names each column and is
    /// stored on the fitted model.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`ForestError::EmptyDataset`] | no rows |
    /// | [`ForestError::ZeroFeatures`] | rows have no columns |
    /// | [`ForestError::LabelCountMismatch`] | row and label counts differ |
    /// | [`ForestError::FeatureCountMismatch`] | ragged rows |
    /// | [`ForestError::FeatureNameMismatch`] | names do not match the width |
    /// | [`ForestError::NonFiniteValue`] | NaN or infinite cell |
    /// | [`ForestError::LabelOutOfRange`] | label not below `n_classes` |
    /// | [`ForestError::InvalidMaxFeatures`] and other setting errors | bad hyperparameters |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        feature_names: &[String],
    ) -> Result<RandomForest, ForestError> {
        crate::forest::train(self, features, labels, feature_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_trees_rejected() {
        assert!(matches!(
            ForestConfig::new(0),
            Err(ForestError::InvalidTreeCount { n_trees: 0 })
        ));
    }

    #[test]
    fn max_features_resolution() {
        assert_eq!(MaxFeatures::Sqrt.resolve(5).unwrap(), 2);
        assert_eq!(MaxFeatures::Sqrt.resolve(9).unwrap(), 3);
        assert_eq!(MaxFeatures::Log2.resolve(1).unwrap(), 1);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(5).unwrap(), 2);
        assert_eq!(MaxFeatures::All.resolve(5).unwrap(), 5);
        assert!(MaxFeatures::Fixed(6).resolve(5).is_err());
        assert!(MaxFeatures::Fixed(0).resolve(5).is_err());
    }

    #[test]
    fn builder_records_settings() {
        let config = ForestConfig::new(200)
            .unwrap()
            .with_max_depth(Some(8))
            .with_min_samples_split(3)
            .with_criterion(SplitCriterion::Entropy)
            .with_bootstrap(false)
            .with_seed(7);
        assert_eq!(config.n_trees(), 200);
        assert_eq!(config.criterion(), SplitCriterion::Entropy);
        assert!(!config.bootstrap());
        assert_eq!(config.max_depth(), Some(8));
        assert_eq!(config.min_samples_split(), 3);
        assert_eq!(config.seed(), 7);
    }
}
