//! Bootstrap-aggregated ensemble of CART trees.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::ForestConfig;
use crate::error::ForestError;
use crate::importance::{RankedFeature, rank_importances};
use crate::tree::{DecisionTree, TreeConfig, to_columns, validate_training_data};

/// A fitted random forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) feature_names: Vec<String>,
}

impl RandomForest {
    /// Return the fitted trees.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the width of the rows the forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the length of every probability vector the forest produces.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the training column names, in column order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Mean-decrease-in-impurity importances averaged over all trees,
    /// most important first.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<RankedFeature> {
        let per_tree: Vec<Vec<f64>> = self
            .trees
            .iter()
            .map(DecisionTree::feature_importances)
            .collect();
        rank_importances(&per_tree, &self.feature_names)
    }
}

/// Draw `n` indices uniformly with replacement.
fn bootstrap(n: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &ForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<RandomForest, ForestError> {
    let n_features = validate_training_data(features, labels)?;
    if feature_names.len() != n_features {
        return Err(ForestError::FeatureNameMismatch {
            n_names: feature_names.len(),
            n_features,
        });
    }

    let observed = labels.iter().max().map_or(1, |&m| m + 1);
    let n_classes = config.n_classes.unwrap_or(observed);
    if let Some(sample_index) = labels.iter().position(|&l| l >= n_classes) {
        return Err(ForestError::LabelOutOfRange {
            label: labels[sample_index],
            n_classes,
            sample_index,
        });
    }

    let max_features = config.max_features.resolve(n_features)?;
    let tree_config = TreeConfig::new()
        .with_criterion(config.criterion)
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(Some(max_features));
    tree_config.validate(n_features)?;

    let n_samples = features.len();
    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features,
        bootstrap = config.bootstrap,
        "training random forest"
    );

    let columns = to_columns(features, n_features);

    // One seed per tree, drawn up front, keeps the ensemble identical
    // regardless of how rayon schedules the trees.
    let mut master = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master.r#gen()).collect();

    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let samples = if config.bootstrap {
                bootstrap(n_samples, &mut rng)
            } else {
                (0..n_samples).collect()
            };
            tree_config
                .clone()
                .with_seed(rng.r#gen())
                .grow(&columns, labels, &samples, n_classes)
        })
        .collect();

    debug!(
        total_nodes = trees.iter().map(|t| t.nodes().len()).sum::<usize>(),
        "trees grown"
    );

    Ok(RandomForest {
        trees,
        n_features,
        n_classes,
        feature_names: feature_names.to_vec(),
    })
}
