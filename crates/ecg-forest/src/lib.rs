//! Random forest classification for tabular feature rows.
//!
//! CART trees with Gini/Entropy impurity, bootstrap aggregation with
//! per-split feature subsampling, rayon-parallel fitting, averaged class
//! probabilities, MDI feature importances, and the evaluation metrics used
//! to report on a held-out partition (confusion matrix, per-class report,
//! text heatmap).

mod config;
mod confusion;
mod error;
mod forest;
mod importance;
mod node;
mod predict;
mod report;
mod split;
mod tree;

pub use config::{ForestConfig, MaxFeatures};
pub use confusion::{ClassMetrics, ConfusionMatrix, Heatmap};
pub use error::ForestError;
pub use forest::RandomForest;
pub use importance::RankedFeature;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use predict::Probabilities;
pub use report::{AverageMetrics, ClassificationReport};
pub use split::SplitCriterion;
pub use tree::{DecisionTree, TreeConfig};
