/// Errors from fitting, predicting, and scoring a forest.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The rejected value.
        n_trees: usize,
    },

    /// Returned when max_depth is `Some(0)`.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The rejected value.
        max_depth: usize,
    },

    /// Returned when min_samples_split is below 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The rejected value.
        min_samples_split: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The rejected value.
        min_samples_leaf: usize,
    },

    /// Returned when max_features resolves outside `[1, n_features]`.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved value.
        max_features: usize,
        /// Feature count of the training data.
        n_features: usize,
    },

    /// Returned when the training data has no rows.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training rows have no columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when the feature matrix and label vector disagree in length.
    #[error("{n_rows} feature rows but {n_labels} labels")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_rows: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when the number of feature names does not match the row width.
    #[error("{n_names} feature names for {n_features} feature columns")]
    FeatureNameMismatch {
        /// Number of names supplied.
        n_names: usize,
        /// Width of the feature rows.
        n_features: usize,
    },

    /// Returned when a training row is wider or narrower than the first row.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        got: usize,
        /// Zero-based index of the offending row.
        sample_index: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// Zero-based row index.
        sample_index: usize,
        /// Zero-based column index.
        feature_index: usize,
    },

    /// Returned when a class code is not below the declared class count.
    #[error("label {label} at sample {sample_index} is out of range for {n_classes} classes")]
    LabelOutOfRange {
        /// The offending code.
        label: usize,
        /// Declared number of classes.
        n_classes: usize,
        /// Zero-based row index.
        sample_index: usize,
    },

    /// Returned when a prediction input has the wrong width.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// Width the forest was trained on.
        expected: usize,
        /// Width of the prediction input.
        got: usize,
    },

    /// Returned when truth and prediction vectors differ in length.
    #[error("{n_true} true labels but {n_predicted} predictions")]
    PredictionCountMismatch {
        /// Number of true labels.
        n_true: usize,
        /// Number of predicted labels.
        n_predicted: usize,
    },

    /// Returned when the number of class names does not match the class count.
    #[error("{n_names} class names for {n_classes} classes")]
    ClassNameMismatch {
        /// Number of names supplied.
        n_names: usize,
        /// Number of classes in the matrix.
        n_classes: usize,
    },
}
