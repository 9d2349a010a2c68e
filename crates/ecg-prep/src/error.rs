//! Error types for preprocessing.

/// Errors from fitting and applying preprocessing transforms.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// Returned when fitting on zero samples.
    #[error("cannot fit on an empty dataset")]
    EmptyDataset,

    /// Returned when a label was not seen while fitting the encoder.
    #[error("unknown label \"{label}\"; known classes: {known:?}")]
    UnknownLabel {
        /// The unseen label.
        label: String,
        /// Classes known to the encoder.
        known: Vec<String>,
    },

    /// Returned when decoding a code the encoder never assigned.
    #[error("unknown class code {code}; encoder has {n_classes} classes")]
    UnknownCode {
        /// The code that was decoded.
        code: usize,
        /// Number of classes known to the encoder.
        n_classes: usize,
    },

    /// Returned when a row's width differs from the fitted width.
    #[error("row {row_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// Fitted width.
        expected: usize,
        /// Width of the offending row.
        got: usize,
        /// Zero-based row index.
        row_index: usize,
    },

    /// Returned when the number of feature names does not match the row width.
    #[error("{n_names} feature names for {n_features} feature columns")]
    FeatureNameMismatch {
        /// Number of names supplied.
        n_names: usize,
        /// Width of the rows.
        n_features: usize,
    },

    /// Returned when a value to fit on is NaN or infinite.
    #[error("non-finite value at row {row_index}, feature {feature_index}")]
    NonFiniteValue {
        /// Zero-based row index.
        row_index: usize,
        /// Zero-based column index.
        feature_index: usize,
    },

    /// Returned when the test fraction is not strictly between 0 and 1.
    #[error("test_size must be in (0.0, 1.0), got {test_size}")]
    InvalidTestSize {
        /// The rejected fraction.
        test_size: f64,
    },

    /// Returned when a class is too rare to appear in both partitions.
    #[error("class {class} has only {count} member(s); stratified splitting needs at least 2")]
    ClassTooSmall {
        /// Class code of the rare class.
        class: usize,
        /// Its number of members.
        count: usize,
    },

    /// Returned when a partition cannot hold one sample per class.
    #[error("{partition} partition of {size} rows cannot hold all {n_classes} classes")]
    PartitionTooSmall {
        /// `"train"` or `"test"`.
        partition: &'static str,
        /// Rows allotted to the partition.
        size: usize,
        /// Number of classes present.
        n_classes: usize,
    },
}
