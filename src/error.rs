//! Error types for the training and prediction procedures.

use std::path::PathBuf;

use ecg_forest::ForestError;
use ecg_io::IoError;
use ecg_prep::PrepError;

/// Errors from the training procedure.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    /// Returned when the dataset contains missing cells. Nothing is imputed.
    #[error("column \"{column}\" has {count} missing value(s); clean the dataset before training")]
    MissingValues {
        /// First column with missing cells.
        column: String,
        /// Number of missing cells in it.
        count: usize,
    },

    /// Returned when the training dataset has no feature columns.
    #[error("dataset {path} has no feature columns besides the label")]
    NoFeatures {
        /// Path to the dataset.
        path: PathBuf,
    },

    /// Reading the dataset or writing artifacts failed.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Encoding, splitting or scaling failed.
    #[error(transparent)]
    Prep(#[from] PrepError),

    /// The forest could not be configured, fitted or evaluated.
    #[error(transparent)]
    Forest(#[from] ForestError),

    /// Returned when the human-readable report cannot be written.
    #[error("cannot write training report")]
    Report(#[source] std::io::Error),
}

/// Errors from the prediction procedure.
///
/// | Variant | Condition |
/// |---|---|
/// | [`PredictError::MissingArtifact`] | model, scaler or encoder file absent |
/// | [`PredictError::MissingInput`] | prediction input CSV absent |
/// | [`PredictError::MissingColumns`] | input lacks required feature columns |
/// | others | malformed input, incompatible artifacts, write failures |
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    /// Returned when one of the three artifact files does not exist.
    #[error("{kind} artifact not found: {path}")]
    MissingArtifact {
        /// `"model"`, `"scaler"` or `"encoder"`.
        kind: &'static str,
        /// Path that was attempted.
        path: PathBuf,
    },

    /// Returned when the input CSV does not exist.
    #[error("input file not found: {path}")]
    MissingInput {
        /// Path that was attempted.
        path: PathBuf,
    },

    /// Returned when the input lacks one or more required feature columns.
    #[error("input CSV must contain columns {required:?}; missing {missing:?}")]
    MissingColumns {
        /// Every column the model needs, in model order.
        required: Vec<String>,
        /// The absent ones.
        missing: Vec<String>,
    },

    /// Malformed input, incompatible artifacts, or a failed write.
    #[error(transparent)]
    Io(IoError),

    /// Scaling failed or a predicted code has no class name.
    #[error(transparent)]
    Prep(#[from] PrepError),

    /// The forest rejected the scaled rows.
    #[error(transparent)]
    Forest(#[from] ForestError),

    /// Returned when the preview cannot be written.
    #[error("cannot write prediction report")]
    Report(#[source] std::io::Error),
}

impl PredictError {
    /// Remediation shown under the error message, where one exists.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingArtifact { .. } => Some("run `ecg train` first"),
            Self::MissingInput { .. } => {
                Some("place the CSV to score at the input path or pass --input")
            }
            _ => None,
        }
    }
}

impl From<IoError> for PredictError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::ArtifactNotFound { kind, path } => Self::MissingArtifact { kind, path },
            other => Self::Io(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_maps_from_io_and_has_hint() {
        let err = PredictError::from(IoError::ArtifactNotFound {
            kind: "scaler",
            path: PathBuf::from("models/scaler.bin"),
        });
        assert!(matches!(err, PredictError::MissingArtifact { kind: "scaler", .. }));
        assert_eq!(err.hint(), Some("run `ecg train` first"));
    }

    #[test]
    fn other_io_errors_pass_through() {
        let err = PredictError::from(IoError::EmptyDataset {
            path: PathBuf::from("x.csv"),
        });
        assert!(matches!(err, PredictError::Io(_)));
        assert_eq!(err.hint(), None);
    }

    #[test]
    fn missing_columns_message_lists_both_sets() {
        let err = PredictError::MissingColumns {
            required: vec!["Heart_Rate".into(), "RR_Mean".into()],
            missing: vec!["RR_Mean".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Heart_Rate"));
        assert!(msg.contains("missing [\"RR_Mean\"]"));
    }
}
