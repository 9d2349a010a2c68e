//! File I/O for the ECG classifier: labeled training CSVs, pass-through
//! prediction tables, the prediction CSV and evaluation JSON writers, and
//! the versioned bincode artifact store.

mod artifact;
mod dataset;
mod error;
mod table;
mod writer;

pub use artifact::{
    Artifact, ArtifactBundle, ArtifactKind, ArtifactStore, ENCODER_FILE, FORMAT_VERSION, MODEL_FILE,
    SCALER_FILE,
};
pub use dataset::{DatasetSummary, LabeledDataset, LabeledDatasetReader, is_missing};
pub use error::IoError;
pub use table::CsvTable;
pub use writer::{EVALUATION_FILE, EvaluationRecord, PredictionWriter, ResultWriter};
