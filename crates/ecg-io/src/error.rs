//! I/O error types for ecg-io.

use std::path::PathBuf;

/// Errors from CSV parsing, result writing, and artifact persistence.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a labeled dataset has no label column.
    #[error("no \"{column}\" column in {path}; columns: {available:?}")]
    MissingLabelColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// Name of the expected label column.
        column: String,
        /// Header of the file.
        available: Vec<String>,
    },

    /// Returned when a feature cell is neither a number nor a missing marker,
    /// or when a numeric cell is required but missing.
    #[error("non-numeric value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NonNumeric {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Column name.
        column: String,
        /// The raw cell.
        raw: String,
    },

    /// Returned when a requested column is not in the table header.
    #[error("column \"{column}\" not found in {path}")]
    UnknownColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The requested column.
        column: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when encoding CSV output fails.
    #[error("cannot encode CSV for {path}")]
    CsvWrite {
        /// Destination path.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the number of predictions differs from the table's row count.
    #[error("{got} predictions for {expected} rows of {path}")]
    RowCountMismatch {
        /// Destination path.
        path: PathBuf,
        /// Rows in the source table.
        expected: usize,
        /// Predictions supplied.
        got: usize,
    },

    /// Returned when encoding the evaluation JSON fails.
    #[error("cannot encode JSON for {path}")]
    Json {
        /// Destination path.
        path: PathBuf,
        /// Underlying serde_json error.
        source: serde_json::Error,
    },

    /// Returned when an artifact file does not exist.
    #[error("{kind} artifact not found at {path}")]
    ArtifactNotFound {
        /// Which artifact was being loaded.
        kind: &'static str,
        /// Path that was attempted.
        path: PathBuf,
    },

    /// Returned when an artifact exists but cannot be read.
    #[error("cannot read artifact {path}")]
    ReadArtifact {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when bincode encoding of an artifact fails.
    #[error("cannot serialize {kind} artifact")]
    Serialize {
        /// Which artifact was being saved.
        kind: &'static str,
        /// Underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when an artifact file cannot be decoded.
    #[error("cannot deserialize artifact {path}")]
    Deserialize {
        /// Path to the artifact.
        path: PathBuf,
        /// Underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when an artifact was written by an incompatible format version.
    #[error("incompatible artifact format in {path}: expected version {expected}, found {found}")]
    IncompatibleVersion {
        /// Path to the artifact.
        path: PathBuf,
        /// Version this build reads.
        expected: u32,
        /// Version stored in the file.
        found: u32,
    },

    /// Returned when an artifact file holds a different kind of object.
    #[error("{path} holds a {found} artifact, expected {expected}")]
    WrongKind {
        /// Path to the artifact.
        path: PathBuf,
        /// Kind requested by the caller.
        expected: &'static str,
        /// Kind stored in the file.
        found: &'static str,
    },

    /// Returned when the three loaded artifacts do not belong together.
    #[error("artifacts in {dir} are inconsistent: {reason}")]
    IncompatibleArtifacts {
        /// Artifact directory.
        dir: PathBuf,
        /// What disagreed.
        reason: String,
    },
}
