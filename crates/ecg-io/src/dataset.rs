//! Labeled training dataset reader.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;

/// Cell literals treated as missing values.
const MISSING_MARKERS: [&str; 5] = ["", "NA", "NaN", "nan", "null"];

/// Number of leading rows kept for the dataset summary.
const SAMPLE_ROWS: usize = 5;

/// Whether a raw cell counts as a missing value.
#[must_use]
pub fn is_missing(raw: &str) -> bool {
    MISSING_MARKERS.contains(&raw.trim())
}

/// A labeled table split into numeric feature columns and a label column.
///
/// Missing feature cells are stored as `NaN` and counted per column;
/// nothing is imputed or dropped.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    /// Source file.
    pub path: PathBuf,
    /// Every header column in file order, label included.
    pub columns: Vec<String>,
    /// Feature column names in file order.
    pub feature_names: Vec<String>,
    /// Row-major feature values.
    pub features: Vec<Vec<f64>>,
    /// Raw label cell per row.
    pub labels: Vec<String>,
    /// Missing-value count per entry of `columns`.
    pub missing_counts: Vec<usize>,
    /// Raw cells of the first rows, for display.
    pub sample: Vec<Vec<String>>,
}

impl LabeledDataset {
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    /// `(rows, columns)` counting the label column.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.columns.len())
    }

    /// Columns with at least one missing cell, with their counts.
    pub fn columns_with_missing(&self) -> impl Iterator<Item = (&str, usize)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.missing_counts.iter().copied())
            .filter(|&(_, n)| n > 0)
    }

    /// Printable overview: shape, columns, leading rows, missing counts.
    #[must_use]
    pub fn summary(&self) -> DatasetSummary<'_> {
        DatasetSummary { dataset: self }
    }
}

/// Display adapter returned by [`LabeledDataset::summary`].
pub struct DatasetSummary<'a> {
    dataset: &'a LabeledDataset,
}

impl fmt::Display for DatasetSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ds = self.dataset;
        let (rows, cols) = ds.shape();
        writeln!(f, "Dataset shape: ({rows}, {cols})")?;
        writeln!(f, "Columns: {}", ds.columns.join(", "))?;

        let widths: Vec<usize> = ds
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                ds.sample
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(String::len)
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        writeln!(f, "First {} rows:", ds.sample.len())?;
        let header: Vec<String> = ds
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:>w$}"))
            .collect();
        writeln!(f, "  {}", header.join("  "))?;
        for row in &ds.sample {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{c:>w$}"))
                .collect();
            writeln!(f, "  {}", cells.join("  "))?;
        }

        writeln!(f, "Missing values per column:")?;
        for (name, count) in ds.columns.iter().zip(&ds.missing_counts) {
            writeln!(f, "  {name}: {count}")?;
        }
        Ok(())
    }
}

/// Reads a CSV with a header row and one categorical label column.
///
/// Every column other than the label column is a numeric feature.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingLabelColumn`] | Header lacks the label column |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonNumeric`] | Feature cell is neither a number nor a missing marker |
pub struct LabeledDatasetReader {
    path: PathBuf,
    label_column: String,
}

impl LabeledDatasetReader {
    /// Reader for `path` with label column `Label`.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            label_column: "Label".to_string(),
        }
    }

    #[must_use]
    pub fn with_label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = column.into();
        self
    }

    /// Read and validate the CSV file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<LabeledDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so ragged rows surface as InconsistentRowLength
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let columns: Vec<String> = rdr
            .headers()
            .map_err(|e| IoError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let label_index = columns
            .iter()
            .position(|c| *c == self.label_column)
            .ok_or_else(|| IoError::MissingLabelColumn {
                path: self.path.clone(),
                column: self.label_column.clone(),
                available: columns.clone(),
            })?;
        let feature_names: Vec<String> = columns
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != label_index)
            .map(|(_, c)| c.clone())
            .collect();
        debug!(n_columns = columns.len(), label_index, "read CSV header");

        let mut features = Vec::new();
        let mut labels = Vec::new();
        let mut missing_counts = vec![0usize; columns.len()];
        let mut sample = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| IoError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;
            if record.len() != columns.len() {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: columns.len(),
                    got: record.len(),
                });
            }
            if sample.len() < SAMPLE_ROWS {
                sample.push(record.iter().map(str::to_string).collect());
            }

            let mut row = Vec::with_capacity(feature_names.len());
            for (col_index, raw) in record.iter().enumerate() {
                if is_missing(raw) {
                    missing_counts[col_index] += 1;
                }
                if col_index == label_index {
                    labels.push(raw.trim().to_string());
                    continue;
                }
                let value = if is_missing(raw) {
                    f64::NAN
                } else {
                    raw.trim().parse::<f64>().map_err(|_| IoError::NonNumeric {
                        path: self.path.clone(),
                        row_index,
                        column: columns[col_index].clone(),
                        raw: raw.to_string(),
                    })?
                };
                row.push(value);
            }
            features.push(row);
        }

        if labels.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_rows = labels.len(),
            n_features = feature_names.len(),
            n_missing = missing_counts.iter().sum::<usize>(),
            "labeled dataset loaded"
        );

        Ok(LabeledDataset {
            path: self.path.clone(),
            columns,
            feature_names,
            features,
            labels,
            missing_counts,
            sample,
        })
    }
}
