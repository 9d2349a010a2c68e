//! Pass-through CSV table for prediction input.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::IoError;
use crate::dataset::is_missing;

/// A CSV file kept as raw strings so every cell can be written back verbatim.
#[derive(Debug, Clone)]
pub struct CsvTable {
    path: PathBuf,
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl CsvTable {
    /// Read the whole file into memory.
    ///
    /// A header with zero data rows is a valid, empty table.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
    /// | [`IoError::CsvParse`] | Malformed CSV record |
    /// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read(path: &Path) -> Result<Self, IoError> {
        let file = std::fs::File::open(path).map_err(|e| IoError::FileNotFound {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let csv_error = |e: csv::Error| IoError::CsvParse {
            path: path.to_path_buf(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        };

        let headers: Vec<String> = rdr
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(csv_error)?;
            if record.len() != headers.len() {
                return Err(IoError::InconsistentRowLength {
                    path: path.to_path_buf(),
                    row_index,
                    expected: headers.len(),
                    got: record.len(),
                });
            }
            records.push(record.iter().map(str::to_string).collect());
        }

        info!(n_rows = records.len(), n_columns = headers.len(), "table loaded");
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            records,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.records.len()
    }

    /// Position of `name` in the header (whitespace around names is ignored).
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Entries of `required` absent from the header, in `required` order.
    #[must_use]
    pub fn missing_columns<S: AsRef<str>>(&self, required: &[S]) -> Vec<String> {
        required
            .iter()
            .map(|name| name.as_ref())
            .filter(|&name| self.column_index(name).is_none())
            .map(str::to_string)
            .collect()
    }

    /// Parse the named columns into row-major numbers, in `columns` order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::UnknownColumn`] | A name is not in the header |
    /// | [`IoError::NonNumeric`] | A cell is missing or not a finite number |
    pub fn numeric_columns<S: AsRef<str>>(&self, columns: &[S]) -> Result<Vec<Vec<f64>>, IoError> {
        let indices = columns
            .iter()
            .map(|name| {
                self.column_index(name.as_ref())
                    .ok_or_else(|| IoError::UnknownColumn {
                        path: self.path.clone(),
                        column: name.as_ref().to_string(),
                    })
            })
            .collect::<Result<Vec<usize>, IoError>>()?;

        self.records
            .iter()
            .enumerate()
            .map(|(row_index, record)| {
                indices
                    .iter()
                    .map(|&i| {
                        let raw = &record[i];
                        raw.trim()
                            .parse::<f64>()
                            .ok()
                            .filter(|v| v.is_finite() && !is_missing(raw))
                            .ok_or_else(|| IoError::NonNumeric {
                                path: self.path.clone(),
                                row_index,
                                column: self.headers[i].clone(),
                                raw: raw.clone(),
                            })
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn keeps_raw_cells() {
        let f = write_csv("id,x,note\nr1,1.50,hello world\nr2,2,\n");
        let table = CsvTable::read(f.path()).unwrap();
        assert_eq!(table.headers(), ["id", "x", "note"]);
        assert_eq!(table.records()[0], ["r1", "1.50", "hello world"]);
        assert_eq!(table.records()[1][2], "");
    }

    #[test]
    fn numeric_columns_follow_requested_order() {
        let f = write_csv("b,extra,a\n2,z,1\n4,z,3\n");
        let table = CsvTable::read(f.path()).unwrap();
        let rows = table.numeric_columns(&["a", "b"]).unwrap();
        assert_eq!(rows, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn reports_missing_columns() {
        let f = write_csv("a,c\n1,2\n");
        let table = CsvTable::read(f.path()).unwrap();
        assert_eq!(table.missing_columns(&["a", "b", "c", "d"]), ["b", "d"]);
        assert!(matches!(
            table.numeric_columns(&["b"]),
            Err(IoError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn missing_numeric_cell_rejected() {
        let f = write_csv("a\n1\nNA\n");
        let table = CsvTable::read(f.path()).unwrap();
        assert!(matches!(
            table.numeric_columns(&["a"]),
            Err(IoError::NonNumeric { row_index: 1, .. })
        ));
    }

    #[test]
    fn empty_table_is_allowed() {
        let f = write_csv("a,b\n");
        let table = CsvTable::read(f.path()).unwrap();
        assert_eq!(table.n_rows(), 0);
        assert!(table.numeric_columns(&["a"]).unwrap().is_empty());
    }

    #[test]
    fn error_file_not_found() {
        assert!(matches!(
            CsvTable::read(Path::new("/nonexistent/new.csv")),
            Err(IoError::FileNotFound { .. })
        ));
    }
}
