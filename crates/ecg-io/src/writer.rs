//! Prediction CSV writer and evaluation JSON writer.

use std::fs;
use std::path::{Path, PathBuf};

use ecg_forest::{AverageMetrics, ClassificationReport, RankedFeature};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::table::CsvTable;

/// File name of the evaluation summary written next to the artifacts.
pub const EVALUATION_FILE: &str = "evaluation.json";

const PREDICTION_COLUMN: &str = "Prediction";
const CONFIDENCE_COLUMN: &str = "Confidence";

/// Writes a [`CsvTable`] back out with `Prediction` and `Confidence` columns.
///
/// Original cells are copied verbatim. If the input already has either
/// column it is overwritten in place, otherwise both are appended. The full
/// output is encoded in memory before the destination file is touched.
pub struct PredictionWriter {
    path: PathBuf,
}

impl PredictionWriter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `table` plus one `(class name, confidence)` pair per row.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::RowCountMismatch`] | `predictions.len() != table.n_rows()` |
    /// | [`IoError::CsvWrite`] | CSV encoding failed |
    /// | [`IoError::OutputDirCreate`] | parent directory cannot be created |
    /// | [`IoError::WriteFile`] | file write failed |
    #[instrument(skip_all, fields(path = %self.path.display(), n_rows = table.n_rows()))]
    pub fn write(&self, table: &CsvTable, predictions: &[(String, f64)]) -> Result<(), IoError> {
        if predictions.len() != table.n_rows() {
            return Err(IoError::RowCountMismatch {
                path: self.path.clone(),
                expected: table.n_rows(),
                got: predictions.len(),
            });
        }

        let mut headers = table.headers().to_vec();
        let prediction_col = column_slot(&mut headers, PREDICTION_COLUMN);
        let confidence_col = column_slot(&mut headers, CONFIDENCE_COLUMN);

        let csv_error = |e: csv::Error| IoError::CsvWrite {
            path: self.path.clone(),
            source: e,
        };
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(&headers).map_err(csv_error)?;
        for (record, (class, confidence)) in table.records().iter().zip(predictions) {
            let mut row = record.clone();
            row.resize(headers.len(), String::new());
            row[prediction_col] = class.clone();
            row[confidence_col] = format!("{confidence:?}");
            wtr.write_record(&row).map_err(csv_error)?;
        }
        let bytes = wtr.into_inner().map_err(|e| IoError::WriteFile {
            path: self.path.clone(),
            source: e.into_error(),
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| IoError::OutputDirCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(&self.path, &bytes).map_err(|e| IoError::WriteFile {
            path: self.path.clone(),
            source: e,
        })?;

        info!(size_bytes = bytes.len(), "predictions written");
        Ok(())
    }
}

/// Index of `name` in `headers`, appending it when absent.
fn column_slot(headers: &mut Vec<String>, name: &str) -> usize {
    match headers.iter().position(|h| h.trim() == name) {
        Some(i) => i,
        None => {
            headers.push(name.to_string());
            headers.len() - 1
        }
    }
}

/// Everything recorded about a held-out evaluation.
pub struct EvaluationRecord<'a> {
    pub seed: u64,
    pub n_train: usize,
    pub n_test: usize,
    pub feature_names: &'a [String],
    pub report: &'a ClassificationReport,
    pub confusion_matrix: &'a [Vec<usize>],
    pub feature_importances: &'a [RankedFeature],
}

/// Writes JSON results into an output directory.
///
/// Creates the output directory on construction if it does not exist.
pub struct ResultWriter {
    output_dir: PathBuf,
}

impl ResultWriter {
    /// Create a new writer targeting `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display()))]
    pub fn new(output_dir: &Path) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Write an evaluation summary to [`EVALUATION_FILE`] and return its path.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Json`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | file write failed |
    #[instrument(skip_all)]
    pub fn write_evaluation(&self, record: &EvaluationRecord<'_>) -> Result<PathBuf, IoError> {
        let path = self.output_dir.join(EVALUATION_FILE);

        let class_metrics: Vec<ClassEntry<'_>> = record
            .report
            .classes()
            .map(|(name, m)| ClassEntry {
                class: name,
                precision: m.precision,
                recall: m.recall,
                f1: m.f1,
                support: m.support,
            })
            .collect();
        let class_names: Vec<&str> = class_metrics.iter().map(|c| c.class).collect();

        let artifact = EvaluationArtifact {
            seed: record.seed,
            n_train: record.n_train,
            n_test: record.n_test,
            accuracy: record.report.accuracy(),
            feature_names: record.feature_names,
            class_names,
            confusion_matrix: record.confusion_matrix,
            class_metrics,
            macro_avg: record.report.macro_avg().into(),
            weighted_avg: record.report.weighted_avg().into(),
            feature_importances: record.feature_importances,
        };

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::Json {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "evaluation result written");
        Ok(path)
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct EvaluationArtifact<'a> {
    seed: u64,
    n_train: usize,
    n_test: usize,
    accuracy: f64,
    feature_names: &'a [String],
    class_names: Vec<&'a str>,
    confusion_matrix: &'a [Vec<usize>],
    class_metrics: Vec<ClassEntry<'a>>,
    macro_avg: AverageEntry,
    weighted_avg: AverageEntry,
    feature_importances: &'a [RankedFeature],
}

#[derive(Serialize)]
struct ClassEntry<'a> {
    class: &'a str,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}

#[derive(Serialize)]
struct AverageEntry {
    precision: f64,
    recall: f64,
    f1: f64,
}

impl From<AverageMetrics> for AverageEntry {
    fn from(m: AverageMetrics) -> Self {
        Self {
            precision: m.precision,
            recall: m.recall,
            f1: m.f1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecg_forest::ConfusionMatrix;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn table(content: &str) -> (NamedTempFile, CsvTable) {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        let t = CsvTable::read(f.path()).unwrap();
        (f, t)
    }

    fn read_back(path: &Path) -> Vec<Vec<String>> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(false).from_path(path).unwrap();
        rdr.records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn appends_prediction_columns() {
        let (_f, t) = table("id,x\nr1,1.50\nr2,\"a,b\"\n");
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.csv");
        PredictionWriter::new(&out)
            .write(&t, &[("Normal".into(), 0.9), ("Abnormal".into(), 0.55)])
            .unwrap();

        let rows = read_back(&out);
        assert_eq!(rows[0], ["id", "x", "Prediction", "Confidence"]);
        assert_eq!(rows[1], ["r1", "1.50", "Normal", "0.9"]);
        assert_eq!(rows[2], ["r2", "a,b", "Abnormal", "0.55"]);
    }

    #[test]
    fn existing_prediction_column_is_replaced() {
        let (_f, t) = table("x,Prediction\n1,old\n");
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.csv");
        PredictionWriter::new(&out).write(&t, &[("new".into(), 1.0)]).unwrap();
        let rows = read_back(&out);
        assert_eq!(rows[0], ["x", "Prediction", "Confidence"]);
        assert_eq!(rows[1], ["1", "new", "1.0"]);
    }

    #[test]
    fn overwrites_existing_file() {
        let (_f, t) = table("x\n1\n");
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.csv");
        fs::write(&out, "stale contents that are longer than the new file\n").unwrap();
        PredictionWriter::new(&out).write(&t, &[("a".into(), 0.5)]).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "x,Prediction,Confidence\n1,a,0.5\n");
    }

    #[test]
    fn row_count_mismatch_writes_nothing() {
        let (_f, t) = table("x\n1\n2\n");
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.csv");
        let err = PredictionWriter::new(&out).write(&t, &[("a".into(), 0.5)]).unwrap_err();
        assert!(matches!(err, IoError::RowCountMismatch { expected: 2, got: 1, .. }));
        assert!(!out.exists());
    }

    #[test]
    fn evaluation_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(&dir.path().join("models")).unwrap();

        let cm = ConfusionMatrix::from_labels(&[0, 0, 1, 1], &[0, 1, 1, 1], 2).unwrap();
        let names = vec!["Abnormal".to_string(), "Normal".to_string()];
        let report = ClassificationReport::new(&cm, &names).unwrap();
        let features = vec!["Heart_Rate".to_string()];
        let importances = vec![RankedFeature {
            name: "Heart_Rate".into(),
            importance: 1.0,
            rank: 1,
        }];

        let path = writer
            .write_evaluation(&EvaluationRecord {
                seed: 42,
                n_train: 16,
                n_test: 4,
                feature_names: &features,
                report: &report,
                confusion_matrix: cm.as_rows(),
                feature_importances: &importances,
            })
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["accuracy"], 0.75);
        assert_eq!(json["class_names"][1], "Normal");
        assert_eq!(json["confusion_matrix"][0][1], 1);
        assert_eq!(json["class_metrics"][1]["support"], 2);
        assert_eq!(json["feature_importances"][0]["rank"], 1);
    }
}
