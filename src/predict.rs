//! Prediction procedure: artifacts + new CSV -> CSV with `Prediction` and `Confidence`.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use ecg_io::{ArtifactBundle, ArtifactStore, CsvTable, PredictionWriter};
use tracing::{info, instrument};

use crate::error::PredictError;
use crate::layout::ProjectLayout;

/// Rows shown in the preview after a run.
pub const PREVIEW_ROWS: usize = 5;

/// Where a prediction run reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionPaths {
    pub models_dir: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl PredictionPaths {
    /// The fixed locations under a project root.
    #[must_use]
    pub fn from_layout(layout: &ProjectLayout) -> Self {
        Self {
            models_dir: layout.models_dir(),
            input: layout.prediction_input(),
            output: layout.prediction_output(),
        }
    }
}

/// Class name and confidence for one input row.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    /// Largest entry of `probabilities`.
    pub confidence: f64,
    /// One probability per encoder class, in code order.
    pub probabilities: Vec<f64>,
}

/// Loaded artifacts, built once and reused for every table scored.
#[derive(Debug, Clone)]
pub struct Predictor {
    models_dir: PathBuf,
    bundle: ArtifactBundle,
}

impl Predictor {
    /// Load and cross-check the model, scaler and encoder in `models_dir`.
    ///
    /// # Errors
    ///
    /// [`PredictError::MissingArtifact`] when a file is absent; other
    /// artifact problems surface as [`PredictError::Io`].
    #[instrument(skip_all, fields(dir = %models_dir.display()))]
    pub fn load(models_dir: &Path) -> Result<Self, PredictError> {
        let bundle = ArtifactStore::new(models_dir).load_bundle()?;
        Ok(Self::from_bundle(models_dir, bundle))
    }

    /// Wrap artifacts that are already in memory.
    pub fn from_bundle(models_dir: &Path, bundle: ArtifactBundle) -> Self {
        Self {
            models_dir: models_dir.to_path_buf(),
            bundle,
        }
    }

    #[must_use]
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Feature columns every input must contain, in model order.
    #[must_use]
    pub fn required_columns(&self) -> &[String] {
        self.bundle.required_columns()
    }

    #[must_use]
    pub fn classes(&self) -> &[String] {
        self.bundle.encoder.classes()
    }

    /// Score every row of `table`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PredictError::MissingColumns`] | a required column is absent |
    /// | [`PredictError::Io`] | a required cell is missing or non-numeric |
    /// | [`PredictError::Prep`] | a predicted code cannot be decoded |
    #[instrument(skip_all, fields(n_rows = table.n_rows()))]
    pub fn predict_table(&self, table: &CsvTable) -> Result<Vec<Prediction>, PredictError> {
        let required = self.required_columns();
        let missing = table.missing_columns(required);
        if !missing.is_empty() {
            return Err(PredictError::MissingColumns {
                required: required.to_vec(),
                missing,
            });
        }

        let raw = table.numeric_columns(required)?;
        let scaled = self.bundle.scaler.transform(&raw)?;
        let probabilities = self.bundle.forest.predict_proba_batch(&scaled)?;

        probabilities
            .into_iter()
            .map(|p| -> Result<Prediction, PredictError> {
                let label = self.bundle.encoder.decode(p.predicted_class())?.to_string();
                Ok(Prediction {
                    label,
                    confidence: p.confidence(),
                    probabilities: p.as_slice().to_vec(),
                })
            })
            .collect()
    }

    /// Read `input`, score it, and write the augmented table to `output`.
    ///
    /// The output file is not created unless every row was scored.
    ///
    /// # Errors
    ///
    /// [`PredictError::MissingInput`] when `input` does not exist, plus
    /// everything [`Predictor::predict_table`] returns.
    #[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
    pub fn run(&self, input: &Path, output: &Path) -> Result<PredictionRun, PredictError> {
        if !input.is_file() {
            return Err(PredictError::MissingInput {
                path: input.to_path_buf(),
            });
        }
        let table = CsvTable::read(input)?;
        let predictions = self.predict_table(&table)?;

        let rows: Vec<(String, f64)> = predictions
            .iter()
            .map(|p| (p.label.clone(), p.confidence))
            .collect();
        PredictionWriter::new(output).write(&table, &rows)?;
        info!(n_rows = predictions.len(), "prediction run complete");

        Ok(PredictionRun {
            output: output.to_path_buf(),
            feature_columns: self.required_columns().to_vec(),
            table,
            predictions,
        })
    }
}

/// A finished run: the input table, its predictions, and where they went.
#[derive(Debug, Clone)]
pub struct PredictionRun {
    pub output: PathBuf,
    pub feature_columns: Vec<String>,
    pub table: CsvTable,
    pub predictions: Vec<Prediction>,
}

impl PredictionRun {
    /// The first `n` rows restricted to feature, `Prediction` and
    /// `Confidence` columns.
    #[must_use]
    pub fn preview(&self, n: usize) -> Preview<'_> {
        Preview { run: self, n }
    }
}

/// Display adapter returned by [`PredictionRun::preview`].
pub struct Preview<'a> {
    run: &'a PredictionRun,
    n: usize,
}

impl fmt::Display for Preview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let run = self.run;
        let indices: Vec<Option<usize>> = run
            .feature_columns
            .iter()
            .map(|c| run.table.column_index(c))
            .collect();

        let mut header: Vec<String> = vec![String::new()];
        header.extend(run.feature_columns.iter().cloned());
        header.push("Prediction".to_string());
        header.push("Confidence".to_string());

        let mut grid = vec![header];
        let rows = run.table.records().iter().zip(&run.predictions).take(self.n);
        for (i, (record, pred)) in rows.enumerate() {
            let mut row = vec![i.to_string()];
            row.extend(
                indices
                    .iter()
                    .map(|idx| idx.map_or_else(String::new, |j| record[j].clone())),
            );
            row.push(pred.label.clone());
            row.push(format!("{:.6}", pred.confidence));
            grid.push(row);
        }

        let widths: Vec<usize> = (0..grid[0].len())
            .map(|c| grid.iter().map(|r| r[c].chars().count()).max().unwrap_or(0))
            .collect();
        for row in &grid {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, &w)| format!("{cell:>w$}"))
                .collect();
            writeln!(f, "{}", cells.join("  "))?;
        }
        Ok(())
    }
}

/// Run the prediction procedure against `paths`, writing progress and the
/// preview to `out`.
///
/// # Errors
///
/// Any [`PredictError`]; [`PredictError::Report`] when `out` fails.
pub fn run_prediction(
    paths: &PredictionPaths,
    out: &mut impl Write,
) -> Result<PredictionRun, PredictError> {
    let predictor = Predictor::load(&paths.models_dir)?;
    writeln!(out, "Loaded artifacts from: {}", paths.models_dir.display())
        .map_err(PredictError::Report)?;

    let run = predictor.run(&paths.input, &paths.output)?;
    writeln!(out, "Loaded {} rows from {}", run.table.n_rows(), paths.input.display())
        .map_err(PredictError::Report)?;
    writeln!(out, "Predictions saved to: {}", run.output.display()).map_err(PredictError::Report)?;
    writeln!(out, "\nFirst {PREVIEW_ROWS} predictions:\n{}", run.preview(PREVIEW_ROWS))
        .map_err(PredictError::Report)?;
    writeln!(out, "Done!").map_err(PredictError::Report)?;
    Ok(run)
}
