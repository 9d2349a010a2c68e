//! Training procedure: dataset -> split -> scaler -> forest -> evaluation -> artifacts.

use std::io::Write;
use std::path::{Path, PathBuf};

use ecg_forest::{
    ClassificationReport, ConfusionMatrix, ForestConfig, Heatmap, RankedFeature, SplitCriterion,
};
use ecg_io::{
    ArtifactBundle, ArtifactStore, EvaluationRecord, LabeledDataset, LabeledDatasetReader,
    ResultWriter,
};
use ecg_prep::{LabelEncoder, StandardScaler, train_test_split};
use tracing::{info, instrument};

use crate::error::TrainError;

/// Settings for one training run.
///
/// | Parameter           | Default                        |
/// |---------------------|--------------------------------|
/// | `label_column`      | `Label`                        |
/// | `test_size`         | 0.2                            |
/// | `seed`              | 42 (split and forest)          |
/// | `n_trees`           | 200                            |
/// | `max_depth`         | `Some(8)`                      |
/// | `min_samples_split` | 3                              |
/// | `criterion`         | `Gini`                         |
/// | `bootstrap`         | `true`                         |
/// | `write_evaluation`  | `true`                         |
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    data_path: PathBuf,
    models_dir: PathBuf,
    label_column: String,
    test_size: f64,
    seed: u64,
    n_trees: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    criterion: SplitCriterion,
    bootstrap: bool,
    write_evaluation: bool,
}

impl TrainingConfig {
    pub fn new(data_path: impl Into<PathBuf>, models_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            models_dir: models_dir.into(),
            label_column: "Label".to_string(),
            test_size: 0.2,
            seed: 42,
            n_trees: 200,
            max_depth: Some(8),
            min_samples_split: 3,
            criterion: SplitCriterion::Gini,
            bootstrap: true,
            write_evaluation: true,
        }
    }

    #[must_use]
    pub fn with_label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = column.into();
        self
    }

    #[must_use]
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// When `false`, every tree is grown on the whole training partition.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Skip `evaluation.json`; the three artifacts are always written.
    #[must_use]
    pub fn with_write_evaluation(mut self, write_evaluation: bool) -> Self {
        self.write_evaluation = write_evaluation;
        self
    }

    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    #[must_use]
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn forest_config(&self, n_classes: usize) -> Result<ForestConfig, TrainError> {
        Ok(ForestConfig::new(self.n_trees)?
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_criterion(self.criterion)
            .with_bootstrap(self.bootstrap)
            .with_n_classes(Some(n_classes))
            .with_seed(self.seed))
    }
}

/// Held-out evaluation of a freshly fitted forest.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub n_train: usize,
    pub n_test: usize,
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
    pub importances: Vec<RankedFeature>,
}

impl Evaluation {
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.report.accuracy()
    }
}

/// Fitted artifacts plus their evaluation, not yet persisted.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub bundle: ArtifactBundle,
    pub evaluation: Evaluation,
}

/// Result of [`run_training`].
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: TrainedModel,
    /// Model, scaler and encoder files, in that order.
    pub artifact_paths: Vec<PathBuf>,
    pub evaluation_path: Option<PathBuf>,
}

/// Fit encoder, scaler and forest on `dataset` and evaluate on a held-out split.
///
/// The scaler only sees the training partition. Nothing touches the disk.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`TrainError::NoFeatures`] | only a label column |
/// | [`TrainError::MissingValues`] | any missing cell |
/// | [`TrainError::Prep`] | split cannot be stratified |
/// | [`TrainError::Forest`] | invalid hyperparameters |
#[instrument(skip_all, fields(n_rows = dataset.n_rows(), seed = config.seed))]
pub fn fit_dataset(
    dataset: &LabeledDataset,
    config: &TrainingConfig,
) -> Result<TrainedModel, TrainError> {
    if dataset.feature_names.is_empty() {
        return Err(TrainError::NoFeatures {
            path: dataset.path.clone(),
        });
    }
    if let Some((column, count)) = dataset.columns_with_missing().next() {
        return Err(TrainError::MissingValues {
            column: column.to_string(),
            count,
        });
    }

    let (encoder, codes) = LabelEncoder::fit_transform(&dataset.labels)?;
    let split = train_test_split(&codes, config.test_size, config.seed)?;
    let (train_x, test_x) = split.select(&dataset.features);
    let (train_y, test_y) = split.select(&codes);
    info!(
        n_train = train_y.len(),
        n_test = test_y.len(),
        classes = ?encoder.classes(),
        "dataset split"
    );

    let scaler = StandardScaler::fit(&train_x, &dataset.feature_names)?;
    let train_scaled = scaler.transform(&train_x)?;
    let test_scaled = scaler.transform(&test_x)?;

    let forest = config.forest_config(encoder.n_classes())?.fit(
        &train_scaled,
        &train_y,
        &dataset.feature_names,
    )?;

    let predicted = forest.predict_batch(&test_scaled)?;
    let confusion = ConfusionMatrix::from_labels(&test_y, &predicted, encoder.n_classes())?;
    let report = ClassificationReport::new(&confusion, encoder.classes())?;
    info!(accuracy = report.accuracy(), "held-out evaluation");

    let evaluation = Evaluation {
        n_train: train_y.len(),
        n_test: test_y.len(),
        confusion,
        report,
        importances: forest.feature_importances(),
    };
    Ok(TrainedModel {
        bundle: ArtifactBundle {
            forest,
            scaler,
            encoder,
        },
        evaluation,
    })
}

/// Run the whole training procedure, writing human-readable output to `out`.
///
/// Artifacts are written only after fitting and evaluation succeed.
///
/// # Errors
///
/// Any [`TrainError`]; [`TrainError::Report`] when `out` fails.
#[instrument(skip_all, fields(data = %config.data_path.display()))]
pub fn run_training(
    config: &TrainingConfig,
    out: &mut impl Write,
) -> Result<TrainingOutcome, TrainError> {
    let dataset = LabeledDatasetReader::new(&config.data_path)
        .with_label_column(config.label_column.clone())
        .read()?;
    writeln!(out, "Dataset loaded from {}", dataset.path.display()).map_err(TrainError::Report)?;
    write!(out, "{}", dataset.summary()).map_err(TrainError::Report)?;

    let model = fit_dataset(&dataset, config)?;
    let heatmap = model
        .evaluation
        .confusion
        .heatmap(model.bundle.encoder.classes())?;
    write_evaluation_report(&model.evaluation, &heatmap, out).map_err(TrainError::Report)?;

    let store = ArtifactStore::new(&config.models_dir);
    let artifact_paths = store.save_bundle(&model.bundle)?;

    let evaluation_path = if config.write_evaluation {
        let eval = &model.evaluation;
        let record = EvaluationRecord {
            seed: config.seed,
            n_train: eval.n_train,
            n_test: eval.n_test,
            feature_names: &dataset.feature_names,
            report: &eval.report,
            confusion_matrix: eval.confusion.as_rows(),
            feature_importances: &eval.importances,
        };
        Some(ResultWriter::new(&config.models_dir)?.write_evaluation(&record)?)
    } else {
        None
    };

    writeln!(
        out,
        "\nModel, scaler, and encoder saved in: {}",
        config.models_dir.display()
    )
    .map_err(TrainError::Report)?;
    info!(n_artifacts = artifact_paths.len(), "training complete");

    Ok(TrainingOutcome {
        model,
        artifact_paths,
        evaluation_path,
    })
}

fn write_evaluation_report(
    eval: &Evaluation,
    heatmap: &Heatmap<'_>,
    out: &mut impl Write,
) -> std::io::Result<()> {
    let accuracy_pct = (eval.accuracy() * 10_000.0).round() / 100.0;
    writeln!(out, "\nModel training completed")?;
    writeln!(out, "Accuracy: {accuracy_pct} %")?;
    writeln!(out, "\nClassification Report:\n{}", eval.report)?;
    writeln!(out, "{heatmap}")?;

    writeln!(out, "Feature importances:")?;
    for f in &eval.importances {
        writeln!(out, "  {:>2}. {:<16} {:.4}", f.rank, f.name, f.importance)?;
    }
    Ok(())
}
