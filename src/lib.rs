//! ECG feature-row classification.
//!
//! Two procedures share nothing but a directory layout: [`run_training`]
//! fits a label encoder, a standard scaler and a random forest on a labeled
//! CSV and persists them; [`run_prediction`] loads those artifacts through a
//! [`Predictor`] and writes a copy of a new CSV with `Prediction` and
//! `Confidence` columns.

mod error;
pub mod layout;
mod predict;
mod train;

pub use error::{PredictError, TrainError};
pub use layout::ProjectLayout;
pub use predict::{
    PREVIEW_ROWS, Prediction, PredictionPaths, PredictionRun, Predictor, Preview, run_prediction,
};
pub use train::{
    Evaluation, TrainedModel, TrainingConfig, TrainingOutcome, fit_dataset, run_training,
};
