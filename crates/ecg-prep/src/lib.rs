//! Preprocessing for tabular classification: label encoding, per-feature
//! standardization fitted on a training partition, and a seeded stratified
//! train/test split.

mod encoder;
mod error;
mod scaler;
mod split;

pub use encoder::LabelEncoder;
pub use error::PrepError;
pub use scaler::StandardScaler;
pub use split::{TrainTestSplit, train_test_split};
