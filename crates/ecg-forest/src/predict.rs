//! Inference on a fitted forest.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::error::ForestError;
use crate::forest::RandomForest;

/// Index of the largest entry; the first one wins a tie.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Averaged class probabilities for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Probabilities {
    probs: Vec<f64>,
}

impl Probabilities {
    pub(crate) fn new(probs: Vec<f64>) -> Self {
        Self { probs }
    }

    /// Class code with the highest probability.
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        argmax(&self.probs)
    }

    /// Probability assigned to the predicted class.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.probs.get(self.predicted_class()).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }
}

impl RandomForest {
    /// Mean of the leaf probabilities reached in every tree.
    ///
    /// # Errors
    ///
    /// [`ForestError::PredictionFeatureMismatch`] when `sample` has the wrong width.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<Probabilities, ForestError> {
        if sample.len() != self.n_features {
            return Err(ForestError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut sum = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.leaf_proba(sample)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        sum.iter_mut().for_each(|v| *v /= n);
        Ok(Probabilities::new(sum))
    }

    /// Predicted class code for one sample.
    ///
    /// # Errors
    ///
    /// [`ForestError::PredictionFeatureMismatch`] when `sample` has the wrong width.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, ForestError> {
        Ok(self.predict_proba(sample)?.predicted_class())
    }

    /// Probabilities for every row, computed in parallel.
    ///
    /// # Errors
    ///
    /// The first [`ForestError::PredictionFeatureMismatch`] encountered.
    pub fn predict_proba_batch(
        &self,
        rows: &[Vec<f64>],
    ) -> Result<Vec<Probabilities>, ForestError> {
        rows.par_iter().map(|row| self.predict_proba(row)).collect()
    }

    /// Predicted class codes for every row, computed in parallel.
    ///
    /// # Errors
    ///
    /// The first [`ForestError::PredictionFeatureMismatch`] encountered.
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<usize>, ForestError> {
        rows.par_iter().map(|row| self.predict(row)).collect()
    }
}
