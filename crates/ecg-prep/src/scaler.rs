//! Per-feature standardization to zero mean and unit variance.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::PrepError;

/// Per-column mean and scale learned from a training partition.
///
/// Uses the population standard deviation (divide by n). Columns whose
/// standard deviation is effectively zero get a scale of 1.0, so they are
/// centered but never divided by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    feature_names: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
    n_samples_seen: usize,
}

impl StandardScaler {
    /// Learn column statistics from row-major `rows`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::EmptyDataset`] | no rows |
    /// | [`PrepError::FeatureNameMismatch`] | names do not match the width |
    /// | [`PrepError::FeatureCountMismatch`] | ragged rows |
    /// | [`PrepError::NonFiniteValue`] | NaN or infinite cell |
    #[instrument(skip_all, fields(n_rows = rows.len()))]
    pub fn fit(rows: &[Vec<f64>], feature_names: &[String]) -> Result<Self, PrepError> {
        if rows.is_empty() {
            return Err(PrepError::EmptyDataset);
        }
        let n_features = feature_names.len();
        if rows[0].len() != n_features {
            return Err(PrepError::FeatureNameMismatch {
                n_names: n_features,
                n_features: rows[0].len(),
            });
        }

        let mut sums = vec![0.0f64; n_features];
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != n_features {
                return Err(PrepError::FeatureCountMismatch {
                    expected: n_features,
                    got: row.len(),
                    row_index,
                });
            }
            for (feature_index, (sum, &v)) in sums.iter_mut().zip(row).enumerate() {
                if !v.is_finite() {
                    return Err(PrepError::NonFiniteValue {
                        row_index,
                        feature_index,
                    });
                }
                *sum += v;
            }
        }

        let n = rows.len() as f64;
        let means: Vec<f64> = sums.into_iter().map(|s| s / n).collect();
        let mut squares = vec![0.0f64; n_features];
        for row in rows {
            for ((sq, &v), &mean) in squares.iter_mut().zip(row).zip(&means) {
                *sq += (v - mean).powi(2);
            }
        }
        let scales: Vec<f64> = squares
            .into_iter()
            .zip(&means)
            .map(|(sq, &mean)| {
                let std = (sq / n).sqrt();
                if std <= 10.0 * f64::EPSILON * mean.abs().max(1.0) { 1.0 } else { std }
            })
            .collect();

        debug!(?means, ?scales, "scaler fitted");

        Ok(Self {
            feature_names: feature_names.to_vec(),
            means,
            scales,
            n_samples_seen: rows.len(),
        })
    }

    /// Standardize one row with the fitted statistics.
    ///
    /// # Errors
    ///
    /// [`PrepError::FeatureCountMismatch`] when the row width is wrong
    /// (reported as row 0).
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, PrepError> {
        self.scale_row(row, 0)
    }

    /// Standardize every row with the fitted statistics. Never refits.
    ///
    /// # Errors
    ///
    /// [`PrepError::FeatureCountMismatch`] for the first row of the wrong width.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, PrepError> {
        rows.iter()
            .enumerate()
            .map(|(row_index, row)| self.scale_row(row, row_index))
            .collect()
    }

    fn scale_row(&self, row: &[f64], row_index: usize) -> Result<Vec<f64>, PrepError> {
        if row.len() != self.means.len() {
            return Err(PrepError::FeatureCountMismatch {
                expected: self.means.len(),
                got: row.len(),
                row_index,
            });
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(&v, (&mean, &scale))| (v - mean) / scale)
            .collect())
    }

    /// Column names the scaler was fitted on, in column order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Divisors applied after centering (standard deviation, or 1.0).
    #[must_use]
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    #[must_use]
    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("c{i}")).collect()
    }

    #[test]
    fn population_statistics() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0], vec![5.0, 10.0]];
        let scaler = StandardScaler::fit(&rows, &names(2)).unwrap();
        assert!((scaler.means()[0] - 3.0).abs() < 1e-12);
        assert!((scaler.scales()[0] - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(scaler.scales()[1], 1.0);
        assert_eq!(scaler.n_samples_seen(), 3);
    }

    #[test]
    fn transformed_training_rows_are_standardized() {
        let rows = vec![vec![60.0, 0.8], vec![75.0, 1.0], vec![90.0, 0.7], vec![110.0, 0.5]];
        let scaler = StandardScaler::fit(&rows, &names(2)).unwrap();
        let scaled = scaler.transform(&rows).unwrap();
        for col in 0..2 {
            let mean: f64 = scaled.iter().map(|r| r[col]).sum::<f64>() / 4.0;
            let var: f64 = scaled.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / 4.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_column_is_only_centered() {
        let rows = vec![vec![4.0], vec![4.0]];
        let scaler = StandardScaler::fit(&rows, &names(1)).unwrap();
        assert_eq!(scaler.transform_row(&[6.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn width_checked_on_transform() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0], vec![2.0, 3.0]], &names(2)).unwrap();
        assert!(matches!(
            scaler.transform(&[vec![1.0, 2.0], vec![1.0]]),
            Err(PrepError::FeatureCountMismatch { row_index: 1, expected: 2, got: 1 })
        ));
    }

    #[test]
    fn invalid_fit_inputs() {
        assert!(matches!(StandardScaler::fit(&[], &names(1)), Err(PrepError::EmptyDataset)));
        assert!(matches!(
            StandardScaler::fit(&[vec![1.0]], &names(2)),
            Err(PrepError::FeatureNameMismatch { .. })
        ));
        assert!(matches!(
            StandardScaler::fit(&[vec![f64::INFINITY]], &names(1)),
            Err(PrepError::NonFiniteValue { .. })
        ));
    }
}
