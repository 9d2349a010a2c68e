//! Per-class classification report with macro and weighted averages.

use std::fmt;

use crate::confusion::{ClassMetrics, ConfusionMatrix};
use crate::error::ForestError;

/// Averaged precision, recall and F1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Named per-class metrics plus accuracy and averages for a held-out set.
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    class_names: Vec<String>,
    metrics: Vec<ClassMetrics>,
    accuracy: f64,
    support: usize,
}

impl ClassificationReport {
    /// Build a report from a confusion matrix and one name per class.
    ///
    /// # Errors
    ///
    /// [`ForestError::ClassNameMismatch`] when the name count is wrong.
    pub fn new(matrix: &ConfusionMatrix, class_names: &[String]) -> Result<Self, ForestError> {
        if class_names.len() != matrix.n_classes() {
            return Err(ForestError::ClassNameMismatch {
                n_names: class_names.len(),
                n_classes: matrix.n_classes(),
            });
        }
        Ok(Self {
            class_names: class_names.to_vec(),
            metrics: matrix.class_metrics(),
            accuracy: matrix.accuracy(),
            support: matrix.total(),
        })
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// `(class name, metrics)` pairs in class-code order.
    pub fn classes(&self) -> impl Iterator<Item = (&str, &ClassMetrics)> {
        self.class_names.iter().map(String::as_str).zip(&self.metrics)
    }

    /// Unweighted mean over classes.
    #[must_use]
    pub fn macro_avg(&self) -> AverageMetrics {
        let n = self.metrics.len().max(1) as f64;
        AverageMetrics {
            precision: self.metrics.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: self.metrics.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: self.metrics.iter().map(|m| m.f1).sum::<f64>() / n,
        }
    }

    /// Mean over classes weighted by support.
    #[must_use]
    pub fn weighted_avg(&self) -> AverageMetrics {
        let total = self.support.max(1) as f64;
        let weighted = |value: fn(&ClassMetrics) -> f64| {
            self.metrics
                .iter()
                .map(|m| value(m) * m.support as f64)
                .sum::<f64>()
                / total
        };
        AverageMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .class_names
            .iter()
            .map(|n| n.chars().count())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (name, m) in self.classes() {
            writeln!(
                f,
                "{name:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        let averages = [
            ("macro avg", self.macro_avg()),
            ("weighted avg", self.weighted_avg()),
        ];
        for (label, avg) in averages {
            writeln!(
                f,
                "{label:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}
