//! Confusion matrix, per-class metrics, and a text heatmap rendering.

use std::fmt;

use crate::error::ForestError;

/// Counts of `(true class, predicted class)` pairs.
///
/// `rows[t][p]` is the number of samples of class `t` predicted as `p`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    rows: Vec<Vec<usize>>,
}

/// Precision, recall, F1 and support of one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub class: usize,
    /// `TP / (TP + FP)`, 0 when the class was never predicted.
    pub precision: f64,
    /// `TP / (TP + FN)`, 0 when the class has no true samples.
    pub recall: f64,
    /// Harmonic mean of precision and recall, 0 when both are 0.
    pub f1: f64,
    /// Number of true samples of the class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Tally true against predicted class codes.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::EmptyDataset`] | no labels |
    /// | [`ForestError::PredictionCountMismatch`] | vectors differ in length |
    /// | [`ForestError::LabelOutOfRange`] | a code is not below `n_classes` |
    pub fn from_labels(
        true_labels: &[usize],
        predicted: &[usize],
        n_classes: usize,
    ) -> Result<Self, ForestError> {
        if true_labels.is_empty() {
            return Err(ForestError::EmptyDataset);
        }
        if true_labels.len() != predicted.len() {
            return Err(ForestError::PredictionCountMismatch {
                n_true: true_labels.len(),
                n_predicted: predicted.len(),
            });
        }
        let mut rows = vec![vec![0usize; n_classes]; n_classes];
        for (sample_index, (&t, &p)) in true_labels.iter().zip(predicted).enumerate() {
            if t >= n_classes || p >= n_classes {
                return Err(ForestError::LabelOutOfRange {
                    label: t.max(p),
                    n_classes,
                    sample_index,
                });
            }
            rows[t][p] += 1;
        }
        Ok(Self { rows })
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.rows.len()
    }

    /// Total number of samples tallied.
    #[must_use]
    pub fn total(&self) -> usize {
        self.rows.iter().flatten().sum()
    }

    /// Fraction of samples on the diagonal.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.n_classes()).map(|i| self.rows[i][i]).sum();
        correct as f64 / total as f64
    }

    /// Metrics for every class, in class-code order.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        (0..self.n_classes())
            .map(|c| {
                let tp = self.rows[c][c];
                let predicted: usize = self.rows.iter().map(|row| row[c]).sum();
                let support: usize = self.rows[c].iter().sum();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    class: c,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    /// Labeled heatmap view of the matrix for terminal output.
    ///
    /// # Errors
    ///
    /// [`ForestError::ClassNameMismatch`] when `class_names` does not have
    /// one entry per class.
    pub fn heatmap<'a>(&'a self, class_names: &'a [String]) -> Result<Heatmap<'a>, ForestError> {
        if class_names.len() != self.n_classes() {
            return Err(ForestError::ClassNameMismatch {
                n_names: class_names.len(),
                n_classes: self.n_classes(),
            });
        }
        Ok(Heatmap {
            matrix: self,
            class_names,
        })
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            writeln!(f, "[{}]", cells.join(" "))?;
        }
        Ok(())
    }
}

/// Shades from empty to full, indexed by a cell's share of the largest count.
const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];

/// Confusion matrix rendered as a shaded, annotated grid.
///
/// Rows are actual classes, columns predicted classes. Each cell shows a
/// shade proportional to its count relative to the largest cell, followed
/// by the count itself.
#[derive(Debug, Clone, Copy)]
pub struct Heatmap<'a> {
    matrix: &'a ConfusionMatrix,
    class_names: &'a [String],
}

impl Heatmap<'_> {
    fn shade(&self, count: usize, max: usize) -> char {
        if max == 0 || count == 0 {
            return SHADES[0];
        }
        let level = (count as f64 / max as f64 * (SHADES.len() - 1) as f64).round() as usize;
        SHADES[level.clamp(1, SHADES.len() - 1)]
    }
}

impl fmt::Display for Heatmap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.matrix.as_rows();
        let max = rows.iter().flatten().copied().max().unwrap_or(0);
        let digits = max.to_string().len();

        let name_width = self
            .class_names
            .iter()
            .map(|n| n.chars().count())
            .chain(std::iter::once("Actual".len()))
            .max()
            .unwrap_or(0);
        let cell_width = self
            .class_names
            .iter()
            .map(|n| n.chars().count())
            .max()
            .unwrap_or(0)
            .max(digits + 3);

        writeln!(f, "Confusion Matrix")?;
        writeln!(f, "{:name_width$}  Predicted", "")?;
        write!(f, "{:<name_width$}", "Actual")?;
        for name in self.class_names {
            write!(f, "  {name:<cell_width$}")?;
        }
        writeln!(f)?;

        for (name, row) in self.class_names.iter().zip(rows) {
            write!(f, "{name:<name_width$}")?;
            for &count in row {
                let shade = self.shade(count, max);
                let cell = format!("{shade}{shade} {count:>digits$}");
                write!(f, "  {cell:<cell_width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let cm = ConfusionMatrix::from_labels(&[0, 0, 1, 2], &[0, 0, 1, 2], 3).unwrap();
        assert!((cm.accuracy() - 1.0).abs() < f64::EPSILON);
        assert!(cm.class_metrics().iter().all(|m| (m.f1 - 1.0).abs() < f64::EPSILON));
    }

    #[test]
    fn known_matrix_metrics() {
        let truth = [0, 0, 0, 1, 1, 1, 2, 2, 2];
        let pred = [0, 0, 1, 1, 1, 2, 2, 2, 0];
        let cm = ConfusionMatrix::from_labels(&truth, &pred, 3).unwrap();
        let m = cm.class_metrics();
        assert!((m[0].precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((m[0].recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(m[0].support, 3);
        assert!((cm.accuracy() - 6.0 / 9.0).abs() < 1e-12);
        assert_eq!(cm.as_rows()[0], vec![2, 1, 0]);
        assert_eq!(cm.total(), 9);
    }

    #[test]
    fn absent_class_scores_zero() {
        let cm = ConfusionMatrix::from_labels(&[0, 1], &[0, 1], 3).unwrap();
        let m = &cm.class_metrics()[2];
        assert_eq!(m.support, 0);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.f1, 0.0);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(
            ConfusionMatrix::from_labels(&[], &[], 2),
            Err(ForestError::EmptyDataset)
        ));
        assert!(matches!(
            ConfusionMatrix::from_labels(&[0, 1], &[0], 2),
            Err(ForestError::PredictionCountMismatch { .. })
        ));
        assert!(matches!(
            ConfusionMatrix::from_labels(&[0, 3], &[0, 1], 2),
            Err(ForestError::LabelOutOfRange { label: 3, .. })
        ));
    }

    #[test]
    fn heatmap_labels_rows_and_columns() {
        let cm = ConfusionMatrix::from_labels(&[0, 0, 0, 0, 1], &[0, 0, 0, 1, 1], 2).unwrap();
        let names = vec!["Abnormal".to_string(), "Normal".to_string()];
        let text = cm.heatmap(&names).unwrap().to_string();
        assert!(text.contains("Predicted"));
        assert!(text.contains("Actual"));
        let abnormal_row = text.lines().find(|l| l.starts_with("Abnormal")).unwrap();
        assert!(abnormal_row.contains("██ 3"));
        assert!(abnormal_row.contains("░░ 1"));
    }

    #[test]
    fn heatmap_requires_one_name_per_class() {
        let cm = ConfusionMatrix::from_labels(&[0, 1], &[0, 1], 2).unwrap();
        assert!(matches!(
            cm.heatmap(&["only".to_string()]),
            Err(ForestError::ClassNameMismatch { n_names: 1, n_classes: 2 })
        ));
    }
}
