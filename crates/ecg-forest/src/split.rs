//! Impurity criteria and best-split search over a node's samples.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::node::{FeatureIndex, Impurity};

/// Impurity measure used to score candidate splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitCriterion {
    /// `1 - Σ p_i²`
    Gini,
    /// `-Σ p_i · ln(p_i)`
    Entropy,
}

impl SplitCriterion {
    /// Impurity of a node with the given class counts.
    ///
    /// An empty node is pure.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let probs = class_counts.iter().filter(|&&c| c > 0).map(|&c| c as f64 / n);
        let value = match self {
            SplitCriterion::Gini => 1.0 - probs.map(|p| p * p).sum::<f64>(),
            SplitCriterion::Entropy => -probs.map(|p| p * p.ln()).sum::<f64>(),
        };
        Impurity::new(value.max(0.0))
    }
}

/// The winning split of a node, with its samples already partitioned.
#[derive(Debug, Clone)]
pub(crate) struct Split {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    pub(crate) gain: f64,
    pub(crate) left: Vec<usize>,
    pub(crate) right: Vec<usize>,
}

/// Fixed inputs of the split search for one tree.
///
/// `columns` is column-major: `columns[feature][sample]`. Sample lists may
/// contain repeated indices (bootstrap draws); every occurrence counts.
pub(crate) struct SplitSearch<'a> {
    pub(crate) columns: &'a [Vec<f64>],
    pub(crate) labels: &'a [usize],
    pub(crate) n_classes: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_features: usize,
    pub(crate) min_samples_leaf: usize,
}

impl SplitSearch<'_> {
    /// Find the split with the largest weighted impurity decrease.
    ///
    /// Features are drawn in random order until `max_features` non-constant
    /// features have been scanned; constant features do not count towards
    /// the budget. Returns `None` when no boundary satisfies
    /// `min_samples_leaf`.
    pub(crate) fn best_split(
        &self,
        samples: &[usize],
        parent_counts: &[usize],
        rng: &mut impl Rng,
    ) -> Option<Split> {
        let n = samples.len();
        let n_features = self.columns.len();
        if n < 2 || n_features == 0 {
            return None;
        }
        let parent = self.criterion.impurity(parent_counts, n).value();

        let mut order: Vec<usize> = (0..n_features).collect();
        let mut scanned = 0usize;
        let mut best: Option<(usize, f64, f64)> = None;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);

        for i in 0..n_features {
            if scanned >= self.max_features {
                break;
            }
            let j = rng.gen_range(i..n_features);
            order.swap(i, j);
            let feature = order[i];
            let column = &self.columns[feature];

            sorted.clear();
            sorted.extend(samples.iter().map(|&s| (column[s], self.labels[s])));
            sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
            if sorted[0].0 == sorted[n - 1].0 {
                continue;
            }
            scanned += 1;

            let mut left = vec![0usize; self.n_classes];
            let mut right = parent_counts.to_vec();
            for pos in 0..n - 1 {
                let (value, class) = sorted[pos];
                left[class] += 1;
                right[class] -= 1;

                let next = sorted[pos + 1].0;
                if value == next {
                    continue;
                }
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let gain = n as f64 * parent
                    - n_left as f64 * self.criterion.impurity(&left, n_left).value()
                    - n_right as f64 * self.criterion.impurity(&right, n_right).value();
                if best.is_none_or(|(_, _, g)| gain > g) {
                    best = Some((feature, midpoint(value, next), gain));
                }
            }
        }

        let (feature, threshold, gain) = best?;
        let column = &self.columns[feature];
        let (left, right): (Vec<usize>, Vec<usize>) =
            samples.iter().partition(|&&s| column[s] <= threshold);

        Some(Split {
            feature: FeatureIndex::new(feature),
            threshold,
            gain,
            left,
            right,
        })
    }
}

/// Midpoint of two adjacent sorted values, falling back to the lower one
/// when rounding would put the threshold on the upper value.
fn midpoint(lower: f64, upper: f64) -> f64 {
    let mid = lower / 2.0 + upper / 2.0;
    if mid >= upper || !mid.is_finite() { lower } else { mid }
}
