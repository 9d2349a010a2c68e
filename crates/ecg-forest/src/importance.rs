//! Feature importance aggregation across trees.

use serde::Serialize;

/// A feature with its normalized importance and 1-based rank.
#[derive(Debug, Clone, Serialize)]
pub struct RankedFeature {
    pub name: String,
    /// Share of the total impurity decrease; all importances sum to 1.
    pub importance: f64,
    /// 1 is the most important feature.
    pub rank: usize,
}

/// Average per-tree importances, renormalize, and rank descending.
///
/// Ties keep column order.
pub(crate) fn rank_importances(per_tree: &[Vec<f64>], names: &[String]) -> Vec<RankedFeature> {
    let mut totals = vec![0.0f64; names.len()];
    for tree in per_tree {
        for (total, value) in totals.iter_mut().zip(tree) {
            *total += value;
        }
    }
    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }

    let mut ranked: Vec<RankedFeature> = names
        .iter()
        .zip(totals)
        .map(|(name, importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feature) in ranked.iter_mut().enumerate() {
        feature.rank = i + 1;
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_and_ranks() {
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let ranked = rank_importances(&[vec![0.2, 0.8, 0.0], vec![0.4, 0.6, 0.0]], &names);
        assert_eq!(ranked[0].name, "b");
        assert!((ranked[0].importance - 0.7).abs() < 1e-12);
        assert_eq!(ranked[1].name, "a");
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn all_zero_trees_stay_zero() {
        let names = vec!["a".to_string(), "b".to_string()];
        let ranked = rank_importances(&[vec![0.0, 0.0]], &names);
        assert!(ranked.iter().all(|f| f.importance == 0.0));
        assert_eq!(ranked[0].name, "a");
    }
}
