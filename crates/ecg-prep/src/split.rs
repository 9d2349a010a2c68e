//! Seeded stratified train/test split.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::error::PrepError;

/// Row indices of the two partitions, each in shuffled order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Gather the rows at the train and test indices.
    #[must_use]
    pub fn select<T: Clone>(&self, items: &[T]) -> (Vec<T>, Vec<T>) {
        let pick = |idx: &[usize]| -> Vec<T> { idx.iter().map(|&i| items[i].clone()).collect() };
        (pick(&self.train), pick(&self.test))
    }
}

/// Split sample indices so each class keeps its share in both partitions.
///
/// `n_test = ceil(test_size * n)`. The train partition is allocated first:
/// each class gets the floor of its proportional share and leftover slots
/// go to the classes with the largest fractional remainder (lowest class
/// code on ties). Every remaining member of a class lands in test.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PrepError::EmptyDataset`] | `labels` is empty |
/// | [`PrepError::InvalidTestSize`] | `test_size` outside (0, 1) |
/// | [`PrepError::ClassTooSmall`] | a class has a single member |
/// | [`PrepError::PartitionTooSmall`] | a partition is smaller than the class count |
#[instrument(skip_all, fields(n_samples = labels.len(), test_size, seed))]
pub fn train_test_split(
    labels: &[usize],
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit, PrepError> {
    if labels.is_empty() {
        return Err(PrepError::EmptyDataset);
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PrepError::InvalidTestSize { test_size });
    }

    let n = labels.len();
    let max_code = labels.iter().copied().max().unwrap_or(0);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); max_code + 1];
    for (i, &label) in labels.iter().enumerate() {
        members[label].push(i);
    }
    let present: Vec<usize> = (0..members.len()).filter(|&c| !members[c].is_empty()).collect();
    if let Some(&class) = present.iter().find(|&&c| members[c].len() < 2) {
        return Err(PrepError::ClassTooSmall {
            class,
            count: members[class].len(),
        });
    }

    let n_classes = present.len();
    let n_test = ((test_size * n as f64).ceil() as usize).min(n);
    let n_train = n - n_test;
    if n_train < n_classes {
        return Err(PrepError::PartitionTooSmall {
            partition: "train",
            size: n_train,
            n_classes,
        });
    }
    if n_test < n_classes {
        return Err(PrepError::PartitionTooSmall {
            partition: "test",
            size: n_test,
            n_classes,
        });
    }

    let counts: Vec<usize> = members.iter().map(Vec::len).collect();
    let train_quota = approximate_mode(&counts, n_train);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (class_members, &quota) in members.iter_mut().zip(&train_quota) {
        class_members.shuffle(&mut rng);
        let (head, tail) = class_members.split_at(quota);
        train.extend_from_slice(head);
        test.extend_from_slice(tail);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    debug!(
        n_train = train.len(),
        n_test = test.len(),
        ?train_quota,
        "stratified split"
    );
    Ok(TrainTestSplit { train, test })
}

/// Distribute `total` draws over classes proportionally to `counts`.
fn approximate_mode(counts: &[usize], total: usize) -> Vec<usize> {
    let n: usize = counts.iter().sum();
    let shares: Vec<f64> = counts
        .iter()
        .map(|&c| c as f64 * total as f64 / n as f64)
        .collect();
    let mut quota: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();

    let mut leftover = total - quota.iter().sum::<usize>();
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = shares[a] - shares[a].floor();
        let rb = shares[b] - shares[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for class in order {
        if leftover == 0 {
            break;
        }
        if quota[class] < counts[class] {
            quota[class] += 1;
            leftover -= 1;
        }
    }
    quota
}
