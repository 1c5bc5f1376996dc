//! Deterministic train/test split.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::error::{MlError, Result};

/// Row positions of each split, ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with a seeded ChaCha8 generator and cut it into a train
/// part of `round(n * train_ratio)` rows (at least one, at most `n - 1`) and
/// a test part with the rest.
pub fn train_test_split(n: usize, train_ratio: f64, seed: u64) -> Result<Split> {
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(MlError::InvalidSplitRatio(train_ratio));
    }
    if n < 2 {
        return Err(MlError::TooFewRows { rows: n });
    }
    let train_size = ((n as f64 * train_ratio).round() as usize).clamp(1, n - 1);

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut test = indices.split_off(train_size);
    let mut train = indices;
    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hundred_rows_eighty_twenty() {
        let split = train_test_split(100, 0.8, 42).unwrap();
        assert_eq!(split.train.len(), 80);
        assert_eq!(split.test.len(), 20);
        assert!(split.test.iter().all(|i| !split.train.contains(i)));
    }

    #[test]
    fn same_seed_same_split() {
        assert_eq!(
            train_test_split(50, 0.7, 42).unwrap(),
            train_test_split(50, 0.7, 42).unwrap()
        );
        assert_ne!(
            train_test_split(50, 0.7, 42).unwrap(),
            train_test_split(50, 0.7, 43).unwrap()
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(train_test_split(10, 0.0, 1), Err(MlError::InvalidSplitRatio(_))));
        assert!(matches!(train_test_split(10, 1.0, 1), Err(MlError::InvalidSplitRatio(_))));
        assert!(matches!(train_test_split(1, 0.5, 1), Err(MlError::TooFewRows { rows: 1 })));
    }

    #[test]
    fn extreme_ratios_keep_both_sides() {
        let split = train_test_split(3, 0.01, 0).unwrap();
        assert_eq!(split.train.len(), 1);
        let split = train_test_split(3, 0.99, 0).unwrap();
        assert_eq!(split.test.len(), 1);
    }

    proptest! {
        #[test]
        fn split_is_disjoint_and_exhaustive(n in 2usize..500, ratio in 0.01f64..0.99, seed in any::<u64>()) {
            let split = train_test_split(n, ratio, seed).unwrap();
            prop_assert!(!split.train.is_empty());
            prop_assert!(!split.test.is_empty());
            let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
            all.sort_unstable();
            prop_assert_eq!(all, (0..n).collect::<Vec<_>>());
        }
    }
}
