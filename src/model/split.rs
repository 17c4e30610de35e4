//! Seeded train/test partitioning

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};

/// Sample indices of each partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n_samples` with a seeded RNG and hold out
/// `ceil(test_fraction * n_samples)` indices for testing.
pub fn train_test_split(n_samples: usize, test_fraction: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::Config(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    let n_test = (test_fraction * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(Error::InsufficientData(format!(
            "{} samples with test fraction {} leaves an empty partition",
            n_samples, test_fraction
        )));
    }

    let mut permutation: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let train = permutation.split_off(n_test);
    Ok(TrainTestSplit {
        train,
        test: permutation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sizes_round_test_up() {
        let split = train_test_split(11, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 8);

        let split = train_test_split(10, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 8);
    }

    #[test]
    fn test_partitions_cover_all_indices_once() {
        let split = train_test_split(50, 0.2, 42).unwrap();
        let all: HashSet<usize> = split.train.iter().chain(&split.test).copied().collect();
        assert_eq!(all.len(), 50);
        assert!(split.train.iter().all(|i| !split.test.contains(i)));
    }

    #[test]
    fn test_deterministic_for_seed() {
        assert_eq!(train_test_split(30, 0.2, 42).unwrap(), train_test_split(30, 0.2, 42).unwrap());
        assert_ne!(train_test_split(30, 0.2, 42).unwrap(), train_test_split(30, 0.2, 7).unwrap());
    }

    #[test]
    fn test_too_few_samples() {
        assert!(matches!(train_test_split(1, 0.2, 42), Err(Error::InsufficientData(_))));
        assert!(matches!(train_test_split(0, 0.2, 42), Err(Error::InsufficientData(_))));
        assert!(train_test_split(2, 0.2, 42).is_ok());
    }
}
