//! Seeded stratified partitioning.

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

/// Training and hold-out partitions.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Observations used for model selection and the final fit.
    pub training: Dataset,
    /// Observations used only for the final evaluation.
    pub holdout: Dataset,
}

/// One cross-validation fold, as positions into the training partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Positions used for fitting.
    pub train: Vec<usize>,
    /// Positions used for scoring.
    pub validation: Vec<usize>,
}

/// Derive an independent seed from a base seed and a path of indices.
///
/// Uses splitmix64 mixing so adjacent inputs give unrelated streams.
pub fn derive_seed(base: u64, parts: &[u64]) -> u64 {
    parts.iter().fold(splitmix64(base), |acc, &part| {
        splitmix64(acc ^ splitmix64(part.wrapping_add(0x9E37_79B9_7F4A_7C15)))
    })
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn positions_by_class(labels: &[usize], n_classes: usize) -> Vec<Vec<usize>> {
    let mut by_class = vec![Vec::new(); n_classes];
    for (position, &label) in labels.iter().enumerate() {
        if let Some(bucket) = by_class.get_mut(label) {
            bucket.push(position);
        }
    }
    by_class
}

/// Split a dataset into training and hold-out partitions per class.
///
/// Each class contributes `round(n_c * train_fraction)` observations
/// (half away from zero) to training and the rest to hold-out. Any class
/// absent from either side is an error.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn stratified_split(dataset: &Dataset, train_fraction: f64, seed: u64) -> Result<Partition> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut training = Vec::with_capacity(dataset.len());
    let mut holdout = Vec::with_capacity(dataset.len());

    for (class, mut positions) in positions_by_class(dataset.labels(), dataset.n_classes())
        .into_iter()
        .enumerate()
    {
        let n_train =
            ((positions.len() as f64 * train_fraction).round() as usize).min(positions.len());
        let name = dataset.label_set().name(class);

        if n_train == 0 {
            return Err(Error::PartitionClassMissing {
                class: name.to_string(),
                partition: "training".to_string(),
            });
        }
        if n_train == positions.len() {
            return Err(Error::PartitionClassMissing {
                class: name.to_string(),
                partition: "hold-out".to_string(),
            });
        }

        positions.shuffle(&mut rng);
        debug!(
            "class {name}: {} training, {} hold-out",
            n_train,
            positions.len() - n_train
        );
        training.extend_from_slice(&positions[..n_train]);
        holdout.extend_from_slice(&positions[n_train..]);
    }

    training.sort_unstable();
    holdout.sort_unstable();

    Ok(Partition {
        training: dataset.subset(&training),
        holdout: dataset.subset(&holdout),
    })
}

/// Assign every observation to one of `k` stratified folds.
///
/// Within each class the shuffled positions are dealt round-robin; the
/// dealing offset carries across classes so fold sizes differ by at most one.
pub fn stratified_folds(labels: &[usize], n_classes: usize, k: usize, seed: u64) -> Vec<Fold> {
    let k = k.max(1);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut assignment = vec![0_usize; labels.len()];
    let mut offset = 0;

    for mut positions in positions_by_class(labels, n_classes) {
        positions.shuffle(&mut rng);
        let class_size = positions.len();
        for (i, position) in positions.into_iter().enumerate() {
            assignment[position] = (offset + i) % k;
        }
        offset = (offset + class_size) % k;
    }

    (0..k)
        .map(|fold| {
            let (validation, train): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&p| assignment[p] == fold);
            Fold { train, validation }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Task;
    use crate::dataset::{CorpusBuilder, LabelSet};
    use crate::features::FeatureVector;

    fn corpus(counts: &[usize]) -> crate::dataset::Corpus {
        let labels = LabelSet::new(["ar", "bepop", "phantom", "background"]);
        let mut builder = CorpusBuilder::new(labels.clone(), 1);
        let mut id = 0_u32;
        for (class, &n) in labels.names().iter().zip(counts) {
            for _ in 0..n {
                builder
                    .push(format!("r{id}"), class, FeatureVector::from(vec![0.5]))
                    .unwrap();
                id += 1;
            }
        }
        builder.finish("background").unwrap()
    }

    #[test]
    fn test_binary_split_counts() {
        let dataset = corpus(&[50, 50, 50, 77]).view(Task::Binary);
        let partition = stratified_split(&dataset, 0.75, 42).unwrap();

        assert_eq!(partition.training.class_counts(), vec![113, 58]);
        assert_eq!(partition.holdout.class_counts(), vec![37, 19]);
    }

    #[test]
    fn test_split_is_disjoint_and_complete() {
        let dataset = corpus(&[13, 21, 8, 30]).view(Task::Multiclass);
        let partition = stratified_split(&dataset, 0.75, 7).unwrap();

        let mut all: Vec<usize> = partition
            .training
            .rows()
            .iter()
            .chain(partition.holdout.rows())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..dataset.len()).collect::<Vec<_>>());
    }

    /// Largest gap between a class's share of `part` and of the full set.
    #[allow(clippy::cast_precision_loss)]
    fn share_gap(part: &Dataset, full: &Dataset) -> f64 {
        part.class_counts()
            .iter()
            .zip(full.class_counts())
            .map(|(&c, f)| (c as f64 / part.len() as f64 - f as f64 / full.len() as f64).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn test_split_preserves_class_shares() {
        for counts in [[13, 21, 8, 30], [50, 50, 50, 77], [5, 9, 17, 3], [6, 14, 10, 31]] {
            let dataset = corpus(&counts).view(Task::Multiclass);
            for seed in [0, 3, 42, 1234] {
                let partition = stratified_split(&dataset, 0.75, seed).unwrap();
                let Partition { training, holdout } = &partition;

                let gap = share_gap(training, &dataset);
                assert!(gap <= 1.0 / training.len() as f64, "{counts:?} training gap {gap}");
                let gap = share_gap(holdout, &dataset);
                assert!(gap <= 1.0 / holdout.len() as f64, "{counts:?} hold-out gap {gap}");
            }
        }
    }

    #[test]
    fn test_split_is_seeded() {
        let dataset = corpus(&[10, 10, 10, 10]).view(Task::Multiclass);
        let a = stratified_split(&dataset, 0.75, 11).unwrap();
        let b = stratified_split(&dataset, 0.75, 11).unwrap();
        let c = stratified_split(&dataset, 0.75, 12).unwrap();

        assert_eq!(a.training.rows(), b.training.rows());
        assert_ne!(a.training.rows(), c.training.rows());
    }

    #[test]
    fn test_singleton_class_is_fatal() {
        let dataset = corpus(&[10, 1, 10, 10]).view(Task::Multiclass);
        let err = stratified_split(&dataset, 0.75, 1).unwrap_err();
        assert!(matches!(err, Error::PartitionClassMissing { ref class, .. } if class == "bepop"));
    }

    #[test]
    fn test_folds_partition_every_observation() {
        let labels: Vec<usize> = (0..53).map(|i| i % 3).collect();
        let folds = stratified_folds(&labels, 3, 5, 9);
        assert_eq!(folds.len(), 5);

        let mut seen = vec![0; labels.len()];
        for fold in &folds {
            assert_eq!(fold.train.len() + fold.validation.len(), labels.len());
            for &p in &fold.validation {
                seen[p] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
    }

    #[test]
    fn test_folds_are_stratified() {
        let labels: Vec<usize> = (0..100).map(|i| usize::from(i >= 80)).collect();
        for fold in stratified_folds(&labels, 2, 5, 4) {
            let positives = fold.validation.iter().filter(|&&p| labels[p] == 1).count();
            assert_eq!(positives, 4);
            assert_eq!(fold.validation.len(), 20);
        }
    }

    #[test]
    fn test_derive_seed_varies() {
        assert_eq!(derive_seed(42, &[1, 2]), derive_seed(42, &[1, 2]));
        assert_ne!(derive_seed(42, &[1, 2]), derive_seed(42, &[2, 1]));
        assert_ne!(derive_seed(42, &[0]), derive_seed(43, &[0]));
    }
}
