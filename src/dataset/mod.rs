//! Labeled datasets, label views and stratified partitioning.

mod corpus;
mod labels;
mod split;

pub use corpus::{Corpus, CorpusBuilder};
pub use labels::{LabelSet, binary_collapse};
pub use split::{Fold, Partition, derive_seed, stratified_folds, stratified_split};

use ndarray::{Array2, Axis};
use std::sync::Arc;

/// A row subset of a shared feature matrix with labels under one view.
///
/// Subsetting never copies feature values; [`Dataset::matrix`] gathers the
/// rows when a learner needs a contiguous matrix.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Arc<Array2<f32>>,
    ids: Arc<Vec<String>>,
    rows: Vec<usize>,
    labels: Vec<usize>,
    label_set: LabelSet,
}

impl Dataset {
    pub(crate) fn new(
        features: Arc<Array2<f32>>,
        ids: Arc<Vec<String>>,
        rows: Vec<usize>,
        labels: Vec<usize>,
        label_set: LabelSet,
    ) -> Self {
        Self {
            features,
            ids,
            rows,
            labels,
            label_set,
        }
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no observations.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Features per observation.
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Labels in observation order.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Label set of the view.
    pub fn label_set(&self) -> &LabelSet {
        &self.label_set
    }

    /// Number of classes in the view.
    pub fn n_classes(&self) -> usize {
        self.label_set.len()
    }

    /// Row indices into the corpus matrix.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Recording identifier of an observation.
    pub fn id(&self, position: usize) -> &str {
        self.rows
            .get(position)
            .and_then(|&row| self.ids.get(row))
            .map_or("", String::as_str)
    }

    /// Observation count per class, in label order.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.label_set.len()];
        for &label in &self.labels {
            if let Some(slot) = counts.get_mut(label) {
                *slot += 1;
            }
        }
        counts
    }

    /// Observations at `positions` (indices into this dataset).
    pub fn subset(&self, positions: &[usize]) -> Self {
        Self {
            features: Arc::clone(&self.features),
            ids: Arc::clone(&self.ids),
            rows: positions.iter().map(|&p| self.rows[p]).collect(),
            labels: positions.iter().map(|&p| self.labels[p]).collect(),
            label_set: self.label_set.clone(),
        }
    }

    /// Contiguous feature matrix, one row per observation.
    pub fn matrix(&self) -> Array2<f32> {
        self.features.select(Axis(0), &self.rows)
    }
}
