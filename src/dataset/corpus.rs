//! Corpus assembly from per-recording feature vectors.

use crate::config::Task;
use crate::dataset::labels::{LabelSet, binary_collapse};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::features::FeatureVector;
use ndarray::Array2;
use std::sync::Arc;

/// Incrementally grown row-major feature matrix.
///
/// Rows are appended as recordings are processed so that only the matrix,
/// not the intermediate rasters, stays resident.
#[derive(Debug)]
pub struct CorpusBuilder {
    label_set: LabelSet,
    feature_len: usize,
    values: Vec<f32>,
    ids: Vec<String>,
    labels: Vec<usize>,
}

impl CorpusBuilder {
    /// Start an empty corpus with the native label set.
    pub fn new(label_set: LabelSet, feature_len: usize) -> Self {
        Self {
            label_set,
            feature_len,
            values: Vec::new(),
            ids: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Reserve room for `rows` more recordings.
    pub fn reserve(&mut self, rows: usize) {
        self.values.reserve(rows * self.feature_len);
        self.ids.reserve(rows);
        self.labels.reserve(rows);
    }

    /// Append one labeled feature vector.
    pub fn push(
        &mut self,
        id: impl Into<String>,
        class: &str,
        features: FeatureVector,
    ) -> Result<()> {
        let label = self
            .label_set
            .index_of(class)
            .ok_or_else(|| Error::InvalidFeatureTable {
                message: format!("class '{class}' is not declared"),
            })?;

        if features.len() != self.feature_len {
            return Err(Error::DimensionMismatch {
                expected: format!("{} features", self.feature_len),
                actual: format!("{} features", features.len()),
            });
        }

        self.values.extend_from_slice(features.as_slice());
        self.ids.push(id.into());
        self.labels.push(label);
        Ok(())
    }

    /// Number of rows so far.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no rows were added.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Finish the corpus, failing if any declared class is empty.
    pub fn finish(self, background_class: &str) -> Result<Corpus> {
        let rows = self.labels.len();
        let features = Array2::from_shape_vec((rows, self.feature_len), self.values).map_err(|e| {
            Error::Internal {
                message: format!("feature matrix shape: {e}"),
            }
        })?;

        Corpus::new(features, self.ids, self.labels, self.label_set, background_class)
    }
}

/// All feature vectors with their native labels.
#[derive(Debug, Clone)]
pub struct Corpus {
    features: Arc<Array2<f32>>,
    ids: Arc<Vec<String>>,
    labels: Vec<usize>,
    label_set: LabelSet,
    background_class: String,
}

impl Corpus {
    /// Assemble a corpus, validating alignment and class completeness.
    pub fn new(
        features: Array2<f32>,
        ids: Vec<String>,
        labels: Vec<usize>,
        label_set: LabelSet,
        background_class: &str,
    ) -> Result<Self> {
        if features.nrows() != labels.len() || ids.len() != labels.len() {
            return Err(Error::DimensionMismatch {
                expected: format!("{} rows", labels.len()),
                actual: format!("{} feature rows, {} ids", features.nrows(), ids.len()),
            });
        }

        if label_set.index_of(background_class).is_none() {
            return Err(Error::ConfigValidation {
                message: format!("background class '{background_class}' is not declared"),
            });
        }

        let mut counts = vec![0_usize; label_set.len()];
        for &label in &labels {
            let slot = counts.get_mut(label).ok_or_else(|| Error::Internal {
                message: format!("label index {label} out of range"),
            })?;
            *slot += 1;
        }
        if let Some(empty) = counts.iter().position(|&c| c == 0) {
            return Err(Error::EmptyClass {
                class: label_set.name(empty).to_string(),
            });
        }

        Ok(Self {
            features: Arc::new(features),
            ids: Arc::new(ids),
            labels,
            label_set,
            background_class: background_class.to_string(),
        })
    }

    /// Number of recordings.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Features per recording.
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Shared feature matrix.
    pub fn features(&self) -> &Array2<f32> {
        &self.features
    }

    /// Recording identifiers in row order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Native labels in row order.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Native label set.
    pub fn label_set(&self) -> &LabelSet {
        &self.label_set
    }

    /// Dataset over every recording with the requested label view.
    pub fn view(&self, task: Task) -> Dataset {
        let (labels, label_set) = match task {
            Task::Multiclass => (self.labels.clone(), self.label_set.clone()),
            Task::Binary => {
                let mapping = binary_collapse(&self.label_set, &self.background_class);
                (
                    self.labels.iter().map(|&l| mapping[l]).collect(),
                    LabelSet::binary(),
                )
            }
        };

        Dataset::new(
            Arc::clone(&self.features),
            Arc::clone(&self.ids),
            (0..self.len()).collect(),
            labels,
            label_set,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn native() -> LabelSet {
        LabelSet::new(["ar", "bepop", "phantom", "background"])
    }

    fn corpus_with_counts(counts: &[usize]) -> Corpus {
        let mut builder = CorpusBuilder::new(native(), 2);
        for (class, &n) in native().names().iter().zip(counts) {
            for i in 0..n {
                #[allow(clippy::cast_precision_loss)]
                let v = FeatureVector::from(vec![i as f32, 1.0]);
                builder.push(format!("{class}_{i}"), class, v).unwrap();
            }
        }
        builder.finish("background").unwrap()
    }

    #[test]
    fn test_binary_view_counts() {
        let corpus = corpus_with_counts(&[50, 50, 50, 77]);
        let binary = corpus.view(Task::Binary);
        assert_eq!(binary.class_counts(), vec![150, 77]);

        let multiclass = corpus.view(Task::Multiclass);
        assert_eq!(multiclass.class_counts(), vec![50, 50, 50, 77]);
    }

    #[test]
    fn test_empty_class_is_fatal() {
        let mut builder = CorpusBuilder::new(native(), 1);
        for class in ["ar", "bepop", "background"] {
            builder
                .push(class, class, FeatureVector::from(vec![0.0]))
                .unwrap();
        }
        let err = builder.finish("background").unwrap_err();
        assert!(matches!(err, Error::EmptyClass { ref class } if class == "phantom"));
    }

    #[test]
    fn test_push_rejects_wrong_length_and_unknown_class() {
        let mut builder = CorpusBuilder::new(native(), 3);
        assert!(builder.push("a", "ar", FeatureVector::from(vec![0.0; 2])).is_err());
        assert!(builder.push("a", "mavic", FeatureVector::from(vec![0.0; 3])).is_err());
        assert!(builder.is_empty());
    }
}
