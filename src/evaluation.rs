//! Hold-out evaluation: confusion matrix and derived metrics.

use crate::dataset::{Dataset, LabelSet};
use crate::error::{Error, Result};
use crate::model::argmax;
use crate::training::{FittedPipeline, auc_score};
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Counts of (true class, predicted class) pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    labels: LabelSet,
    /// `counts[truth][predicted]`.
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Tally predictions against the truth.
    pub fn new(labels: LabelSet, truth: &[usize], predicted: &[usize]) -> Result<Self> {
        if truth.len() != predicted.len() {
            return Err(Error::DimensionMismatch {
                expected: format!("{} predictions", truth.len()),
                actual: format!("{} predictions", predicted.len()),
            });
        }

        let k = labels.len();
        let mut counts = vec![vec![0; k]; k];
        for (&t, &p) in truth.iter().zip(predicted) {
            if t >= k || p >= k {
                return Err(Error::Internal {
                    message: format!("label ({t}, {p}) outside 0..{k}"),
                });
            }
            counts[t][p] += 1;
        }
        Ok(Self { labels, counts })
    }

    /// Class labels indexing rows and columns.
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Count for a (truth, predicted) pair.
    pub fn get(&self, truth: usize, predicted: usize) -> usize {
        self.counts[truth][predicted]
    }

    /// Total observations.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Observations per true class.
    pub fn row_sums(&self) -> Vec<usize> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    /// Observations per predicted class.
    pub fn column_sums(&self) -> Vec<usize> {
        (0..self.labels.len())
            .map(|c| self.counts.iter().map(|row| row[c]).sum())
            .collect()
    }

    /// Correct predictions.
    pub fn diagonal(&self) -> usize {
        (0..self.labels.len()).map(|i| self.counts[i][i]).sum()
    }

    /// True positives, false negatives, false positives and true negatives
    /// of `class` against the rest.
    pub fn one_vs_rest(&self, class: usize) -> (usize, usize, usize, usize) {
        let tp = self.counts[class][class];
        let fn_ = self.row_sums()[class] - tp;
        let fp = self.column_sums()[class] - tp;
        let tn = self.total() - tp - fn_ - fp;
        (tp, fn_, fp, tn)
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .names()
            .iter()
            .map(String::len)
            .chain(std::iter::once("truth\\pred".len()))
            .chain(self.counts.iter().flatten().map(|c| c.to_string().len()))
            .max()
            .unwrap_or(0);

        write!(f, "{:>width$}", "truth\\pred")?;
        for name in self.labels.names() {
            write!(f, " {name:>width$}")?;
        }
        for (name, row) in self.labels.names().iter().zip(&self.counts) {
            write!(f, "\n{name:>width$}")?;
            for count in row {
                write!(f, " {count:>width$}")?;
            }
        }
        Ok(())
    }
}

/// Metrics for the positive class of a two-class problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryMetrics {
    /// Name of the positive class.
    pub positive: String,
    /// TP / (TP + FP).
    pub precision: Option<f64>,
    /// TP / (TP + FN).
    pub recall: Option<f64>,
    /// Harmonic mean of precision and recall.
    pub f1: Option<f64>,
    /// TN / (TN + FP).
    pub specificity: Option<f64>,
    /// Mean of recall and specificity.
    pub balanced_accuracy: Option<f64>,
}

/// One-vs-rest metrics of a single class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    /// Class name.
    pub class: String,
    /// TP / (TP + FN).
    pub sensitivity: Option<f64>,
    /// TN / (TN + FP).
    pub specificity: Option<f64>,
    /// Mean of sensitivity and specificity.
    pub balanced_accuracy: Option<f64>,
}

/// Per-class metrics and their means.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MulticlassMetrics {
    /// Metrics per class in label order.
    pub per_class: Vec<ClassMetrics>,
    /// Mean sensitivity over classes where it is defined.
    pub mean_sensitivity: Option<f64>,
    /// Mean specificity over classes where it is defined.
    pub mean_specificity: Option<f64>,
    /// Mean balanced accuracy over classes where it is defined.
    pub mean_balanced_accuracy: Option<f64>,
}

/// Everything derived from one hold-out evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    /// Confusion matrix, rows = truth, columns = prediction.
    pub confusion: ConfusionMatrix,
    /// Fraction of correct predictions.
    pub accuracy: Option<f64>,
    /// Cohen's kappa.
    pub kappa: Option<f64>,
    /// Hold-out AUC (positive class for two classes, mean one-vs-rest otherwise).
    pub auc: Option<f64>,
    /// Present for two-class problems.
    pub binary: Option<BinaryMetrics>,
    /// Present for problems with more than two classes.
    pub multiclass: Option<MulticlassMetrics>,
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

fn mean2(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some((a? + b?) / 2.0)
}

#[allow(clippy::cast_precision_loss)]
fn mean_defined(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let defined: Vec<f64> = values.flatten().collect();
    (!defined.is_empty()).then(|| defined.iter().sum::<f64>() / defined.len() as f64)
}

/// Cohen's kappa; undefined when chance agreement is total.
#[allow(clippy::cast_precision_loss)]
pub fn cohen_kappa(matrix: &ConfusionMatrix) -> Option<f64> {
    let total = matrix.total();
    if total == 0 {
        return None;
    }
    let n = total as f64;
    let observed = matrix.diagonal() as f64 / n;
    let expected: f64 = matrix
        .row_sums()
        .iter()
        .zip(matrix.column_sums())
        .map(|(&r, c)| r as f64 * c as f64)
        .sum::<f64>()
        / (n * n);

    let denominator = 1.0 - expected;
    (denominator.abs() > f64::EPSILON).then(|| (observed - expected) / denominator)
}

/// Binary metrics with class 0 as the positive class.
pub fn binary_metrics(matrix: &ConfusionMatrix) -> BinaryMetrics {
    let (tp, fn_, fp, tn) = matrix.one_vs_rest(0);
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let specificity = ratio(tn, tn + fp);
    let f1 = match (precision, recall) {
        (Some(p), Some(r)) if p + r > 0.0 => Some(2.0 * p * r / (p + r)),
        _ => None,
    };

    BinaryMetrics {
        positive: matrix.labels().name(0).to_string(),
        precision,
        recall,
        f1,
        specificity,
        balanced_accuracy: mean2(recall, specificity),
    }
}

/// One-vs-rest metrics for every class and their means.
pub fn multiclass_metrics(matrix: &ConfusionMatrix) -> MulticlassMetrics {
    let per_class: Vec<ClassMetrics> = (0..matrix.labels().len())
        .map(|class| {
            let (tp, fn_, fp, tn) = matrix.one_vs_rest(class);
            let sensitivity = ratio(tp, tp + fn_);
            let specificity = ratio(tn, tn + fp);
            ClassMetrics {
                class: matrix.labels().name(class).to_string(),
                sensitivity,
                specificity,
                balanced_accuracy: mean2(sensitivity, specificity),
            }
        })
        .collect();

    MulticlassMetrics {
        mean_sensitivity: mean_defined(per_class.iter().map(|m| m.sensitivity)),
        mean_specificity: mean_defined(per_class.iter().map(|m| m.specificity)),
        mean_balanced_accuracy: mean_defined(per_class.iter().map(|m| m.balanced_accuracy)),
        per_class,
    }
}

impl EvaluationResult {
    /// Derive all metrics from a confusion matrix and an AUC.
    pub fn from_confusion(confusion: ConfusionMatrix, auc: Option<f64>) -> Self {
        let two_class = confusion.labels().len() == 2;
        Self {
            accuracy: ratio(confusion.diagonal(), confusion.total()),
            kappa: cohen_kappa(&confusion),
            auc,
            binary: two_class.then(|| binary_metrics(&confusion)),
            multiclass: (!two_class).then(|| multiclass_metrics(&confusion)),
            confusion,
        }
    }
}

/// Apply a fitted pipeline to the hold-out partition.
pub fn evaluate(pipeline: &FittedPipeline, holdout: &Dataset) -> Result<EvaluationResult> {
    if pipeline.label_set() != holdout.label_set() {
        return Err(Error::DimensionMismatch {
            expected: pipeline.label_set().names().join(","),
            actual: holdout.label_set().names().join(","),
        });
    }

    let proba = pipeline.predict_proba(&holdout.matrix())?;
    let predicted: Vec<usize> = proba.rows().into_iter().map(argmax).collect();
    let confusion =
        ConfusionMatrix::new(holdout.label_set().clone(), holdout.labels(), &predicted)?;
    let result = EvaluationResult::from_confusion(confusion, auc_score(&proba, holdout.labels()));

    info!(
        "hold-out {} [{}]: accuracy {}, kappa {}, AUC {}",
        pipeline.family(),
        pipeline.params(),
        fmt_metric(result.accuracy),
        fmt_metric(result.kappa),
        fmt_metric(result.auc)
    );
    Ok(result)
}

/// Render an optional metric for logs.
pub fn fmt_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}
