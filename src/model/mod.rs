//! Pluggable classifiers.
//!
//! A [`Learner`] turns a feature matrix and labels into a fitted [`Model`].
//! Learners never see validation or hold-out rows; preprocessing and
//! resampling happen before [`Learner::fit`] is called.

mod forest;
mod logistic;
mod params;

pub use forest::{ForestLearner, ForestModel};
pub use logistic::{LogisticLearner, LogisticModel};
pub use params::{HyperparameterGrid, Hyperparameters};

use crate::config::ModelFamily;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};
use std::fmt;

/// A fitted classifier.
pub trait Model: Send + Sync + fmt::Debug {
    /// Number of classes the model predicts.
    fn n_classes(&self) -> usize;

    /// Class probabilities, one row per observation and one column per class.
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Array2<f64>>;

    /// Most probable class per observation; ties resolve to the lowest index.
    fn predict(&self, x: &Array2<f32>) -> Result<Vec<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.rows().into_iter().map(argmax).collect())
    }
}

/// A training algorithm.
pub trait Learner: Send + Sync + fmt::Debug {
    /// Family this learner implements.
    fn family(&self) -> ModelFamily;

    /// Fit a model on `x` with labels `y` in `0..n_classes`.
    fn fit(
        &self,
        x: &Array2<f32>,
        y: &[usize],
        n_classes: usize,
        params: &Hyperparameters,
        seed: u64,
    ) -> Result<Box<dyn Model>>;
}

/// Learner for a configured family.
pub fn learner_for(family: ModelFamily) -> Box<dyn Learner> {
    match family {
        ModelFamily::Logistic => Box::new(LogisticLearner),
        ModelFamily::Forest => Box::new(ForestLearner),
    }
}

/// Index of the largest value; the first wins on ties.
pub fn argmax(row: ArrayView1<'_, f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &value) in row.iter().enumerate() {
        if value > best_value {
            best = i;
            best_value = value;
        }
    }
    best
}

/// Shared input checks for every learner.
fn check_training_input(x: &Array2<f32>, y: &[usize], n_classes: usize) -> Result<()> {
    if x.nrows() == 0 {
        return Err(Error::ModelFit {
            reason: "empty training set".to_string(),
        });
    }
    if x.nrows() != y.len() {
        return Err(Error::DimensionMismatch {
            expected: format!("{} labels", x.nrows()),
            actual: format!("{} labels", y.len()),
        });
    }
    if n_classes < 2 {
        return Err(Error::ModelFit {
            reason: format!("need at least 2 classes, got {n_classes}"),
        });
    }
    if let Some(&bad) = y.iter().find(|&&label| label >= n_classes) {
        return Err(Error::ModelFit {
            reason: format!("label {bad} outside 0..{n_classes}"),
        });
    }
    Ok(())
}

fn check_prediction_input(x: &Array2<f32>, n_features: usize) -> Result<()> {
    if x.ncols() == n_features {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            expected: format!("{n_features} features"),
            actual: format!("{} features", x.ncols()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_argmax_ties_resolve_low() {
        assert_eq!(argmax(array![0.2, 0.5, 0.3].view()), 1);
        assert_eq!(argmax(array![0.5, 0.5].view()), 0);
        assert_eq!(argmax(array![0.25, 0.25, 0.25, 0.25].view()), 0);
    }

    #[test]
    fn test_learner_for_family() {
        assert_eq!(learner_for(ModelFamily::Logistic).family(), ModelFamily::Logistic);
        assert_eq!(learner_for(ModelFamily::Forest).family(), ModelFamily::Forest);
    }

    #[test]
    fn test_training_input_checks() {
        let x = Array2::<f32>::zeros((2, 3));
        assert!(check_training_input(&x, &[0, 1], 2).is_ok());
        assert!(check_training_input(&x, &[0], 2).is_err());
        assert!(check_training_input(&x, &[0, 2], 2).is_err());
        assert!(check_training_input(&Array2::zeros((0, 3)), &[], 2).is_err());
    }
}
