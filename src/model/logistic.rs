//! Multinomial logistic regression with an elastic-net penalty.
//!
//! Minimizes mean cross-entropy plus
//! `lambda * ((1 - alpha) / 2 * ||W||² + alpha * ||W||₁)` by proximal
//! gradient descent. The step is `1 / L` where `L` bounds the gradient's
//! Lipschitz constant, estimated by power iteration on `XᵀX / n`. The
//! intercepts are not penalized.

use super::{Hyperparameters, Learner, Model, check_prediction_input, check_training_input};
use crate::config::ModelFamily;
use crate::constants::learner::{LOGISTIC_MAX_ITER, LOGISTIC_TOLERANCE, POWER_ITERATIONS};
use crate::error::{Error, Result};
use ndarray::{Array1, Array2, Axis, Zip};
use tracing::trace;

/// Elastic-net multinomial logistic learner.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogisticLearner;

/// Fitted logistic model.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    weights: Array2<f64>,
    intercepts: Array1<f64>,
}

impl Model for LogisticModel {
    fn n_classes(&self) -> usize {
        self.intercepts.len()
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Array2<f64>> {
        check_prediction_input(x, self.weights.nrows())?;
        let x = x.mapv(f64::from);
        let mut scores = x.dot(&self.weights);
        scores += &self.intercepts;
        softmax_rows(&mut scores);
        Ok(scores)
    }
}

impl Learner for LogisticLearner {
    fn family(&self) -> ModelFamily {
        ModelFamily::Logistic
    }

    fn fit(
        &self,
        x: &Array2<f32>,
        y: &[usize],
        n_classes: usize,
        params: &Hyperparameters,
        _seed: u64,
    ) -> Result<Box<dyn Model>> {
        Ok(Box::new(self.fit_logistic(x, y, n_classes, params)?))
    }
}

impl LogisticLearner {
    /// Fit and return the concrete model. The fit is deterministic.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit_logistic(
        &self,
        x: &Array2<f32>,
        y: &[usize],
        n_classes: usize,
        params: &Hyperparameters,
    ) -> Result<LogisticModel> {
        check_training_input(x, y, n_classes)?;

        let alpha = params.require("alpha", ModelFamily::Logistic)?;
        let lambda = params.require("lambda", ModelFamily::Logistic)?;
        let max_iter = params.count_or("max_iter", LOGISTIC_MAX_ITER)?;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(Error::InvalidHyperparameter {
                name: "alpha".to_string(),
                value: alpha,
                reason: "must lie in [0, 1]".to_string(),
            });
        }
        if !(lambda.is_finite() && lambda >= 0.0) {
            return Err(Error::InvalidHyperparameter {
                name: "lambda".to_string(),
                value: lambda,
                reason: "must be finite and non-negative".to_string(),
            });
        }

        let x = x.mapv(f64::from);
        let (n, p) = x.dim();
        let n_f = n as f64;

        let mut targets = Array2::<f64>::zeros((n, n_classes));
        for (row, &label) in y.iter().enumerate() {
            targets[[row, label]] = 1.0;
        }

        let l1 = lambda * alpha;
        let l2 = lambda * (1.0 - alpha);
        // softmax cross-entropy Hessian is bounded by XᵀX / (2n) per class block
        let lipschitz = 0.5 * spectral_norm_sq(&x) / n_f + l2;
        if !(lipschitz.is_finite() && lipschitz > 0.0) {
            return Err(Error::ModelFit {
                reason: format!("degenerate design matrix (Lipschitz bound {lipschitz})"),
            });
        }
        let step = 1.0 / lipschitz;

        let mut weights = Array2::<f64>::zeros((p, n_classes));
        let mut intercepts = Array1::<f64>::zeros(n_classes);

        for iteration in 0..max_iter {
            let mut residual = x.dot(&weights);
            residual += &intercepts;
            softmax_rows(&mut residual);
            residual -= &targets;

            let mut grad_w = x.t().dot(&residual) / n_f;
            grad_w.scaled_add(l2, &weights);
            let grad_b = residual.sum_axis(Axis(0)) / n_f;

            let mut max_delta = 0.0_f64;
            let mut max_weight = 0.0_f64;
            Zip::from(&mut weights).and(&grad_w).for_each(|w, &g| {
                let next = soft_threshold(*w - step * g, step * l1);
                max_delta = max_delta.max((next - *w).abs());
                max_weight = max_weight.max(next.abs());
                *w = next;
            });
            Zip::from(&mut intercepts).and(&grad_b).for_each(|b, &g| {
                let next = *b - step * g;
                max_delta = max_delta.max((next - *b).abs());
                max_weight = max_weight.max(next.abs());
                *b = next;
            });

            if !(max_delta.is_finite() && max_weight.is_finite()) {
                return Err(Error::ModelFit {
                    reason: format!("non-finite coefficients at iteration {iteration}"),
                });
            }
            if max_delta <= LOGISTIC_TOLERANCE * max_weight.max(1.0) {
                trace!("logistic converged after {} iterations", iteration + 1);
                break;
            }
        }

        Ok(LogisticModel {
            weights,
            intercepts,
        })
    }
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

/// Row-wise softmax in place, shifted by the row maximum.
fn softmax_rows(scores: &mut Array2<f64>) {
    for mut row in scores.rows_mut() {
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        row.mapv_inplace(|s| (s - max).exp());
        let total = row.sum();
        row /= total;
    }
}

/// Largest eigenvalue of `[X 1]ᵀ[X 1]`, by power iteration.
fn spectral_norm_sq(x: &Array2<f64>) -> f64 {
    let p = x.ncols();
    let mut v = Array1::<f64>::from_elem(p + 1, 1.0);
    let mut estimate = 0.0;

    for _ in 0..POWER_ITERATIONS {
        let norm = v.dot(&v).sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return estimate;
        }
        v /= norm;

        let u = x.dot(&v.slice(ndarray::s![..p])) + v[p];
        let mut next = Array1::<f64>::zeros(p + 1);
        next.slice_mut(ndarray::s![..p]).assign(&x.t().dot(&u));
        next[p] = u.sum();

        estimate = next.dot(&next).sqrt();
        v = next;
    }
    estimate
}
