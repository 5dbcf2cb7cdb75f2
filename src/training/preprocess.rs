//! Near-zero-variance filtering and standardization.
//!
//! A [`Preprocessor`] learns every statistic from the rows it is fitted on
//! and applies them unchanged to any other rows.

use crate::config::TrainingConfig;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1, Axis};

/// Thresholds of the near-zero-variance rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NzvThresholds {
    /// Maximum ratio of the most to second most frequent value.
    pub freq_ratio: f64,
    /// Maximum distinct values as a percentage of rows.
    pub unique_percent: f64,
}

impl From<&TrainingConfig> for NzvThresholds {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            freq_ratio: config.nzv_freq_ratio,
            unique_percent: config.nzv_unique_percent,
        }
    }
}

/// Fitted feature filter plus center/scale parameters.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    n_input: usize,
    kept: Vec<usize>,
    means: Vec<f32>,
    scales: Vec<f32>,
}

impl Preprocessor {
    /// Learn the filter and scaling from `x`.
    ///
    /// A feature is dropped when it has a single distinct value, or when its
    /// frequency ratio exceeds the threshold while its distinct-value share
    /// is at or below the threshold. Survivors are centered on the mean and
    /// divided by the sample standard deviation.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn fit(x: &Array2<f32>, thresholds: NzvThresholds) -> Result<Self> {
        let (n, p) = x.dim();
        let mut kept = Vec::new();
        let mut means = Vec::new();
        let mut scales = Vec::new();
        let mut scratch = Vec::with_capacity(n);

        for (j, column) in x.axis_iter(Axis(1)).enumerate() {
            if is_near_zero_variance(column, thresholds, &mut scratch) {
                continue;
            }

            let mean = column.iter().map(|&v| f64::from(v)).sum::<f64>() / n as f64;
            let ss: f64 = column
                .iter()
                .map(|&v| (f64::from(v) - mean).powi(2))
                .sum();
            let sd = (ss / (n.saturating_sub(1).max(1)) as f64).sqrt();
            if !(sd > 0.0 && sd.is_finite()) {
                continue;
            }

            kept.push(j);
            means.push(mean as f32);
            scales.push((1.0 / sd) as f32);
        }

        if kept.is_empty() {
            return Err(Error::NoFeaturesRemaining { total: p });
        }

        Ok(Self {
            n_input: p,
            kept,
            means,
            scales,
        })
    }

    /// Apply the fitted filter and scaling.
    pub fn transform(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.n_input {
            return Err(Error::DimensionMismatch {
                expected: format!("{} features", self.n_input),
                actual: format!("{} features", x.ncols()),
            });
        }

        let mut out = x.select(Axis(1), &self.kept);
        for mut row in out.rows_mut() {
            for ((v, &mean), &scale) in row.iter_mut().zip(&self.means).zip(&self.scales) {
                *v = (*v - mean) * scale;
            }
        }
        Ok(out)
    }

    /// Indices of the retained input features.
    pub fn kept(&self) -> &[usize] {
        &self.kept
    }

    /// Number of input features seen at fit time.
    pub fn n_input(&self) -> usize {
        self.n_input
    }

    /// Fitted means of the retained features.
    pub fn means(&self) -> &[f32] {
        &self.means
    }
}

/// The near-zero-variance rule for one column.
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
fn is_near_zero_variance(
    column: ArrayView1<'_, f32>,
    thresholds: NzvThresholds,
    scratch: &mut Vec<f32>,
) -> bool {
    scratch.clear();
    scratch.extend(column.iter().copied());
    scratch.sort_by(f32::total_cmp);

    let mut distinct = 0_usize;
    let mut first = 0_usize;
    let mut second = 0_usize;
    let mut run = 0_usize;
    for (i, &value) in scratch.iter().enumerate() {
        run += 1;
        let run_ends = scratch.get(i + 1).is_none_or(|&next| next != value);
        if run_ends {
            distinct += 1;
            if run > first {
                second = first;
                first = run;
            } else if run > second {
                second = run;
            }
            run = 0;
        }
    }

    if distinct <= 1 {
        return true;
    }

    let freq_ratio = first as f64 / second as f64;
    let percent_unique = 100.0 * distinct as f64 / scratch.len() as f64;
    freq_ratio > thresholds.freq_ratio && percent_unique <= thresholds.unique_percent
}
