//! Cross-validated grid search and the final refit.
//!
//! Every (combination, fold) unit fits its own preprocessing on fold-train
//! rows only, undersamples the transformed fold-train rows, fits the model
//! and scores the untouched fold-validation rows. Units are independent and
//! run on the rayon pool; the only reduction is the per-combination mean.

use super::metrics::auc_score;
use super::preprocess::{NzvThresholds, Preprocessor};
use super::resample::undersample;
use crate::config::{ModelFamily, TrainingConfig};
use crate::dataset::{Dataset, Fold, LabelSet, derive_seed, stratified_folds};
use crate::error::{Error, Result};
use crate::model::{HyperparameterGrid, Hyperparameters, Learner, Model};
use crate::output::inc_progress;
use indicatif::ProgressBar;
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

const FOLD_STREAM: u64 = 0;
const RESAMPLE_STREAM: u64 = 1;
const MODEL_STREAM: u64 = 2;
const FINAL_RESAMPLE_STREAM: u64 = 3;
const FINAL_MODEL_STREAM: u64 = 4;

/// Protocol settings shared by every unit.
#[derive(Debug, Clone, Copy)]
pub struct TrainerSettings {
    /// Number of folds.
    pub folds: usize,
    /// Balance fold-train classes before fitting.
    pub undersample: bool,
    /// Near-zero-variance thresholds.
    pub nzv: NzvThresholds,
    /// Base seed for folds, resampling and learners.
    pub seed: u64,
}

impl From<&TrainingConfig> for TrainerSettings {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            folds: config.folds,
            undersample: config.undersample,
            nzv: NzvThresholds::from(config),
            seed: config.seed,
        }
    }
}

/// Result of one (combination, fold) unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FoldOutcome {
    /// The fold was scored.
    Scored {
        /// Validation AUC.
        auc: f64,
    },
    /// A class had no members on one side of the fold; not scored.
    MissingClass {
        /// Missing class name.
        class: String,
        /// Side of the fold lacking the class.
        side: String,
    },
    /// Preprocessing or fitting failed.
    FitFailed {
        /// Rendered error.
        reason: String,
    },
}

/// Whether a combination can take part in selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationStatus {
    /// At least one scored fold and no fit failure.
    Usable,
    /// A fold fit failed.
    Unusable,
    /// Every fold was skipped.
    NoScoredFolds,
}

/// Cross-validation summary of one hyperparameter combination.
#[derive(Debug, Clone, Serialize)]
pub struct CombinationResult {
    /// The combination.
    pub params: Hyperparameters,
    /// Outcome of every fold, in fold order.
    pub folds: Vec<FoldOutcome>,
    /// Mean AUC over scored folds.
    pub mean_auc: Option<f64>,
    /// Number of scored folds.
    pub scored_folds: usize,
    /// Selection eligibility.
    pub status: CombinationStatus,
}

impl CombinationResult {
    #[allow(clippy::cast_precision_loss)]
    fn from_outcomes(params: Hyperparameters, folds: Vec<FoldOutcome>) -> Self {
        let scores: Vec<f64> = folds
            .iter()
            .filter_map(|outcome| match outcome {
                FoldOutcome::Scored { auc } => Some(*auc),
                _ => None,
            })
            .collect();
        let failed = folds
            .iter()
            .any(|outcome| matches!(outcome, FoldOutcome::FitFailed { .. }));

        let mean_auc = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };
        let status = if failed {
            CombinationStatus::Unusable
        } else if scores.is_empty() {
            CombinationStatus::NoScoredFolds
        } else {
            CombinationStatus::Usable
        };

        Self {
            params,
            folds,
            mean_auc,
            scored_folds: scores.len(),
            status,
        }
    }
}

/// Grid-search results for one learner family, in grid order.
#[derive(Debug, Clone, Serialize)]
pub struct CrossValidation {
    /// Learner family.
    pub family: ModelFamily,
    /// Folds requested.
    pub folds: usize,
    /// One entry per combination.
    pub combinations: Vec<CombinationResult>,
}

impl CrossValidation {
    /// Best usable combination; ties keep the first in grid order.
    pub fn select(&self) -> Result<&CombinationResult> {
        let mut best: Option<(&CombinationResult, f64)> = None;
        for combination in &self.combinations {
            if combination.status != CombinationStatus::Usable {
                continue;
            }
            let Some(score) = combination.mean_auc else {
                continue;
            };
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((combination, score));
            }
        }

        best.map(|(combination, _)| combination)
            .ok_or_else(|| Error::NoUsableCombination {
                family: self.family.to_string(),
            })
    }
}

/// Preprocessor and model fitted on the whole training partition.
#[derive(Debug)]
pub struct FittedPipeline {
    family: ModelFamily,
    params: Hyperparameters,
    label_set: LabelSet,
    preprocessor: Preprocessor,
    model: Box<dyn Model>,
}

impl FittedPipeline {
    /// Learner family.
    pub fn family(&self) -> ModelFamily {
        self.family
    }

    /// Selected hyperparameters.
    pub fn params(&self) -> &Hyperparameters {
        &self.params
    }

    /// Labels the model predicts.
    pub fn label_set(&self) -> &LabelSet {
        &self.label_set
    }

    /// Fitted preprocessing.
    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// Class probabilities for raw feature rows.
    pub fn predict_proba(&self, x: &Array2<f32>) -> Result<Array2<f64>> {
        let z = self.preprocessor.transform(x)?;
        self.model.predict_proba(&z)
    }

    /// Predicted labels for raw feature rows.
    pub fn predict(&self, x: &Array2<f32>) -> Result<Vec<usize>> {
        let z = self.preprocessor.transform(x)?;
        self.model.predict(&z)
    }
}

/// Runs the cross-validation protocol for one learner.
#[derive(Debug)]
pub struct Trainer<'a> {
    learner: &'a dyn Learner,
    settings: TrainerSettings,
}

impl<'a> Trainer<'a> {
    /// Create a trainer.
    pub fn new(learner: &'a dyn Learner, settings: TrainerSettings) -> Self {
        Self { learner, settings }
    }

    /// Folds used for every combination on `training`.
    pub fn folds(&self, training: &Dataset) -> Vec<Fold> {
        stratified_folds(
            training.labels(),
            training.n_classes(),
            self.settings.folds,
            derive_seed(self.settings.seed, &[FOLD_STREAM]),
        )
    }

    /// Score every grid combination on the same stratified folds.
    pub fn cross_validate(
        &self,
        training: &Dataset,
        grid: &HyperparameterGrid,
        progress: Option<&ProgressBar>,
    ) -> CrossValidation {
        let folds = self.folds(training);
        let combinations = grid.combinations();

        let units: Vec<(usize, usize)> = (0..combinations.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();

        let outcomes: Vec<FoldOutcome> = units
            .par_iter()
            .map(|&(c, f)| {
                let outcome = self.run_unit(training, &folds[f], &combinations[c], c, f);
                inc_progress(progress);
                outcome
            })
            .collect();

        let mut outcomes = outcomes.into_iter();
        let results: Vec<CombinationResult> = combinations
            .into_iter()
            .map(|params| {
                let per_fold: Vec<FoldOutcome> = outcomes.by_ref().take(folds.len()).collect();
                CombinationResult::from_outcomes(params, per_fold)
            })
            .collect();

        for result in &results {
            match (result.status, result.mean_auc) {
                (CombinationStatus::Usable, Some(mean)) => info!(
                    "{} [{}]: mean AUC {mean:.4} over {}/{} folds",
                    self.learner.family(),
                    result.params,
                    result.scored_folds,
                    folds.len()
                ),
                (CombinationStatus::Unusable, _) => warn!(
                    "{} [{}]: unusable, a fold fit failed",
                    self.learner.family(),
                    result.params
                ),
                _ => warn!(
                    "{} [{}]: no fold could be scored",
                    self.learner.family(),
                    result.params
                ),
            }
        }

        CrossValidation {
            family: self.learner.family(),
            folds: folds.len(),
            combinations: results,
        }
    }

    fn run_unit(
        &self,
        training: &Dataset,
        fold: &Fold,
        params: &Hyperparameters,
        combination: usize,
        fold_index: usize,
    ) -> FoldOutcome {
        let fold_train = training.subset(&fold.train);
        let fold_validation = training.subset(&fold.validation);

        for (side, dataset) in [("train", &fold_train), ("validation", &fold_validation)] {
            if let Some(missing) = dataset.class_counts().iter().position(|&n| n == 0) {
                debug!(
                    "fold {fold_index}: class {} missing from fold-{side}",
                    training.label_set().name(missing)
                );
                return FoldOutcome::MissingClass {
                    class: training.label_set().name(missing).to_string(),
                    side: side.to_string(),
                };
            }
        }

        let seeds = (
            derive_seed(self.settings.seed, &[RESAMPLE_STREAM, fold_index as u64]),
            derive_seed(
                self.settings.seed,
                &[MODEL_STREAM, combination as u64, fold_index as u64],
            ),
        );

        let scored = fit_preprocessed(
            self.learner,
            &fold_train,
            params,
            &self.settings,
            seeds,
        )
        .and_then(|(preprocessor, model)| {
            let z = preprocessor.transform(&fold_validation.matrix())?;
            model.predict_proba(&z)
        });

        match scored {
            Ok(proba) => match auc_score(&proba, fold_validation.labels()) {
                Some(auc) if auc.is_finite() => FoldOutcome::Scored { auc },
                _ => FoldOutcome::FitFailed {
                    reason: "validation AUC undefined".to_string(),
                },
            },
            Err(e) => FoldOutcome::FitFailed {
                reason: e.render_chain(),
            },
        }
    }

    /// Refit preprocessing and model on the whole training partition.
    pub fn fit_final(
        &self,
        training: &Dataset,
        params: &Hyperparameters,
    ) -> Result<FittedPipeline> {
        let seeds = (
            derive_seed(self.settings.seed, &[FINAL_RESAMPLE_STREAM]),
            derive_seed(self.settings.seed, &[FINAL_MODEL_STREAM]),
        );
        let (preprocessor, model) =
            fit_preprocessed(self.learner, training, params, &self.settings, seeds)?;

        info!(
            "final {} model [{params}] on {} rows, {} of {} features kept",
            self.learner.family(),
            training.len(),
            preprocessor.kept().len(),
            preprocessor.n_input()
        );

        Ok(FittedPipeline {
            family: self.learner.family(),
            params: params.clone(),
            label_set: training.label_set().clone(),
            preprocessor,
            model,
        })
    }
}

/// Preprocess, optionally undersample, then fit.
fn fit_preprocessed(
    learner: &dyn Learner,
    dataset: &Dataset,
    params: &Hyperparameters,
    settings: &TrainerSettings,
    (resample_seed, model_seed): (u64, u64),
) -> Result<(Preprocessor, Box<dyn Model>)> {
    let x = dataset.matrix();
    let preprocessor = Preprocessor::fit(&x, settings.nzv)?;
    let z = preprocessor.transform(&x)?;

    let model = if settings.undersample {
        let keep = undersample(dataset.labels(), dataset.n_classes(), resample_seed);
        let y: Vec<usize> = keep.iter().map(|&i| dataset.labels()[i]).collect();
        learner.fit(
            &z.select(Axis(0), &keep),
            &y,
            dataset.n_classes(),
            params,
            model_seed,
        )?
    } else {
        learner.fit(&z, dataset.labels(), dataset.n_classes(), params, model_seed)?
    };

    Ok((preprocessor, model))
}
