//! Model selection: preprocessing, resampling, scoring and cross-validation.

mod metrics;
mod preprocess;
mod resample;
mod trainer;

pub use metrics::{auc_score, class_auc, roc_auc};
pub use preprocess::{NzvThresholds, Preprocessor};
pub use resample::undersample;
pub use trainer::{
    CombinationResult, CombinationStatus, CrossValidation, FittedPipeline, FoldOutcome, Trainer,
    TrainerSettings,
};
