//! JSON run report.

use crate::config::{ModelFamily, Task};
use crate::constants::REPORT_VERSION;
use crate::dataset::{Corpus, LabelSet};
use crate::error::{Error, Result};
use crate::evaluation::EvaluationResult;
use crate::model::Hyperparameters;
use crate::training::CrossValidation;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Summary of a training run across every task and family.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Report schema version.
    pub report_version: String,
    /// When the report was created.
    pub timestamp: DateTime<Utc>,
    /// Host that produced the report.
    pub host: String,
    /// Corpus the models were trained on.
    pub corpus: CorpusSummary,
    /// One entry per configured task.
    pub tasks: Vec<TaskReport>,
}

/// Corpus size and composition.
#[derive(Debug, Clone, Serialize)]
pub struct CorpusSummary {
    /// Recordings in the corpus.
    pub recordings: usize,
    /// Recordings that could not be processed.
    pub failures: usize,
    /// Features per recording.
    pub features: usize,
    /// Recordings per native class.
    pub classes: Vec<ClassCount>,
}

/// Number of recordings in one class.
#[derive(Debug, Clone, Serialize)]
pub struct ClassCount {
    /// Class name.
    pub class: String,
    /// Recordings.
    pub count: usize,
}

impl CorpusSummary {
    /// Summarize a corpus.
    pub fn new(corpus: &Corpus, failures: usize) -> Self {
        let mut counts = vec![0; corpus.label_set().len()];
        for &label in corpus.labels() {
            counts[label] += 1;
        }
        Self {
            recordings: corpus.len(),
            failures,
            features: corpus.n_features(),
            classes: corpus
                .label_set()
                .names()
                .iter()
                .zip(counts)
                .map(|(class, count)| ClassCount {
                    class: class.clone(),
                    count,
                })
                .collect(),
        }
    }
}

/// Results for one label view.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    /// Label view.
    pub task: Task,
    /// Classes of the view.
    pub classes: LabelSet,
    /// Training partition size per class.
    pub training_counts: Vec<usize>,
    /// Hold-out partition size per class.
    pub holdout_counts: Vec<usize>,
    /// One entry per configured family.
    pub models: Vec<ModelReport>,
}

/// Selection and hold-out results for one family.
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    /// Learner family.
    pub family: ModelFamily,
    /// Selected combination.
    pub selected: Hyperparameters,
    /// Full cross-validation table.
    pub cross_validation: CrossValidation,
    /// Hold-out evaluation of the refitted pipeline.
    pub evaluation: EvaluationResult,
}

impl RunReport {
    /// Create a report stamped with the current time and host.
    pub fn new(corpus: CorpusSummary, tasks: Vec<TaskReport>) -> Self {
        Self {
            report_version: REPORT_VERSION.to_string(),
            timestamp: Utc::now(),
            host: hostname::get().map_or_else(
                |_| "unknown".to_string(),
                |h| h.to_string_lossy().into_owned(),
            ),
            corpus,
            tasks,
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|e| Error::JsonWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
