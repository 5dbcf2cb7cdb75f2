//! Configuration type definitions.

use crate::constants::{dataset, processing, raster, signal, training};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Time-frequency transform settings.
    pub signal: SignalConfig,

    /// Raster rendering and feature orientation settings.
    pub raster: RasterConfig,

    /// Class declaration and partitioning settings.
    pub dataset: DatasetConfig,

    /// Cross-validation and grid search settings.
    pub training: TrainingConfig,

    /// Batch processing settings.
    pub processing: ProcessingConfig,

    /// Output artifact settings.
    pub output: OutputConfig,
}

/// Short-time Fourier transform settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Corpus-wide sample rate in Hz.
    pub sample_rate: f64,

    /// Analysis window duration in seconds.
    pub window_secs: f64,

    /// Taper applied to each analysis window.
    pub window: WindowFunction,

    /// Fraction of each window shared with the next one, in [0, 1).
    pub overlap: f64,

    /// Zero-pad recordings shorter than one window instead of skipping them.
    pub pad_short: bool,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            sample_rate: signal::DEFAULT_SAMPLE_RATE,
            window_secs: signal::DEFAULT_WINDOW_SECS,
            window: WindowFunction::default(),
            overlap: signal::DEFAULT_OVERLAP,
            pad_short: true,
        }
    }
}

impl SignalConfig {
    /// Analysis window length in samples.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn window_samples(&self) -> usize {
        (self.window_secs * self.sample_rate).round().max(0.0) as usize
    }

    /// Hop between consecutive windows in samples (at least 1).
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn step_samples(&self) -> usize {
        let step = (self.window_samples() as f64 * (1.0 - self.overlap)).round();
        (step as usize).max(1)
    }
}

/// Window function applied before each FFT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    /// Hamming window.
    #[default]
    Hamming,
    /// Hann window.
    Hann,
    /// Blackman window.
    Blackman,
    /// No taper.
    Rectangular,
}

/// Raster rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Side length S of the square canvas.
    pub size: usize,

    /// Direction of the amplitude-to-intensity mapping.
    pub color_map: ColorMap,

    /// Amplitude scale applied before mapping.
    pub amplitude_scale: AmplitudeScale,

    /// Flip rasters vertically before feature extraction.
    pub flip_vertical: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            size: raster::DEFAULT_SIZE,
            color_map: ColorMap::default(),
            amplitude_scale: AmplitudeScale::default(),
            flip_vertical: true,
        }
    }
}

/// Amplitude-to-intensity mapping direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMap {
    /// Low amplitude renders bright (white background, dark energy).
    #[default]
    LowBright,
    /// High amplitude renders bright.
    HighBright,
}

/// Amplitude scale used when rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmplitudeScale {
    /// 20·log10 of the magnitude.
    #[default]
    Decibel,
    /// Raw magnitude.
    Linear,
}

/// Class declaration and partitioning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Native class names; each is a corpus subdirectory.
    pub classes: Vec<String>,

    /// Native class collapsed to "background" in the binary view.
    pub background_class: String,

    /// Fraction of each class assigned to the training partition.
    pub train_fraction: f64,

    /// Seed for the train/hold-out partition.
    pub seed: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            classes: dataset::DEFAULT_CLASSES
                .iter()
                .map(ToString::to_string)
                .collect(),
            background_class: dataset::DEFAULT_BACKGROUND_CLASS.to_string(),
            train_fraction: dataset::DEFAULT_TRAIN_FRACTION,
            seed: dataset::DEFAULT_SEED,
        }
    }
}

/// Cross-validation and grid search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of cross-validation folds.
    pub folds: usize,

    /// Undersample majority classes inside every training subset.
    pub undersample: bool,

    /// Near-zero-variance cut on the most/second-most frequent value ratio.
    pub nzv_freq_ratio: f64,

    /// Near-zero-variance cut on the percentage of distinct values.
    pub nzv_unique_percent: f64,

    /// Seed for folds, undersampling and stochastic learners.
    pub seed: u64,

    /// Label views to train.
    pub tasks: Vec<Task>,

    /// Learner families to train.
    pub families: Vec<ModelFamily>,

    /// Hyperparameter grids per learner family.
    pub grids: GridsConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            folds: training::DEFAULT_FOLDS,
            undersample: true,
            nzv_freq_ratio: training::DEFAULT_NZV_FREQ_RATIO,
            nzv_unique_percent: training::DEFAULT_NZV_UNIQUE_PERCENT,
            seed: dataset::DEFAULT_SEED,
            tasks: vec![Task::Binary, Task::Multiclass],
            families: vec![ModelFamily::Logistic, ModelFamily::Forest],
            grids: GridsConfig::default(),
        }
    }
}

/// Named hyperparameter value lists per learner family.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridsConfig {
    /// Logistic regression grid (`alpha`, `lambda`, optional `max_iter`).
    pub logistic: BTreeMap<String, Vec<f64>>,

    /// Random forest grid (`mtry`, optional `trees`, `min_node_size`, `max_depth`).
    pub forest: BTreeMap<String, Vec<f64>>,
}

impl Default for GridsConfig {
    fn default() -> Self {
        Self {
            logistic: BTreeMap::from([
                ("alpha".to_string(), training::LOGISTIC_ALPHA.to_vec()),
                ("lambda".to_string(), training::LOGISTIC_LAMBDA.to_vec()),
            ]),
            forest: BTreeMap::from([
                ("mtry".to_string(), training::FOREST_MTRY.to_vec()),
                ("trees".to_string(), training::FOREST_TREES.to_vec()),
            ]),
        }
    }
}

impl GridsConfig {
    /// Grid declared for a learner family.
    pub fn for_family(&self, family: ModelFamily) -> &BTreeMap<String, Vec<f64>> {
        match family {
            ModelFamily::Logistic => &self.logistic,
            ModelFamily::Forest => &self.forest,
        }
    }
}

/// Label view a model is trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// Drone versus background.
    Binary,
    /// Native class labels.
    Multiclass,
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binary => write!(f, "binary"),
            Self::Multiclass => write!(f, "multiclass"),
        }
    }
}

/// Learner family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// Elastic-net regularized logistic regression.
    Logistic,
    /// Random forest of classification trees.
    Forest,
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logistic => write!(f, "logistic"),
            Self::Forest => write!(f, "forest"),
        }
    }
}

impl std::str::FromStr for ModelFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logistic" | "glmnet" => Ok(Self::Logistic),
            "forest" | "rf" | "ranger" => Ok(Self::Forest),
            other => Err(format!("unknown model family: {other}")),
        }
    }
}

/// Batch processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Recordings processed in parallel per batch.
    pub batch_size: usize,

    /// Worker threads (0 = one per core).
    pub threads: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            batch_size: processing::DEFAULT_BATCH_SIZE,
            threads: 0,
        }
    }
}

/// Output artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Feature table formats to write.
    pub formats: Vec<OutputFormat>,

    /// Write one PNG raster per recording.
    pub save_rasters: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            formats: vec![OutputFormat::Csv],
            save_rasters: true,
        }
    }
}

/// Supported feature table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated values.
    Csv,
    /// Apache Parquet.
    Parquet,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Parquet => write!(f, "parquet"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" | "pq" => Ok(Self::Parquet),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl OutputFormat {
    /// File extension for this format.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}
