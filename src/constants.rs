//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "dronesense";

/// Signal processing defaults.
pub mod signal {
    /// Sample rate shared by every recording in the corpus, in Hz.
    pub const DEFAULT_SAMPLE_RATE: f64 = 40_000_000.0;

    /// Analysis window duration in seconds (4000 samples at the default rate).
    pub const DEFAULT_WINDOW_SECS: f64 = 0.000_1;

    /// Fraction of each window shared with the next one.
    pub const DEFAULT_OVERLAP: f64 = 0.5;

    /// Smallest usable analysis window in samples.
    pub const MIN_WINDOW_SAMPLES: usize = 2;

    /// Amplitude floor applied before decibel conversion.
    pub const AMPLITUDE_FLOOR: f32 = 1e-12;

    /// File extensions read as delimited numeric sample dumps.
    pub const TEXT_EXTENSIONS: &[&str] = &["csv", "txt", "dat"];

    /// File extension read as PCM audio.
    pub const WAV_EXTENSION: &str = "wav";
}

/// Raster defaults.
pub mod raster {
    /// Side length of the square raster canvas.
    pub const DEFAULT_SIZE: usize = 122;

    /// Directory (under the output root) holding rendered rasters.
    pub const DIR_NAME: &str = "rasters";

    /// Raster image extension.
    pub const EXTENSION: &str = "png";
}

/// Dataset defaults.
pub mod dataset {
    /// Native class names in label order.
    pub const DEFAULT_CLASSES: &[&str] = &["ar", "bepop", "phantom", "background"];

    /// Native class that collapses to the background label.
    pub const DEFAULT_BACKGROUND_CLASS: &str = "background";

    /// Binary label for drone transmissions (positive class).
    pub const DRONE_LABEL: &str = "drone";

    /// Binary label for background recordings.
    pub const BACKGROUND_LABEL: &str = "background";

    /// Fraction of each class assigned to the training partition.
    pub const DEFAULT_TRAIN_FRACTION: f64 = 0.75;

    /// Seed for partitioning and resampling.
    pub const DEFAULT_SEED: u64 = 42;
}

/// Model selection defaults.
pub mod training {
    /// Cross-validation fold count.
    pub const DEFAULT_FOLDS: usize = 5;

    /// Near-zero-variance cut on the most/second-most frequent value ratio (95/5).
    pub const DEFAULT_NZV_FREQ_RATIO: f64 = 95.0 / 5.0;

    /// Near-zero-variance cut on the percentage of distinct values.
    pub const DEFAULT_NZV_UNIQUE_PERCENT: f64 = 10.0;

    /// Default elastic-net mixing values for the logistic grid.
    pub const LOGISTIC_ALPHA: &[f64] = &[0.0, 0.5, 1.0];

    /// Default penalty strengths for the logistic grid.
    pub const LOGISTIC_LAMBDA: &[f64] = &[0.000_1, 0.001, 0.01];

    /// Default features-per-split values for the forest grid.
    pub const FOREST_MTRY: &[f64] = &[61.0, 122.0, 244.0];

    /// Default tree count for the forest grid.
    pub const FOREST_TREES: &[f64] = &[100.0];
}

/// Learner defaults used when a hyperparameter is absent from the grid.
pub mod learner {
    /// Maximum proximal-gradient iterations for logistic regression.
    pub const LOGISTIC_MAX_ITER: usize = 300;

    /// Convergence tolerance on the largest coefficient update.
    pub const LOGISTIC_TOLERANCE: f64 = 1e-5;

    /// Power iterations used to estimate the gradient Lipschitz constant.
    pub const POWER_ITERATIONS: usize = 30;

    /// Trees grown when the grid does not set `trees`.
    pub const FOREST_TREES: usize = 100;

    /// Minimum samples in a leaf when the grid does not set `min_node_size`.
    pub const FOREST_MIN_NODE_SIZE: usize = 1;
}

/// Processing defaults.
pub mod processing {
    /// Recordings processed in parallel per batch.
    pub const DEFAULT_BATCH_SIZE: usize = 16;
}

/// Output artifact names.
pub mod output {
    /// Feature table base name.
    pub const FEATURE_TABLE: &str = "features";

    /// Recording identifier column header.
    pub const ID_COLUMN: &str = "id";

    /// Label column header.
    pub const LABEL_COLUMN: &str = "label";

    /// Prefix for pixel column headers.
    pub const PIXEL_PREFIX: &str = "px_";

    /// Failure log file name.
    pub const FAILURE_LOG: &str = "failures.csv";

    /// Run report file name.
    pub const REPORT: &str = "report.json";

    /// Rows buffered per Parquet record batch.
    pub const PARQUET_BATCH_ROWS: usize = 256;
}

/// Current report schema version.
pub const REPORT_VERSION: &str = "1.0";
