//! Error types for dronesense.

use std::path::PathBuf;

/// Result type alias for dronesense operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for dronesense.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Corpus root does not exist or is not a directory.
    #[error("corpus directory not found: {path}")]
    CorpusNotFound {
        /// Path to the corpus root.
        path: PathBuf,
    },

    /// A declared class has no usable examples.
    #[error("class '{class}' has no examples")]
    EmptyClass {
        /// Name of the empty class.
        class: String,
    },

    /// Two recordings in the corpus share an identifier.
    #[error("duplicate recording id '{id}': '{first}' and '{second}'")]
    DuplicateRecording {
        /// Shared identifier.
        id: String,
        /// Recording found first.
        first: PathBuf,
        /// Recording that collides with it.
        second: PathBuf,
    },

    /// Failed to open or read a recording.
    #[error("failed to read recording '{path}'")]
    RecordingRead {
        /// Path to the recording.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Recording content is not a numeric sample sequence.
    #[error("malformed recording '{path}': {reason}")]
    MalformedRecording {
        /// Path to the recording.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// Recording sample rate differs from the corpus rate.
    #[error("recording '{path}' has sample rate {actual} Hz, expected {expected} Hz")]
    SampleRateMismatch {
        /// Path to the recording.
        path: PathBuf,
        /// Rate declared by the recording.
        actual: f64,
        /// Configured corpus rate.
        expected: f64,
    },

    /// Recording is shorter than one analysis window and padding is disabled.
    #[error("recording too short: {samples} samples, window needs {window}")]
    RecordingTooShort {
        /// Number of samples in the recording.
        samples: usize,
        /// Analysis window length in samples.
        window: usize,
    },

    /// FFT computation failed.
    #[error("spectrum computation failed: {reason}")]
    Fft {
        /// Description of the failure.
        reason: String,
    },

    /// Array shape does not match what the operation expects.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension description.
        expected: String,
        /// Actual dimension description.
        actual: String,
    },

    /// Failed to write a raster image.
    #[error("failed to write raster '{path}'")]
    RasterWrite {
        /// Path to the raster image.
        path: PathBuf,
        /// Underlying image error.
        #[source]
        source: image::ImageError,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to read the feature table.
    #[error("failed to read feature table '{path}'")]
    FeatureTableRead {
        /// Path to the table.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Feature table content does not match the expected schema.
    #[error("invalid feature table: {message}")]
    InvalidFeatureTable {
        /// Description of the schema violation.
        message: String,
    },

    /// Failed to write a CSV artifact.
    #[error("failed to write CSV file '{path}'")]
    CsvWrite {
        /// Path to the CSV file.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Failed to create Parquet file.
    #[error("failed to create Parquet file '{path}'")]
    ParquetFileCreate {
        /// Path to the Parquet file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write Parquet data.
    #[error("Parquet write error: {context}")]
    ParquetWrite {
        /// Context of the failure.
        context: String,
        /// Underlying Parquet error.
        #[source]
        source: parquet::errors::ParquetError,
    },

    /// Failed to build an Arrow record batch.
    #[error("Arrow error: {context}")]
    Arrow {
        /// Context of the failure.
        context: String,
        /// Underlying Arrow error.
        #[source]
        source: arrow::error::ArrowError,
    },

    /// Failed to write JSON output file.
    #[error("failed to write JSON output file '{path}'")]
    JsonWrite {
        /// Path to the JSON file.
        path: PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// A partition lost every member of a class.
    #[error("{partition} partition has no examples of class '{class}'")]
    PartitionClassMissing {
        /// Name of the missing class.
        class: String,
        /// Partition name (training or hold-out).
        partition: String,
    },

    /// A required hyperparameter is absent.
    #[error("hyperparameter '{name}' is required by the {family} learner")]
    HyperparameterMissing {
        /// Hyperparameter name.
        name: String,
        /// Learner family.
        family: String,
    },

    /// A hyperparameter value is out of range.
    #[error("invalid hyperparameter {name}={value}: {reason}")]
    InvalidHyperparameter {
        /// Hyperparameter name.
        name: String,
        /// Offending value.
        value: f64,
        /// Why the value is rejected.
        reason: String,
    },

    /// Model fitting failed or produced a degenerate model.
    #[error("model fit failed: {reason}")]
    ModelFit {
        /// Description of the failure.
        reason: String,
    },

    /// No preprocessing features survived the variance filter.
    #[error("all {total} features were removed by the near-zero-variance filter")]
    NoFeaturesRemaining {
        /// Number of input features.
        total: usize,
    },

    /// Every hyperparameter combination was excluded from selection.
    #[error("no usable hyperparameter combination for the {family} learner")]
    NoUsableCombination {
        /// Learner family.
        family: String,
    },

    /// Failed to configure the worker pool.
    #[error("failed to configure worker pool: {reason}")]
    ThreadPool {
        /// Description of the failure.
        reason: String,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Render this error followed by its source chain, separated by `: `.
    pub fn render_chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            source = cause.source();
        }
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_chain_includes_sources() {
        let err = Error::RecordingRead {
            path: PathBuf::from("/corpus/ar/r.csv"),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such file",
            )),
        };
        assert_eq!(
            err.render_chain(),
            "failed to read recording '/corpus/ar/r.csv': no such file"
        );
    }

    #[test]
    fn test_render_chain_without_source() {
        let err = Error::EmptyClass {
            class: "ar".to_string(),
        };
        assert_eq!(err.render_chain(), "class 'ar' has no examples");
    }
}
