//! Configuration loading and management.

mod file;
mod paths;
mod types;
mod validate;

pub use file::{load_config, load_config_file, save_config};
pub use paths::{default_config_path, resolve_config_path};
pub use types::{
    AmplitudeScale, ColorMap, Config, DatasetConfig, GridsConfig, ModelFamily, OutputConfig,
    OutputFormat, ProcessingConfig, RasterConfig, SignalConfig, Task, TrainingConfig,
    WindowFunction,
};
pub use validate::{validate_config, validate_grid};
