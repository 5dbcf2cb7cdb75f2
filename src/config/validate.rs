//! Configuration validation.

use crate::config::{Config, ModelFamily};
use crate::constants::signal::MIN_WINDOW_SAMPLES;
use crate::error::{Error, Result};
use std::collections::HashSet;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_signal(config)?;
    validate_dataset(config)?;
    validate_training(config)?;

    if config.raster.size == 0 {
        return Err(invalid("raster.size must be at least 1"));
    }

    if config.processing.batch_size == 0 {
        return Err(invalid("processing.batch_size must be at least 1"));
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

/// Validate transform settings.
fn validate_signal(config: &Config) -> Result<()> {
    let signal = &config.signal;

    if !(signal.sample_rate.is_finite() && signal.sample_rate > 0.0) {
        return Err(invalid(format!(
            "signal.sample_rate must be positive, got {}",
            signal.sample_rate
        )));
    }

    if !(signal.window_secs.is_finite() && signal.window_secs > 0.0) {
        return Err(invalid(format!(
            "signal.window_secs must be positive, got {}",
            signal.window_secs
        )));
    }

    let window = signal.window_samples();
    if window < MIN_WINDOW_SAMPLES {
        return Err(invalid(format!(
            "analysis window is {window} samples; at least {MIN_WINDOW_SAMPLES} required"
        )));
    }

    if !(0.0..1.0).contains(&signal.overlap) {
        return Err(invalid(format!(
            "signal.overlap must be in [0, 1), got {}",
            signal.overlap
        )));
    }

    Ok(())
}

/// Validate class declarations and partitioning.
fn validate_dataset(config: &Config) -> Result<()> {
    let dataset = &config.dataset;

    if dataset.classes.len() < 2 {
        return Err(invalid("dataset.classes must declare at least two classes"));
    }

    let mut seen = HashSet::new();
    for class in &dataset.classes {
        if class.trim().is_empty() {
            return Err(invalid("dataset.classes contains an empty name"));
        }
        if !seen.insert(class.as_str()) {
            return Err(invalid(format!("dataset.classes lists '{class}' twice")));
        }
    }

    if !seen.contains(dataset.background_class.as_str()) {
        return Err(invalid(format!(
            "dataset.background_class '{}' is not one of the declared classes",
            dataset.background_class
        )));
    }

    if !(dataset.train_fraction > 0.0 && dataset.train_fraction < 1.0) {
        return Err(invalid(format!(
            "dataset.train_fraction must be in (0, 1), got {}",
            dataset.train_fraction
        )));
    }

    Ok(())
}

/// Validate cross-validation and grid settings.
fn validate_training(config: &Config) -> Result<()> {
    let training = &config.training;

    if training.folds < 2 {
        return Err(invalid(format!(
            "training.folds must be at least 2, got {}",
            training.folds
        )));
    }

    if training.nzv_freq_ratio < 1.0 {
        return Err(invalid("training.nzv_freq_ratio must be at least 1"));
    }

    if !(0.0..=100.0).contains(&training.nzv_unique_percent) {
        return Err(invalid("training.nzv_unique_percent must be in [0, 100]"));
    }

    if training.tasks.is_empty() {
        return Err(invalid("training.tasks must name at least one task"));
    }

    if training.families.is_empty() {
        return Err(invalid("training.families must name at least one family"));
    }

    for family in &training.families {
        validate_grid(config, *family)?;
    }

    Ok(())
}

/// Validate one family's grid: non-empty value lists of finite numbers.
pub fn validate_grid(config: &Config, family: ModelFamily) -> Result<()> {
    let grid = config.training.grids.for_family(family);

    let required: &[&str] = match family {
        ModelFamily::Logistic => &["alpha", "lambda"],
        ModelFamily::Forest => &["mtry"],
    };
    for name in required {
        if !grid.contains_key(*name) {
            return Err(invalid(format!(
                "training.grids.{family} must define '{name}'"
            )));
        }
    }

    for (name, values) in grid {
        if values.is_empty() {
            return Err(invalid(format!(
                "training.grids.{family}.{name} has no values"
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(invalid(format!(
                "training.grids.{family}.{name} contains a non-finite value"
            )));
        }
    }

    Ok(())
}
