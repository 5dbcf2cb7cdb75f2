//! Configuration file loading.

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::Path;

/// Load configuration from a TOML file.
///
/// Returns default config if the file does not exist.
pub fn load_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| Error::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load configuration from an explicit path, falling back to the default location.
///
/// An explicit path that does not exist is an error rather than silently
/// producing defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) if !path.exists() => Err(Error::ConfigRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
        }),
        Some(path) => load_config_file(path),
        None => super::default_config_path()
            .map_or_else(|_| Ok(Config::default()), |path| load_config_file(&path)),
    }
}

/// Save configuration to a TOML file.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::ConfigWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let contents =
        toml::to_string_pretty(config).map_err(|e| Error::ConfigSerialize { source: e })?;

    std::fs::write(path, contents).map_err(|e| Error::ConfigWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::config::WindowFunction;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_nonexistent_file_returns_default() {
        let path = Path::new("/nonexistent/path/config.toml");
        let config = load_config_file(path).unwrap();
        assert_eq!(config.training.folds, 5);
        assert_eq!(config.dataset.background_class, "background");
    }

    #[test]
    fn test_load_explicit_missing_path_is_error() {
        let result = load_config(Some(Path::new("/nonexistent/dronesense.toml")));
        assert!(matches!(result, Err(Error::ConfigRead { .. })));
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[signal]
sample_rate = 1000000.0
window = "hann"

[dataset]
classes = ["mavic", "background"]

[training.grids.logistic]
alpha = [1.0]
lambda = [0.5, 0.05]
"#
        )
        .unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.signal.sample_rate, 1_000_000.0);
        assert_eq!(config.signal.window, WindowFunction::Hann);
        assert_eq!(config.dataset.classes, vec!["mavic", "background"]);
        assert_eq!(config.training.grids.logistic["lambda"], vec![0.5, 0.05]);
        // untouched sections keep their defaults
        assert_eq!(config.raster.size, 122);
        assert!(config.training.grids.forest.contains_key("mtry"));
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();

        let config = load_config_file(file.path());
        assert!(matches!(config, Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_save_then_load_preserves_grids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.training.folds = 3;
        config.training.grids.forest.insert("max_depth".to_string(), vec![8.0]);
        save_config(&config, &path).unwrap();

        let loaded = load_config_file(&path).unwrap();
        assert_eq!(loaded.training.folds, 3);
        assert_eq!(loaded.training.grids.forest["max_depth"], vec![8.0]);
    }
}
