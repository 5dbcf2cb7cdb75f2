//! Configuration file location.

use crate::constants::APP_NAME;
use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

/// Configuration file used when `--config` and `DRONESENSE_CONFIG` are unset.
///
/// Lives in the platform config directory, e.g. `~/.config/dronesense/`
/// on Linux.
pub fn default_config_path() -> Result<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
        .ok_or(Error::ConfigDirNotFound)
}

/// The explicit path when given, otherwise [`default_config_path`].
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    explicit.map_or_else(default_config_path, |path| Ok(path.to_path_buf()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_is_app_config_file() {
        let path = default_config_path().unwrap();
        assert!(path.ends_with(Path::new(APP_NAME).join(CONFIG_FILE)));
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = Path::new("/srv/rf/dronesense.toml");
        assert_eq!(resolve_config_path(Some(explicit)).unwrap(), explicit);
        assert_eq!(
            resolve_config_path(None).unwrap(),
            default_config_path().unwrap()
        );
    }
}
