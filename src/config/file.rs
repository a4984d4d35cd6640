//! Settings file loading
//!
//! Handles loading settings from TOML files.

use crate::config::Settings;
use crate::error::SettingsError;

use std::path::{Path, PathBuf};

/// Settings file handler
pub struct ConfigFile;

impl ConfigFile {
    /// Load settings from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings, SettingsError> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| SettingsError::FileNotFound(path.display().to_string()))?;

        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the first default location that exists
    pub fn load_default() -> Option<Settings> {
        for path in Self::default_paths() {
            if path.exists() {
                match Self::load(&path) {
                    Ok(settings) => {
                        log::debug!("Loaded settings from {}", path.display());
                        return Some(settings);
                    }
                    Err(e) => log::warn!("Ignoring {}: {}", path.display(), e),
                }
            }
        }
        None
    }

    /// Get default settings file paths
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // System-wide
        paths.push(PathBuf::from("/etc/tqalert/config.toml"));

        // User
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config/tqalert/config.toml"));
        }

        // Current directory
        paths.push(PathBuf::from("tqalert.toml"));
        paths.push(PathBuf::from(".tqalert.toml"));

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_paths_not_empty() {
        let paths = ConfigFile::default_paths();
        assert_eq!(paths[0], PathBuf::from("/etc/tqalert/config.toml"));
        assert!(paths.contains(&PathBuf::from("tqalert.toml")));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConfigFile::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(SettingsError::FileNotFound(_))));
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nkey = \"otherconf\"\n[paths]\nmarker_dir = \"/data/lastTQ\"").unwrap();

        let settings = ConfigFile::load(file.path()).unwrap();
        assert_eq!(settings.store.key, "otherconf");
        assert_eq!(settings.paths.marker_dir, PathBuf::from("/data/lastTQ"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[general\ninterval_secs = ").unwrap();
        assert!(matches!(
            ConfigFile::load(file.path()),
            Err(SettingsError::TomlError(_))
        ));
    }
}
