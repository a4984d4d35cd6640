//! Settings builder
//!
//! Merges settings from files and CLI arguments.

use crate::config::{ConfigFile, Settings};
use crate::error::SettingsError;

/// Builder for merging settings sources
pub struct ConfigBuilder {
    settings: Settings,
}

impl ConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
        }
    }

    /// Load settings from an explicit file, or the first default location
    ///
    /// An explicit path that cannot be loaded is an error; missing default
    /// files are not.
    pub fn with_file(mut self, path: Option<&str>) -> Result<Self, SettingsError> {
        let file_settings = match path {
            Some(path) => Some(ConfigFile::load(path)?),
            None => ConfigFile::load_default(),
        };

        if let Some(settings) = file_settings {
            self.settings = settings;
        }

        Ok(self)
    }

    /// Override with CLI verbose flag
    pub fn with_verbose(mut self, verbose: Option<bool>) -> Self {
        if let Some(v) = verbose {
            self.settings.general.verbose = v;
        }
        self
    }

    /// Override with CLI dry-run flag
    pub fn with_dry_run(mut self, dry_run: Option<bool>) -> Self {
        if let Some(d) = dry_run {
            self.settings.general.dry_run = d;
        }
        self
    }

    /// Override with CLI interval
    pub fn with_interval(mut self, interval: Option<u64>) -> Self {
        if let Some(i) = interval {
            self.settings.general.interval_secs = i;
        }
        self
    }

    /// Override with CLI UTC flag
    pub fn with_utc(mut self, utc: Option<bool>) -> Self {
        if let Some(u) = utc {
            self.settings.general.utc = u;
        }
        self
    }

    /// Build and validate the final settings
    pub fn build(self) -> Result<Settings, SettingsError> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
