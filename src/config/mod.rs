//! Configuration management.
//!
//! The primary-key field names are fixed per deployment: they are read once
//! (defaults, then an optional TOML file, then environment overrides) and
//! handed to the core at construction time.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the users primary-key field.
pub const ENV_USERS_KEY: &str = "ACCESS_SETTINGS_USERS_KEY";
/// Environment variable overriding the reports primary-key field.
pub const ENV_REPORTS_KEY: &str = "ACCESS_SETTINGS_REPORTS_KEY";
/// Environment variable overriding the users document path.
pub const ENV_USERS_PATH: &str = "ACCESS_SETTINGS_USERS_PATH";
/// Environment variable overriding the reports document path.
pub const ENV_REPORTS_PATH: &str = "ACCESS_SETTINGS_REPORTS_PATH";
/// Environment variable overriding the export directory.
pub const ENV_EXPORT_DIR: &str = "ACCESS_SETTINGS_EXPORT_DIR";

/// Field names holding each document's identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeys {
    /// Users document key (default `email`).
    pub users: String,
    /// Reports document key (default `link`).
    pub reports: String,
}

impl PrimaryKeys {
    /// Creates a key pair.
    #[must_use]
    pub fn new(users: impl Into<String>, reports: impl Into<String>) -> Self {
        Self {
            users: users.into(),
            reports: reports.into(),
        }
    }
}

impl Default for PrimaryKeys {
    fn default() -> Self {
        Self::new("email", "link")
    }
}

/// Where the host reads sources and writes exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    /// Users document.
    pub users_path: PathBuf,
    /// Reports document.
    pub reports_path: PathBuf,
    /// Directory receiving `users.json` and `reports.json`.
    pub export_dir: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            users_path: PathBuf::from("data/users.json"),
            reports_path: PathBuf::from("data/reports.json"),
            export_dir: PathBuf::from("."),
        }
    }
}

/// Logging settings from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directive (e.g. `access_settings=debug`).
    pub filter: Option<String>,
    /// Log file path; stderr when unset.
    pub file: Option<PathBuf>,
}

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessConfig {
    /// Primary-key field names.
    pub primary_keys: PrimaryKeys,
    /// Source and export locations.
    pub data: DataPaths,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Primary-key section.
    pub primary_keys: Option<ConfigFileKeys>,
    /// Data section.
    pub data: Option<ConfigFileData>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

/// `[primary_keys]` section.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileKeys {
    /// Users key.
    pub users: Option<String>,
    /// Reports key.
    pub reports: Option<String>,
}

/// `[data]` section.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileData {
    /// Users document.
    pub users_path: Option<String>,
    /// Reports document.
    pub reports_path: Option<String>,
    /// Export directory.
    pub export_dir: Option<String>,
}

impl AccessConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or names an
    /// empty primary key.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for [`ConfigFile`] or
    /// names an empty primary key.
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        let config = Self::from_config_file(file);
        config.validate()?;
        Ok(config)
    }

    /// Converts a `ConfigFile` to `AccessConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(keys) = file.primary_keys {
            if let Some(users) = keys.users {
                config.primary_keys.users = users;
            }
            if let Some(reports) = keys.reports {
                config.primary_keys.reports = reports;
            }
        }
        if let Some(data) = file.data {
            if let Some(path) = data.users_path {
                config.data.users_path = PathBuf::from(path);
            }
            if let Some(path) = data.reports_path {
                config.data.reports_path = PathBuf::from(path);
            }
            if let Some(dir) = data.export_dir {
                config.data.export_dir = PathBuf::from(dir);
            }
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        config
    }

    /// Applies `ACCESS_SETTINGS_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an override sets an empty primary key.
    pub fn with_env_overrides(self) -> crate::Result<Self> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary lookup (the environment in
    /// production, a map in tests).
    ///
    /// # Errors
    ///
    /// Returns an error if an override sets an empty primary key.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> crate::Result<Self> {
        if let Some(key) = lookup(ENV_USERS_KEY) {
            self.primary_keys.users = key;
        }
        if let Some(key) = lookup(ENV_REPORTS_KEY) {
            self.primary_keys.reports = key;
        }
        if let Some(path) = lookup(ENV_USERS_PATH) {
            self.data.users_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_REPORTS_PATH) {
            self.data.reports_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup(ENV_EXPORT_DIR) {
            self.data.export_dir = PathBuf::from(dir);
        }
        self.validate()?;
        Ok(self)
    }

    /// Sets the export directory.
    #[must_use]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data.export_dir = dir.into();
        self
    }

    fn validate(&self) -> crate::Result<()> {
        if self.primary_keys.users.trim().is_empty() {
            return Err(crate::Error::InvalidInput(
                "users primary key cannot be empty".to_string(),
            ));
        }
        if self.primary_keys.reports.trim().is_empty() {
            return Err(crate::Error::InvalidInput(
                "reports primary key cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
