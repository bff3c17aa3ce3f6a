//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Default filter when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "warn";
/// Filter used with `--verbose` when nothing more specific is set.
pub const VERBOSE_FILTER: &str = "access_settings=debug,warn";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name. Unknown names fall back to pretty.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Event filter.
    pub filter: EnvFilter,
    /// Log file; stderr when unset.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds the configuration from the `[logging]` section.
    ///
    /// Filter precedence: `RUST_LOG`, then the configured filter, then the
    /// verbose or default filter.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        Self::from_settings_with(settings, verbose, std::env::var("RUST_LOG").ok())
    }

    fn from_settings_with(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        rust_log: Option<String>,
    ) -> Self {
        let format = settings
            .and_then(|s| s.format.as_deref())
            .map_or(LogFormat::Pretty, LogFormat::parse);
        let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
        let directive = rust_log
            .filter(|value| !value.trim().is_empty())
            .or_else(|| settings.and_then(|s| s.filter.clone()))
            .unwrap_or_else(|| fallback.to_string());
        let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(fallback));

        Self {
            format,
            filter,
            file: settings.and_then(|s| s.file.clone()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: EnvFilter::new(DEFAULT_FILTER),
            file: None,
        }
    }
}
