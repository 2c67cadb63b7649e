//! Shared configuration for the neopixel relay daemon and its producer CLI.
//!
//! Values are layered by `ortho_config`: built-in defaults, then a
//! configuration file, then `NEOPIXELD_*` environment variables, then command
//! line flags. Every field is optional so the accessors can fall back to the
//! defaults in [`defaults`] when no layer supplies a value.

pub mod defaults;
mod logging;
mod paths;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DAEMON_NAME, DEFAULT_LOG_FILTER, DEFAULT_PID_FILE, DEFAULT_PIXEL_COUNT, DEFAULT_WORKING_DIR,
    default_log_filter, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use paths::DaemonPaths;

/// Layered configuration shared by `neopixeld` and `neopixel`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, OrthoConfig)]
#[ortho_config(prefix = "NEOPIXELD")]
pub struct Config {
    /// Tracing filter directive, for example `info` or `neopixeld=debug`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    /// Output format for log events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_format: Option<LogFormat>,
    /// Directory the daemon creates and switches into when detaching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<Utf8PathBuf>,
    /// Location of the PID file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid_file: Option<Utf8PathBuf>,
    /// Directory holding the inbound and outbound pipes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_dir: Option<Utf8PathBuf>,
    /// Number of addressable elements on the strip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_count: Option<usize>,
}

impl Config {
    /// Effective log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Effective log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }

    /// Effective working directory.
    #[must_use]
    pub fn working_dir(&self) -> &Utf8Path {
        self.working_dir
            .as_deref()
            .unwrap_or_else(|| Utf8Path::new(DEFAULT_WORKING_DIR))
    }

    /// Effective PID file path.
    #[must_use]
    pub fn pid_file(&self) -> &Utf8Path {
        self.pid_file
            .as_deref()
            .unwrap_or_else(|| Utf8Path::new(DEFAULT_PID_FILE))
    }

    /// Effective pipe directory; the working directory unless overridden.
    #[must_use]
    pub fn pipe_dir(&self) -> &Utf8Path {
        self.pipe_dir
            .as_deref()
            .unwrap_or_else(|| self.working_dir())
    }

    /// Effective number of strip elements.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.pixel_count.unwrap_or(DEFAULT_PIXEL_COUNT)
    }

    /// Derives the daemon's filesystem layout.
    #[must_use]
    pub fn paths(&self) -> DaemonPaths {
        DaemonPaths::from_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_configuration_uses_defaults() {
        let config = Config::default();
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.working_dir(), Utf8Path::new("/var/lib/neopixeld"));
        assert_eq!(config.pid_file(), Utf8Path::new("/var/run/neopixeld.pid"));
        assert_eq!(config.pipe_dir(), config.working_dir());
        assert_eq!(config.pixel_count(), 36);
    }

    #[test]
    fn explicit_values_take_precedence_over_defaults() {
        let config = Config {
            log_filter: Some(String::from("neopixeld=debug")),
            log_format: Some(LogFormat::Compact),
            working_dir: Some(Utf8PathBuf::from("/tmp/neopixeld")),
            pixel_count: Some(12),
            ..Config::default()
        };
        assert_eq!(config.log_filter(), "neopixeld=debug");
        assert_eq!(config.log_format(), LogFormat::Compact);
        assert_eq!(config.pipe_dir(), Utf8Path::new("/tmp/neopixeld"));
        assert_eq!(config.pixel_count(), 12);
    }
}
