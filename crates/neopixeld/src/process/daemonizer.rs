//! Implements the daemonisation backend for the `neopixeld` process.

use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use daemonize_me::Daemon;
use thiserror::Error;
use tracing::info;

use neopixel_config::DaemonPaths;

use super::PROCESS_TARGET;

/// Abstraction over daemonisation strategies.
pub trait Daemonizer: Send + Sync {
    /// Detaches the process into the background inside the working directory.
    fn daemonize(&self, paths: &DaemonPaths) -> Result<(), DaemonizeError>;
}

/// Errors surfaced by the daemonisation backend.
#[derive(Debug, Error)]
pub enum DaemonizeError {
    /// The log file receiving detached output could not be opened.
    #[error("failed to open log file '{path}': {source}")]
    LogFile {
        /// Log file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// System-level daemonisation failed.
    #[error("{0}")]
    System(#[from] daemonize_me::DaemonError),
}

/// Daemoniser that delegates to `daemonize-me`.
///
/// Standard output and standard error are redirected to the log file in the
/// working directory so telemetry survives detachment.
#[derive(Debug, Default)]
pub struct SystemDaemonizer;

impl SystemDaemonizer {
    /// Builds a new system daemoniser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Daemonizer for SystemDaemonizer {
    fn daemonize(&self, paths: &DaemonPaths) -> Result<(), DaemonizeError> {
        info!(
            target: PROCESS_TARGET,
            working_dir = %paths.working_dir().display(),
            log = %paths.log_file().display(),
            "daemonising into background"
        );
        let stdout = open_log(paths.log_file())?;
        let stderr = stdout
            .try_clone()
            .map_err(|source| DaemonizeError::LogFile {
                path: paths.log_file().to_path_buf(),
                source,
            })?;
        Daemon::new()
            .work_dir(paths.working_dir())
            .name(OsStr::new(env!("CARGO_PKG_NAME")))
            .stdout(stdout)
            .stderr(stderr)
            .start()?;
        info!(
            target: PROCESS_TARGET,
            "daemon process detached; continuing in child"
        );
        Ok(())
    }
}

fn open_log(path: &Path) -> Result<File, DaemonizeError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| DaemonizeError::LogFile {
            path: path.to_path_buf(),
            source,
        })
}
