//! Defines the unified error surface for daemon launch and operator control.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use nix::errno::Errno;
use thiserror::Error;

use ortho_config::OrthoError;

use neopixel_wire::PipeError;

use crate::dispatch::RegistryError;
use crate::telemetry::TelemetryError;

use super::daemonizer::DaemonizeError;
use super::signals::SignalError;

/// Errors surfaced while launching, stopping or supervising the daemon.
///
/// Every variant is fatal: the process exits before entering the relay loop.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry could not be initialised.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The effective user is not root.
    #[error("neopixeld must run with root privileges (effective uid {euid})")]
    InsufficientPrivilege {
        /// Effective uid observed at startup.
        euid: u32,
    },
    /// The working directory could not be created.
    #[error("failed to prepare working directory '{path}': {source}")]
    WorkingDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The command registry could not be built.
    #[error("failed to build command registry: {source}")]
    Registry {
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },
    /// A live daemon already owns the PID file.
    #[error("daemon already running with pid {pid}")]
    AlreadyRunning {
        /// PID recorded in the existing PID file.
        pid: u32,
    },
    /// Another daemon holds the PID file and has not yet recorded its pid.
    #[error("pid file '{path}' is held by another starting daemon")]
    PidExists {
        /// PID file path.
        path: PathBuf,
    },
    /// Reading the PID file failed.
    #[error("failed to read pid file '{path}': {source}")]
    PidRead {
        /// PID file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The PID file did not hold a process id.
    #[error("pid file '{path}' does not contain a process id: {content:?}")]
    PidParse {
        /// PID file path.
        path: PathBuf,
        /// File contents as read.
        content: String,
    },
    /// Writing the PID file failed.
    #[error("failed to write pid file '{path}': {source}")]
    PidWrite {
        /// PID file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Removing a stale PID file failed.
    #[error("failed to remove stale file '{path}': {source}")]
    Cleanup {
        /// Path of the artefact that could not be removed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The recorded PID cannot name a process on this platform.
    #[error("pid {pid} is out of range")]
    InvalidPid {
        /// Offending PID.
        pid: u32,
    },
    /// Checking whether an existing PID is alive failed.
    #[error("failed to check existing process {pid}: {source}")]
    CheckProcess {
        /// PID that could not be checked.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
    /// Delivering the stop signal failed.
    #[error("failed to signal process {pid}: {source}")]
    Signal {
        /// Target PID.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
    /// The signalled daemon did not exit in time.
    #[error("daemon {pid} still running after {}s", waited.as_secs())]
    StillRunning {
        /// Target PID.
        pid: u32,
        /// Time spent waiting.
        waited: Duration,
    },
    /// Daemonisation failed.
    #[error("failed to daemonise: {source}")]
    Daemonize {
        /// Underlying daemonisation error.
        #[source]
        source: DaemonizeError,
    },
    /// A pipe could not be prepared.
    #[error("failed to prepare pipes: {source}")]
    Pipes {
        /// Underlying transport error.
        #[source]
        source: PipeError,
    },
    /// Signal handling could not be installed.
    #[error("failed to install signal handling: {source}")]
    Signals {
        /// Underlying signal error.
        #[source]
        source: SignalError,
    },
}

impl From<Arc<OrthoError>> for LaunchError {
    fn from(source: Arc<OrthoError>) -> Self {
        Self::Config { source }
    }
}

impl From<TelemetryError> for LaunchError {
    fn from(source: TelemetryError) -> Self {
        Self::Telemetry { source }
    }
}

impl From<RegistryError> for LaunchError {
    fn from(source: RegistryError) -> Self {
        Self::Registry { source }
    }
}

impl From<DaemonizeError> for LaunchError {
    fn from(source: DaemonizeError) -> Self {
        Self::Daemonize { source }
    }
}

impl From<PipeError> for LaunchError {
    fn from(source: PipeError) -> Self {
        Self::Pipes { source }
    }
}

impl From<SignalError> for LaunchError {
    fn from(source: SignalError) -> Self {
        Self::Signals { source }
    }
}
