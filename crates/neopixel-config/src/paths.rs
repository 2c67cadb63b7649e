//! Derives the filesystem locations the daemon and producers agree on.
//!
//! Both binaries resolve the same [`Config`] so the operator CLI can find the
//! PID file written by the daemon and producers can find the pipes it reads.
//! Relative settings are anchored to the directory the process was launched
//! from, because the daemon changes into its working directory on detaching.

use std::env;
use std::path::{Path, PathBuf};

use crate::Config;
use crate::defaults::{INBOUND_PIPE_NAME, LOG_FILE_NAME, OUTBOUND_PIPE_NAME};

/// Canonical paths for the artefacts owned by a daemon instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonPaths {
    working_dir: PathBuf,
    pid_file: PathBuf,
    inbound_pipe: PathBuf,
    outbound_pipe: PathBuf,
    log_file: PathBuf,
}

impl DaemonPaths {
    /// Derives the paths from configuration, anchoring relative entries to
    /// the current directory.
    ///
    /// When the current directory cannot be determined relative entries are
    /// kept as configured.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        match env::current_dir() {
            Ok(base) => Self::anchored(config, &base),
            Err(_) => Self::anchored(config, Path::new("")),
        }
    }

    /// Derives the paths from configuration, resolving relative entries
    /// against `base`.
    #[must_use]
    pub fn anchored(config: &Config, base: &Path) -> Self {
        let working_dir = base.join(config.working_dir());
        let pipe_dir = base.join(config.pipe_dir());
        Self {
            pid_file: base.join(config.pid_file()),
            inbound_pipe: pipe_dir.join(INBOUND_PIPE_NAME),
            outbound_pipe: pipe_dir.join(OUTBOUND_PIPE_NAME),
            log_file: working_dir.join(LOG_FILE_NAME),
            working_dir,
        }
    }

    /// Directory the detached daemon runs in.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        self.working_dir.as_path()
    }

    /// Path to the PID file.
    #[must_use]
    pub fn pid_file(&self) -> &Path {
        self.pid_file.as_path()
    }

    /// Pipe the daemon reads command frames from.
    #[must_use]
    pub fn inbound_pipe(&self) -> &Path {
        self.inbound_pipe.as_path()
    }

    /// Pipe reserved for replies to producers.
    #[must_use]
    pub fn outbound_pipe(&self) -> &Path {
        self.outbound_pipe.as_path()
    }

    /// Log file receiving stderr once the daemon detaches.
    #[must_use]
    pub fn log_file(&self) -> &Path {
        self.log_file.as_path()
    }
}
