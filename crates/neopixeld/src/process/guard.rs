use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tracing::{info, warn};

use super::PROCESS_TARGET;
use super::errors::LaunchError;

/// Owns the daemon PID file for the lifetime of the process.
///
/// The file is created exclusively, so at most one daemon holds it, and is
/// removed on drop.
#[derive(Debug)]
pub(crate) struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Refuses when `path` names a live process and clears it when the
    /// recorded process is gone.
    ///
    /// Runs before detaching so the operator sees the refusal; [`Self::claim`]
    /// still settles any race afterwards.
    pub(crate) fn check(path: &Path) -> Result<(), LaunchError> {
        match recorded_pid(path)? {
            Some(pid) => clear_stale(path, pid),
            None => Ok(()),
        }
    }

    /// Creates `path` exclusively and records `pid` in it.
    ///
    /// A stale file left by a dead process is cleared and the claim retried
    /// once; a file naming a live process fails with
    /// [`LaunchError::AlreadyRunning`].
    pub(crate) fn claim(path: &Path, pid: u32) -> Result<Self, LaunchError> {
        if let Err(error) = create_exclusive(path, pid) {
            let LaunchError::PidExists { .. } = error else {
                return Err(error);
            };
            if let Some(recorded) = recorded_pid(path)? {
                clear_stale(path, recorded)?;
            }
            create_exclusive(path, pid)?;
        }
        info!(
            target: PROCESS_TARGET,
            pid,
            file = %path.display(),
            "pid file written"
        );
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        self.path.as_path()
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        release(&self.path);
    }
}

/// Like [`read_pid`], but an empty file belongs to a claim still being
/// written by another starting daemon.
fn recorded_pid(path: &Path) -> Result<Option<u32>, LaunchError> {
    match read_pid(path) {
        Err(LaunchError::PidParse { content, .. }) if content.trim().is_empty() => {
            Err(LaunchError::PidExists {
                path: path.to_path_buf(),
            })
        }
        other => other,
    }
}

fn clear_stale(path: &Path, pid: u32) -> Result<(), LaunchError> {
    if check_process(pid)? {
        info!(
            target: PROCESS_TARGET,
            pid,
            "refusing to start: existing daemon alive"
        );
        return Err(LaunchError::AlreadyRunning { pid });
    }
    warn!(
        target: PROCESS_TARGET,
        pid,
        file = %path.display(),
        "existing daemon not detected; removing stale pid file"
    );
    remove_file(path)
}

fn create_exclusive(path: &Path, pid: u32) -> Result<(), LaunchError> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true).mode(0o644);
    let mut file = match options.open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
            return Err(LaunchError::PidExists {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(LaunchError::PidWrite {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let write_error = |source| LaunchError::PidWrite {
        path: path.to_path_buf(),
        source,
    };
    file.write_all(format!("{pid}\n").as_bytes())
        .map_err(write_error)?;
    file.sync_all().map_err(write_error)
}

/// Removes the PID file, logging rather than failing.
pub(crate) fn release(path: &Path) {
    match fs::remove_file(path) {
        Err(error) if error.kind() != io::ErrorKind::NotFound => {
            warn!(
                target: PROCESS_TARGET,
                file = %path.display(),
                error = %error,
                "failed to remove pid file"
            );
        }
        _ => {}
    }
}

/// Reads the PID recorded at `path`; `None` when no file exists.
pub(crate) fn read_pid(path: &Path) -> Result<Option<u32>, LaunchError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LaunchError::PidRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    match content.trim().parse::<u32>() {
        Ok(pid) => Ok(Some(pid)),
        Err(_) => Err(LaunchError::PidParse {
            path: path.to_path_buf(),
            content,
        }),
    }
}

/// Converts a recorded PID into a signal target.
pub(crate) fn target_pid(pid: u32) -> Result<Pid, LaunchError> {
    match i32::try_from(pid) {
        Ok(raw) if raw > 0 => Ok(Pid::from_raw(raw)),
        _ => Err(LaunchError::InvalidPid { pid }),
    }
}

/// Returns whether `pid` names a live process.
pub(crate) fn check_process(pid: u32) -> Result<bool, LaunchError> {
    if pid == 0 {
        return Ok(false);
    }
    match kill(target_pid(pid)?, None) {
        Ok(()) | Err(Errno::EPERM) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(source) => Err(LaunchError::CheckProcess { pid, source }),
    }
}

fn remove_file(path: &Path) -> Result<(), LaunchError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(LaunchError::Cleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}
