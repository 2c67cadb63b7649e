//! Operator-side stop of a running daemon.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use tracing::{info, warn};

use crate::loader::ConfigLoader;
use crate::telemetry;

use super::errors::LaunchError;
use super::guard::{check_process, read_pid, target_pid};
use super::privilege::{PrivilegeSource, ensure_privileged};
use super::{PROCESS_TARGET, SHUTDOWN_TIMEOUT};

/// Signal sent by [`kill_daemon`]; the daemon only exits on interrupt.
pub const STOP_SIGNAL: Signal = Signal::SIGINT;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    /// No PID file was present.
    NotRunning,
    /// The PID file named a process that no longer exists.
    Stale {
        /// Recorded PID.
        pid: u32,
    },
    /// The daemon received [`STOP_SIGNAL`] and exited.
    Stopped {
        /// Recorded PID.
        pid: u32,
    },
}

/// Signals the daemon recorded in `pid_file` and waits up to `timeout` for it
/// to exit.
///
/// A missing PID file is not an error.
///
/// # Errors
///
/// Returns [`LaunchError::StillRunning`] if the process outlives `timeout`,
/// and PID file or signalling errors otherwise.
pub fn kill_daemon(pid_file: &Path, timeout: Duration) -> Result<KillOutcome, LaunchError> {
    let Some(pid) = read_pid(pid_file)? else {
        info!(
            target: PROCESS_TARGET,
            file = %pid_file.display(),
            "no pid file; nothing to stop"
        );
        return Ok(KillOutcome::NotRunning);
    };
    match kill(target_pid(pid)?, STOP_SIGNAL) {
        Ok(()) => {}
        Err(Errno::ESRCH) => {
            warn!(target: PROCESS_TARGET, pid, "pid file names no running process");
            return Ok(KillOutcome::Stale { pid });
        }
        Err(source) => return Err(LaunchError::Signal { pid, source }),
    }
    info!(target: PROCESS_TARGET, pid, signal = STOP_SIGNAL.as_str(), "stop signal sent");
    wait_for_exit(pid, timeout)?;
    info!(target: PROCESS_TARGET, pid, "daemon stopped");
    Ok(KillOutcome::Stopped { pid })
}

/// Loads configuration, checks privileges and stops the daemon named by the
/// configured PID file, waiting up to [`SHUTDOWN_TIMEOUT`].
///
/// # Errors
///
/// Returns a [`LaunchError`] when configuration, telemetry or the privilege
/// check fails, or when [`kill_daemon`] does.
pub fn stop_daemon<L, P>(loader: &L, privilege: &P) -> Result<KillOutcome, LaunchError>
where
    L: ConfigLoader,
    P: PrivilegeSource,
{
    let config = loader.load()?;
    telemetry::initialise(&config)?;
    ensure_privileged(privilege)?;
    kill_daemon(config.paths().pid_file(), SHUTDOWN_TIMEOUT)
}

fn wait_for_exit(pid: u32, timeout: Duration) -> Result<(), LaunchError> {
    let started = Instant::now();
    while check_process(pid)? {
        if started.elapsed() >= timeout {
            return Err(LaunchError::StillRunning {
                pid,
                waited: timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::process::ExitStatusExt;
    use std::process::Command;
    use tempfile::TempDir;

    use camino::Utf8PathBuf;
    use neopixel_config::Config;

    use crate::loader::StaticConfigLoader;

    struct FixedUid(u32);

    impl PrivilegeSource for FixedUid {
        fn effective_uid(&self) -> u32 {
            self.0
        }
    }

    fn loader_for(dir: &TempDir) -> StaticConfigLoader {
        let pid_file = Utf8PathBuf::from_path_buf(dir.path().join("neopixeld.pid"))
            .expect("utf8 temp path");
        StaticConfigLoader::new(Config {
            pid_file: Some(pid_file),
            ..Config::default()
        })
    }

    #[test]
    fn missing_pid_file_is_a_no_op() {
        let dir = TempDir::new().expect("create temp dir");
        let outcome = kill_daemon(&dir.path().join("neopixeld.pid"), Duration::from_secs(1))
            .expect("kill succeeds");
        assert_eq!(outcome, KillOutcome::NotRunning);
    }

    #[test]
    fn interrupts_the_recorded_process() {
        let dir = TempDir::new().expect("create temp dir");
        let pid_file = dir.path().join("neopixeld.pid");
        let mut child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawn sleeper");
        let pid = child.id();
        fs::write(&pid_file, format!("{pid}\n")).expect("write pid");
        // Reap concurrently so the exited child does not linger as a zombie.
        let waiter = thread::spawn(move || child.wait());

        let outcome = kill_daemon(&pid_file, Duration::from_secs(5)).expect("kill succeeds");

        assert_eq!(outcome, KillOutcome::Stopped { pid });
        let status = waiter
            .join()
            .expect("waiter thread")
            .expect("wait for sleeper");
        assert_eq!(status.signal(), Some(Signal::SIGINT as i32));
    }

    #[test]
    fn stale_pid_files_are_reported() {
        let dir = TempDir::new().expect("create temp dir");
        let pid_file = dir.path().join("neopixeld.pid");
        let mut child = Command::new("true").spawn().expect("spawn child");
        let pid = child.id();
        child.wait().expect("reap child");
        fs::write(&pid_file, format!("{pid}\n")).expect("write pid");

        let outcome = kill_daemon(&pid_file, Duration::from_secs(1)).expect("kill succeeds");
        assert_eq!(outcome, KillOutcome::Stale { pid });
    }

    #[test]
    fn stopping_requires_root() {
        let dir = TempDir::new().expect("create temp dir");
        let error = stop_daemon(&loader_for(&dir), &FixedUid(1000)).expect_err("non-root");
        assert!(matches!(error, LaunchError::InsufficientPrivilege { euid: 1000 }));
    }

    #[test]
    fn stopping_uses_the_configured_pid_file() {
        let dir = TempDir::new().expect("create temp dir");
        let outcome = stop_daemon(&loader_for(&dir), &FixedUid(0)).expect("stop succeeds");
        assert_eq!(outcome, KillOutcome::NotRunning);
    }
}
