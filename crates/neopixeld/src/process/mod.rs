//! Daemon process supervision: privilege check, detachment, PID file, pipes,
//! signals and the operator-side stop.

use std::time::Duration;

mod daemonizer;
mod errors;
mod guard;
mod kill;
mod launch;
mod privilege;
mod signals;
mod state;

pub use daemonizer::{DaemonizeError, Daemonizer, SystemDaemonizer};
pub use errors::LaunchError;
pub use kill::{KillOutcome, STOP_SIGNAL, kill_daemon, stop_daemon};
pub use launch::{LaunchMode, MessageBudget, run_daemon};
pub(crate) use launch::{LaunchPlan, ProcessControl, ServiceDeps, run_daemon_with};
pub use privilege::{PrivilegeSource, SystemPrivilege};
pub use signals::{
    ExitHook, HANDLED_SIGNALS, MonitorHandle, SignalAction, SignalError, SignalMonitor,
    SystemSignalMonitor, signal_action, signal_name,
};
pub use state::LifecycleState;

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// How long `--kill` waits for the daemon to exit after signalling it.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Setting this variable to any value keeps the daemon in the foreground.
pub const FOREGROUND_ENV_VAR: &str = "NEOPIXELD_FOREGROUND";
