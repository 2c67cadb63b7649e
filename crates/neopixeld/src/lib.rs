//! The `neopixeld` command relay daemon.
//!
//! Producers write length-prefixed JSON command envelopes to a named pipe;
//! the daemon reads them one at a time, resolves each command by name and
//! drives a pixel strip. Bad input never stops the relay: every failure is
//! logged with its category and the loop waits for the next message.
//!
//! Startup runs as a fixed sequence recorded through [`HealthReporter`]:
//! configuration and telemetry, the root privilege check, the working
//! directory and PID file, optional detachment, pipe creation, signal
//! handling, then the relay loop. `SIGINT` is the only signal that ends the
//! daemon; `SIGTERM` and `SIGHUP` are logged and ignored.
//!
//! The operator surface lives in [`run`]: `--start`, `--kill` and
//! `--foreground`, with configuration flags forwarded to [`ConfigLoader`].

pub mod actuator;
mod cli;
pub mod dispatch;
mod health;
mod loader;
mod process;
mod relay;
mod telemetry;

pub use cli::run;
pub use health::{HealthReporter, StructuredHealthReporter};
pub use loader::{ArgsConfigLoader, ConfigLoader, StaticConfigLoader};
pub use process::{
    DaemonizeError, Daemonizer, FOREGROUND_ENV_VAR, KillOutcome, LaunchError, LaunchMode,
    LifecycleState, MessageBudget, PrivilegeSource, SHUTDOWN_TIMEOUT, STOP_SIGNAL, SignalError,
    kill_daemon, run_daemon, stop_daemon,
};
pub use relay::{Relay, RelayError, RelayFailure, RelaySummary};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
