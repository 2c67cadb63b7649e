//! Maps process signals to lifecycle actions.
//!
//! `SIGTERM` and `SIGHUP` are acknowledged in the log and otherwise ignored;
//! the relay keeps running. `SIGINT` is the only signal that ends the daemon.
//! Signals are observed on a dedicated thread so the relay loop can stay
//! blocked on its pipe; that thread never runs commands.

use std::io;
use std::thread::{self, JoinHandle};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use thiserror::Error;
use tracing::{info, warn};

use super::PROCESS_TARGET;

/// Signals the daemon installs handlers for.
pub const HANDLED_SIGNALS: [i32; 3] = [SIGTERM, SIGHUP, SIGINT];

/// What the daemon does when a handled signal arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Record the signal and keep relaying.
    Log,
    /// Release runtime files and exit with status 0.
    Exit,
}

/// Looks up the action for `signal`; `None` for signals the daemon ignores.
#[must_use]
pub const fn signal_action(signal: i32) -> Option<SignalAction> {
    match signal {
        SIGTERM | SIGHUP => Some(SignalAction::Log),
        SIGINT => Some(SignalAction::Exit),
        _ => None,
    }
}

/// Human-readable signal name for logs.
#[must_use]
pub const fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGTERM => "SIGTERM",
        SIGHUP => "SIGHUP",
        SIGINT => "SIGINT",
        _ => "unknown",
    }
}

/// Callback run on the signal thread when [`SignalAction::Exit`] fires.
pub type ExitHook = Box<dyn Fn() + Send + 'static>;

/// Errors reported while installing signal handling.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Registering the handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The listener thread could not be started.
    #[error("failed to spawn signal listener: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Abstraction over signal delivery so launches can run without handlers.
pub trait SignalMonitor: Send + Sync {
    /// Starts observing [`HANDLED_SIGNALS`], calling `on_exit` for
    /// [`SignalAction::Exit`].
    fn install(&self, on_exit: ExitHook) -> Result<MonitorHandle, SignalError>;
}

/// Keeps the signal listener alive; closing it stops the thread.
pub struct MonitorHandle {
    listener: Option<(Handle, JoinHandle<()>)>,
}

impl MonitorHandle {
    /// A handle with no listener behind it.
    #[must_use]
    pub const fn inert() -> Self {
        Self { listener: None }
    }

    /// Stops the listener thread and waits for it to finish.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some((handle, thread)) = self.listener.take() {
            handle.close();
            if thread.join().is_err() {
                warn!(target: PROCESS_TARGET, "signal listener panicked");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Monitor backed by `signal-hook`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSignalMonitor;

impl SignalMonitor for SystemSignalMonitor {
    fn install(&self, on_exit: ExitHook) -> Result<MonitorHandle, SignalError> {
        let mut signals =
            Signals::new(HANDLED_SIGNALS).map_err(|source| SignalError::Install { source })?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name(String::from("neopixeld-signals"))
            .spawn(move || {
                for signal in signals.forever() {
                    dispatch_signal(signal, on_exit.as_ref());
                }
            })
            .map_err(|source| SignalError::Spawn { source })?;
        Ok(MonitorHandle {
            listener: Some((handle, thread)),
        })
    }
}

fn dispatch_signal(signal: i32, on_exit: &(dyn Fn() + Send)) {
    let name = signal_name(signal);
    match signal_action(signal) {
        Some(SignalAction::Log) => {
            info!(
                target: PROCESS_TARGET,
                signal = name,
                "signal received; relay keeps running"
            );
        }
        Some(SignalAction::Exit) => {
            info!(target: PROCESS_TARGET, signal = name, "signal received; exiting");
            on_exit();
        }
        None => {}
    }
}
