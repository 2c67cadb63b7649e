//! Supervises daemon launch sequencing and the relay loop.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use neopixel_wire::{InboundMessages, PipeError, ensure_fifo};

use crate::actuator::{SimulatedStripProvider, StripProvider, StripSettings};
use crate::dispatch::CommandRegistry;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::loader::ConfigLoader;
use crate::relay::{Relay, RelaySummary};
use crate::telemetry;

use super::daemonizer::{Daemonizer, SystemDaemonizer};
use super::errors::LaunchError;
use super::guard::{PidFile, release};
use super::privilege::{PrivilegeSource, SystemPrivilege, ensure_privileged};
use super::signals::{ExitHook, SignalMonitor, SystemSignalMonitor};
use super::state::LifecycleState;
use super::{FOREGROUND_ENV_VAR, PROCESS_TARGET};

const RECREATE_BACKOFF: Duration = Duration::from_secs(1);

/// Launch mode for the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Fork into the background and detach from the controlling terminal.
    Background,
    /// Remain attached to the terminal; primarily used for debugging and tests.
    Foreground,
}

impl LaunchMode {
    /// Foreground when `foreground` is set or the environment asks for it.
    #[must_use]
    pub fn detect(foreground: bool) -> Self {
        if foreground || env::var_os(FOREGROUND_ENV_VAR).is_some() {
            Self::Foreground
        } else {
            Self::Background
        }
    }
}

/// How many inbound messages the relay handles before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageBudget {
    /// Relay until the process is interrupted.
    #[default]
    Unbounded,
    /// Relay this many messages, then shut down cleanly.
    Limit(usize),
}

/// Process-level collaborators needed to control daemon lifecycle.
pub(crate) struct ProcessControl<D, S, P> {
    pub(crate) mode: LaunchMode,
    pub(crate) daemonizer: D,
    pub(crate) signals: S,
    pub(crate) privilege: P,
}

/// Service dependencies required to run the relay.
pub(crate) struct ServiceDeps<L, A> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) strip: A,
}

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, D, S, P, A> {
    pub(crate) process: ProcessControl<D, S, P>,
    pub(crate) services: ServiceDeps<L, A>,
    pub(crate) budget: MessageBudget,
}

/// Runs the daemon using the production collaborators.
///
/// In production this only returns on failure; `SIGINT` ends the process from
/// the signal thread.
///
/// # Errors
///
/// Returns a [`LaunchError`] when any startup step fails.
pub fn run_daemon<L>(loader: L, foreground: bool) -> Result<RelaySummary, LaunchError>
where
    L: ConfigLoader,
{
    let plan = LaunchPlan {
        process: ProcessControl {
            mode: LaunchMode::detect(foreground),
            daemonizer: SystemDaemonizer::new(),
            signals: SystemSignalMonitor,
            privilege: SystemPrivilege,
        },
        services: ServiceDeps {
            loader,
            reporter: Arc::new(StructuredHealthReporter::new()),
            strip: SimulatedStripProvider::new(),
        },
        budget: MessageBudget::Unbounded,
    };
    run_daemon_with(plan)
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, D, S, P, A>(
    plan: LaunchPlan<L, D, S, P, A>,
) -> Result<RelaySummary, LaunchError>
where
    L: ConfigLoader,
    D: Daemonizer,
    S: SignalMonitor,
    P: PrivilegeSource,
    A: StripProvider,
{
    let reporter = Arc::clone(&plan.services.reporter);
    match launch(plan) {
        Ok(summary) => {
            reporter.state_entered(LifecycleState::Exited);
            Ok(summary)
        }
        Err(error) => {
            reporter.startup_failed(&error);
            Err(error)
        }
    }
}

fn launch<L, D, S, P, A>(plan: LaunchPlan<L, D, S, P, A>) -> Result<RelaySummary, LaunchError>
where
    L: ConfigLoader,
    D: Daemonizer,
    S: SignalMonitor,
    P: PrivilegeSource,
    A: StripProvider,
{
    let LaunchPlan {
        process,
        services,
        budget,
    } = plan;
    let ProcessControl {
        mode,
        daemonizer,
        signals,
        privilege,
    } = process;
    let ServiceDeps {
        loader,
        reporter,
        strip,
    } = services;

    let config = loader.load()?;
    telemetry::initialise(&config)?;
    reporter.state_entered(LifecycleState::Starting);
    info!(target: PROCESS_TARGET, ?mode, "starting daemon runtime");

    ensure_privileged(&privilege)?;
    reporter.state_entered(LifecycleState::PrivilegeChecked);

    let registry = CommandRegistry::builtin()?;
    let paths = config.paths();
    prepare_directory(paths.working_dir())?;
    PidFile::check(paths.pid_file())?;
    if mode == LaunchMode::Background {
        daemonizer.daemonize(&paths)?;
    }
    let pid_file = PidFile::claim(paths.pid_file(), std::process::id())?;
    reporter.state_entered(LifecycleState::Detached);

    for pipe in [paths.inbound_pipe(), paths.outbound_pipe()] {
        if let Some(parent) = pipe.parent() {
            prepare_directory(parent)?;
        }
        let status = ensure_fifo(pipe)?;
        info!(target: PROCESS_TARGET, pipe = %pipe.display(), ?status, "pipe ready");
    }
    reporter.state_entered(LifecycleState::PipesReady);

    let hook = exit_hook(pid_file.path().to_path_buf(), Arc::clone(&reporter));
    let monitor = signals.install(hook)?;
    reporter.state_entered(LifecycleState::Running);

    let relay = Relay::new(
        &registry,
        &strip,
        StripSettings::from_config(&config),
        &*reporter,
    );
    let messages = inbound_messages(paths.inbound_pipe(), RECREATE_BACKOFF);
    let summary = match budget {
        MessageBudget::Unbounded => relay.serve(messages),
        MessageBudget::Limit(count) => relay.serve(messages.take(count)),
    };

    monitor.close();
    drop(pid_file);
    info!(
        target: PROCESS_TARGET,
        executed = summary.executed,
        failed = summary.failed,
        "shutdown sequence completed"
    );
    Ok(summary)
}

fn prepare_directory(path: &Path) -> Result<(), LaunchError> {
    fs::create_dir_all(path).map_err(|source| LaunchError::WorkingDirectory {
        path: path.to_path_buf(),
        source,
    })
}

/// Releases the PID file and exits; runs on the signal thread.
fn exit_hook(pid_file: PathBuf, reporter: Arc<dyn HealthReporter>) -> ExitHook {
    Box::new(move || {
        release(&pid_file);
        reporter.state_entered(LifecycleState::Exited);
        info!(target: PROCESS_TARGET, "daemon exiting on interrupt");
        std::process::exit(0);
    })
}

/// Inbound frames, recreating the pipe if it disappears underneath the relay.
///
/// Errors raised before a producer connects recur immediately, so each one
/// that cannot be repaired on the spot waits `backoff` before the next open.
fn inbound_messages(
    path: &Path,
    backoff: Duration,
) -> impl Iterator<Item = Result<Vec<u8>, PipeError>> + use<> {
    InboundMessages::new(path).inspect(move |message| {
        let Err(error) = message else {
            return;
        };
        if !error.before_connect() {
            return;
        }
        if let PipeError::NotFound { path: missing } = error {
            warn!(target: PROCESS_TARGET, pipe = %missing.display(), "inbound pipe vanished; recreating");
            match ensure_fifo(missing) {
                Ok(_) => return,
                Err(recreate) => {
                    warn!(target: PROCESS_TARGET, error = %recreate, "failed to recreate inbound pipe");
                }
            }
        } else {
            warn!(target: PROCESS_TARGET, %error, "inbound pipe unusable; backing off");
        }
        thread::sleep(backoff);
    })
}
