//! Test doubles shared by the daemon suites.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use camino::Utf8PathBuf;
use tempfile::TempDir;

use neopixel_config::{Config, DaemonPaths, LogFormat};
use neopixel_wire::CommandEnvelope;

use crate::health::HealthReporter;
use crate::loader::StaticConfigLoader;
use crate::process::{
    DaemonizeError, Daemonizer, ExitHook, LaunchError, LifecycleState, MonitorHandle,
    PrivilegeSource, SignalError, SignalMonitor,
};
use crate::relay::RelayFailure;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HealthEvent {
    StateEntered(LifecycleState),
    StartupFailed(String),
    CommandExecuted(String),
    CommandFailed {
        category: &'static str,
        received: String,
    },
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub(crate) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub(crate) fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    pub(crate) fn states(&self) -> Vec<LifecycleState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HealthEvent::StateEntered(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn failure_categories(&self) -> Vec<&'static str> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HealthEvent::CommandFailed { category, .. } => Some(category),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn executed(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, HealthEvent::CommandExecuted(_)))
            .count()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn state_entered(&self, state: LifecycleState) {
        self.record(HealthEvent::StateEntered(state));
    }

    fn startup_failed(&self, error: &LaunchError) {
        self.record(HealthEvent::StartupFailed(error.to_string()));
    }

    fn command_executed(&self, envelope: &CommandEnvelope) {
        self.record(HealthEvent::CommandExecuted(envelope.name.clone()));
    }

    fn command_failed(&self, failure: &RelayFailure) {
        self.record(HealthEvent::CommandFailed {
            category: failure.error.category(),
            received: failure.received(),
        });
    }
}

/// Daemoniser that counts requests instead of forking.
#[derive(Debug, Clone, Default)]
pub(crate) struct TestDaemonizer {
    calls: Arc<AtomicUsize>,
}

impl TestDaemonizer {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Daemonizer for TestDaemonizer {
    fn daemonize(&self, _paths: &DaemonPaths) -> Result<(), DaemonizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Signal monitor that installs nothing, leaving process signals untouched.
#[derive(Debug, Clone, Default)]
pub(crate) struct TestSignalMonitor {
    installs: Arc<AtomicUsize>,
}

impl TestSignalMonitor {
    pub(crate) fn installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }
}

impl SignalMonitor for TestSignalMonitor {
    fn install(&self, _on_exit: ExitHook) -> Result<MonitorHandle, SignalError> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        Ok(MonitorHandle::inert())
    }
}

/// Privilege source reporting a fixed effective uid.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedPrivilege(pub(crate) u32);

impl FixedPrivilege {
    pub(crate) const ROOT: Self = Self(0);
}

impl PrivilegeSource for FixedPrivilege {
    fn effective_uid(&self) -> u32 {
        self.0
    }
}

/// Temporary directory tree holding every artefact a daemon run creates.
pub(crate) struct Sandbox {
    _dir: TempDir,
    config: Config,
}

impl Sandbox {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp path");
        let config = Config {
            log_format: Some(LogFormat::Compact),
            working_dir: Some(root.join("work")),
            pid_file: Some(root.join("neopixeld.pid")),
            pipe_dir: Some(root.join("pipes")),
            pixel_count: Some(8),
            ..Config::default()
        };
        Self { _dir: dir, config }
    }

    pub(crate) fn paths(&self) -> DaemonPaths {
        self.config.paths()
    }

    pub(crate) fn loader(&self) -> StaticConfigLoader {
        StaticConfigLoader::new(self.config.clone())
    }

    pub(crate) fn pid_file(&self) -> PathBuf {
        self.paths().pid_file().to_path_buf()
    }
}
