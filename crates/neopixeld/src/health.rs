//! Structured reporting for lifecycle transitions and command outcomes.

use std::sync::Arc;

use neopixel_wire::CommandEnvelope;

use crate::process::{LaunchError, LifecycleState};
use crate::relay::RelayFailure;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface daemon events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked each time the daemon enters a lifecycle state.
    fn state_entered(&self, state: LifecycleState);

    /// Invoked when startup fails before the relay loop.
    fn startup_failed(&self, error: &LaunchError);

    /// Invoked after a command executes successfully.
    fn command_executed(&self, envelope: &CommandEnvelope);

    /// Invoked when a message is discarded.
    fn command_failed(&self, failure: &RelayFailure);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn state_entered(&self, state: LifecycleState) {
        (**self).state_entered(state);
    }

    fn startup_failed(&self, error: &LaunchError) {
        (**self).startup_failed(error);
    }

    fn command_executed(&self, envelope: &CommandEnvelope) {
        (**self).command_executed(envelope);
    }

    fn command_failed(&self, failure: &RelayFailure) {
        (**self).command_failed(failure);
    }
}

/// Default reporter that records events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn state_entered(&self, state: LifecycleState) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "state_entered",
            state = state.as_str(),
            "daemon entered {state}"
        );
    }

    fn startup_failed(&self, error: &LaunchError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "startup_failed",
            error = %error,
            "daemon startup failed"
        );
    }

    fn command_executed(&self, envelope: &CommandEnvelope) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "command_executed",
            command = %envelope.name,
            received = %envelope,
            "command executed"
        );
    }

    fn command_failed(&self, failure: &RelayFailure) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "command_failed",
            category = failure.error.category(),
            command = failure.command_name().unwrap_or("-"),
            received = %failure.received(),
            error = %failure.error,
            "command discarded"
        );
    }
}
