//! The read-decode-dispatch loop.
//!
//! Every inbound message is decoded, resolved and executed in arrival order.
//! Whatever goes wrong with one message is reported and the loop moves on to
//! the next; nothing raised here ends the daemon.

use thiserror::Error;
use tracing::debug;

use neopixel_wire::{CommandEnvelope, EnvelopeError, PipeError};

use crate::actuator::{ActuatorError, StripProvider, StripSettings};
use crate::dispatch::{CommandRegistry, DispatchError};
use crate::health::HealthReporter;

const RELAY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::relay");

/// Why a single message was discarded.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The frame could not be read off the pipe.
    #[error(transparent)]
    Transport(#[from] PipeError),
    /// The payload was not a command envelope.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    /// The envelope named an unknown command or carried bad arguments.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// The command ran but the strip refused it.
    #[error("'{command}' failed: {source}")]
    Actuator {
        /// Command that was executing.
        command: &'static str,
        /// Underlying actuator error.
        #[source]
        source: ActuatorError,
    },
}

impl RelayError {
    /// Error class used in structured logs.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Transport(error) if error.is_framing() => "framing",
            Self::Transport(_) => "transport",
            Self::Envelope(_) => "envelope",
            Self::Dispatch(DispatchError::UnknownCommand { .. }) => "dispatch",
            Self::Dispatch(DispatchError::Arguments { .. }) => "argument",
            Self::Actuator { .. } => "actuator",
        }
    }
}

/// A discarded message together with whatever context could be recovered.
#[derive(Debug)]
pub struct RelayFailure {
    /// What went wrong.
    pub error: RelayError,
    /// The decoded envelope, when decoding got that far.
    pub envelope: Option<CommandEnvelope>,
    /// The payload as lossy UTF-8, when it could not be decoded.
    pub payload: Option<String>,
}

impl RelayFailure {
    fn transport(error: PipeError) -> Self {
        Self {
            error: error.into(),
            envelope: None,
            payload: None,
        }
    }

    fn undecodable(error: EnvelopeError, payload: &[u8]) -> Self {
        Self {
            error: error.into(),
            envelope: None,
            payload: Some(String::from_utf8_lossy(payload).into_owned()),
        }
    }

    fn rejected(error: RelayError, envelope: CommandEnvelope) -> Self {
        Self {
            error,
            envelope: Some(envelope),
            payload: None,
        }
    }

    /// Name of the command involved, when known.
    #[must_use]
    pub fn command_name(&self) -> Option<&str> {
        self.envelope.as_ref().map(|envelope| envelope.name.as_str())
    }

    /// The received message rendered for diagnostics.
    #[must_use]
    pub fn received(&self) -> String {
        match (&self.envelope, &self.payload) {
            (Some(envelope), _) => envelope.to_string(),
            (None, Some(payload)) => payload.clone(),
            (None, None) => String::from("-"),
        }
    }
}

/// Counters returned when a bounded message stream is exhausted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelaySummary {
    /// Messages whose command executed.
    pub executed: usize,
    /// Messages that were discarded.
    pub failed: usize,
}

/// Decodes, dispatches and executes inbound messages.
pub struct Relay<'a> {
    registry: &'a CommandRegistry,
    strip: &'a dyn StripProvider,
    settings: StripSettings,
    reporter: &'a dyn HealthReporter,
}

impl<'a> Relay<'a> {
    /// Wires the loop to its collaborators.
    #[must_use]
    pub const fn new(
        registry: &'a CommandRegistry,
        strip: &'a dyn StripProvider,
        settings: StripSettings,
        reporter: &'a dyn HealthReporter,
    ) -> Self {
        Self {
            registry,
            strip,
            settings,
            reporter,
        }
    }

    /// Runs one message through decode, dispatch and execution.
    ///
    /// # Errors
    ///
    /// Returns a [`RelayFailure`] describing the first stage that failed.
    pub fn handle(
        &self,
        message: Result<Vec<u8>, PipeError>,
    ) -> Result<CommandEnvelope, RelayFailure> {
        let payload = message.map_err(RelayFailure::transport)?;
        let envelope = CommandEnvelope::from_bytes(&payload)
            .map_err(|error| RelayFailure::undecodable(error, &payload))?;
        debug!(target: RELAY_TARGET, received = %envelope, "command received");

        let command = match self.registry.build_command(&envelope) {
            Ok(command) => command,
            Err(error) => return Err(RelayFailure::rejected(error.into(), envelope)),
        };
        if let Err(source) = command.execute(self.strip, self.settings) {
            let error = RelayError::Actuator {
                command: command.kind().command_name(),
                source,
            };
            return Err(RelayFailure::rejected(error, envelope));
        }
        Ok(envelope)
    }

    /// Handles `messages` in order until the stream ends.
    ///
    /// The daemon feeds an endless stream, so in production this only
    /// returns when the process is shutting down.
    pub fn serve<I>(&self, messages: I) -> RelaySummary
    where
        I: IntoIterator<Item = Result<Vec<u8>, PipeError>>,
    {
        let mut summary = RelaySummary::default();
        for message in messages {
            match self.handle(message) {
                Ok(envelope) => {
                    summary.executed += 1;
                    self.reporter.command_executed(&envelope);
                }
                Err(failure) => {
                    summary.failed += 1;
                    self.reporter.command_failed(&failure);
                }
            }
        }
        summary
    }
}
