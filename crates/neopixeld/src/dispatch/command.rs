//! The closed set of commands the daemon understands.

use std::fmt;

use tracing::info;

use neopixel_wire::CommandEnvelope;

use crate::actuator::{ActuatorError, Brightness, Rgb, StripProvider, StripSettings};

use super::DISPATCH_TARGET;
use super::arguments::{parse_brightness, parse_color};
use super::errors::ArgumentError;

/// Identifies a command variant independently of its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Logs its arguments.
    Echo,
    /// Switches every element off.
    Off,
    /// Programs every element to one colour and brightness.
    Set,
}

impl CommandKind {
    /// Every built-in command.
    pub const ALL: [Self; 3] = [Self::Echo, Self::Off, Self::Set];

    /// Name the command is addressed by on the wire.
    #[must_use]
    pub const fn command_name(self) -> &'static str {
        match self {
            Self::Echo => "echo",
            Self::Off => "off",
            Self::Set => "set",
        }
    }

    /// Validates the envelope's arguments and builds the command.
    ///
    /// Nothing is executed here.
    pub(crate) fn build(self, envelope: &CommandEnvelope) -> Result<Command, ArgumentError> {
        match self {
            Self::Echo => Ok(Command::Echo(EchoCommand {
                line: envelope.to_string(),
            })),
            Self::Off => Ok(Command::Off),
            Self::Set => SetCommand::from_envelope(envelope).map(Command::Set),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command_name())
    }
}

/// A fully validated command ready to run.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// See [`EchoCommand`].
    Echo(EchoCommand),
    /// Fills the strip with [`Rgb::OFF`].
    Off,
    /// See [`SetCommand`].
    Set(SetCommand),
}

impl Command {
    /// The variant's kind.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::Echo(_) => CommandKind::Echo,
            Self::Off => CommandKind::Off,
            Self::Set(_) => CommandKind::Set,
        }
    }

    /// Runs the command against the strip supplied by `provider`.
    ///
    /// # Errors
    ///
    /// Returns an [`ActuatorError`] when the strip cannot be acquired or
    /// rejects the update. `echo` never fails.
    pub fn execute(
        &self,
        provider: &dyn StripProvider,
        settings: StripSettings,
    ) -> Result<(), ActuatorError> {
        match self {
            Self::Echo(echo) => {
                echo.execute();
                Ok(())
            }
            Self::Off => {
                let mut strip = provider.acquire(settings)?;
                strip.fill(Rgb::OFF);
                strip.show()
            }
            Self::Set(set) => set.execute(provider, settings),
        }
    }
}

/// Logs the command line it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoCommand {
    line: String,
}

impl EchoCommand {
    /// The rendered command line, e.g. `echo a b -k v`.
    #[must_use]
    pub fn line(&self) -> &str {
        &self.line
    }

    fn execute(&self) {
        info!(target: DISPATCH_TARGET, command = "echo", "{}", self.line);
    }
}

/// Programs every element to `color` at `brightness` in one flush.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetCommand {
    brightness: Brightness,
    color: Rgb,
}

impl SetCommand {
    const BRIGHTNESS: &'static str = "brightness";
    const COLOR: &'static str = "color";

    fn from_envelope(envelope: &CommandEnvelope) -> Result<Self, ArgumentError> {
        let keyword = |name: &'static str| {
            envelope
                .keyword_args
                .get(name)
                .ok_or(ArgumentError::missing(CommandKind::Set.command_name(), name))
        };
        let brightness = parse_brightness(keyword(Self::BRIGHTNESS)?)?;
        let color = parse_color(keyword(Self::COLOR)?)?;
        Ok(Self { brightness, color })
    }

    /// Requested brightness.
    #[must_use]
    pub const fn brightness(&self) -> Brightness {
        self.brightness
    }

    /// Requested colour.
    #[must_use]
    pub const fn color(&self) -> Rgb {
        self.color
    }

    fn execute(
        &self,
        provider: &dyn StripProvider,
        settings: StripSettings,
    ) -> Result<(), ActuatorError> {
        let mut strip = provider.acquire(settings)?;
        strip.set_brightness(self.brightness);
        strip.fill(self.color);
        strip.show()
    }
}
