//! Error types for command construction and dispatch.

use thiserror::Error;

/// A command's arguments could not be turned into a runnable command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// A required keyword argument was absent.
    #[error("'{command}' requires keyword argument '{name}'")]
    Missing {
        /// Command being built.
        command: &'static str,
        /// Missing keyword.
        name: &'static str,
    },
    /// The colour was neither `0xRRGGBB` nor `R-G-B`.
    #[error("cannot parse colour '{input}': expected 0xRRGGBB or R-G-B")]
    Color {
        /// Rejected input.
        input: String,
    },
    /// The brightness was not a finite number.
    #[error("cannot parse brightness '{input}': expected a finite number")]
    Brightness {
        /// Rejected input.
        input: String,
    },
}

impl ArgumentError {
    /// Creates a missing keyword error.
    #[must_use]
    pub const fn missing(command: &'static str, name: &'static str) -> Self {
        Self::Missing { command, name }
    }

    /// Creates a colour parse error.
    pub fn color(input: impl Into<String>) -> Self {
        Self::Color {
            input: input.into(),
        }
    }

    /// Creates a brightness parse error.
    pub fn brightness(input: impl Into<String>) -> Self {
        Self::Brightness {
            input: input.into(),
        }
    }
}

/// Errors surfaced while resolving an envelope to a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No registered command carries the requested name.
    #[error("cannot find command named '{name}'")]
    UnknownCommand {
        /// Requested name.
        name: String,
    },
    /// The command exists but its arguments are invalid.
    #[error("invalid arguments for '{command}': {source}")]
    Arguments {
        /// Command being built.
        command: &'static str,
        /// Underlying argument error.
        #[source]
        source: ArgumentError,
    },
}

/// Errors raised while building the command registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two registrations claimed the same name.
    #[error("command name '{name}' registered more than once")]
    DuplicateCommandName {
        /// Conflicting name.
        name: &'static str,
    },
}
