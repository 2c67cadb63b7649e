//! CLI argument definitions for the `neopixel` producer.

use std::str::FromStr;

use clap::{Parser, Subcommand};
use thiserror::Error;

/// Command-line interface for sending commands to `neopixeld`.
#[derive(Parser, Debug)]
#[command(name = "neopixel", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// What to do.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Producer subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum CliCommand {
    /// Frames one command onto the daemon's inbound pipe.
    Send {
        /// Command name, for example `set`.
        #[arg(value_name = "NAME")]
        name: String,
        /// Positional arguments, in order.
        #[arg(value_name = "ARG")]
        args: Vec<String>,
        /// Keyword argument as `KEY=VALUE`; repeatable.
        #[arg(long = "kw", value_name = "KEY=VALUE")]
        kwargs: Vec<KeywordArgument>,
    },
    /// Waits for a writer on the outbound pipe and prints one envelope.
    ///
    /// `neopixeld` creates the outbound pipe but never writes to it, so this
    /// blocks until some other process opens the pipe and sends a frame.
    Read {
        /// Prints the envelope as JSON instead of a command line.
        #[arg(long)]
        json: bool,
    },
}

/// A `KEY=VALUE` pair given with `--kw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeywordArgument {
    pub(crate) key: String,
    pub(crate) value: String,
}

/// Reasons a `--kw` value was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum KeywordArgumentError {
    #[error("expected KEY=VALUE, got '{0}'")]
    MissingSeparator(String),
    #[error("keyword argument '{0}' has an empty key")]
    EmptyKey(String),
}

impl FromStr for KeywordArgument {
    type Err = KeywordArgumentError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (key, value) = input
            .split_once('=')
            .ok_or_else(|| KeywordArgumentError::MissingSeparator(input.to_owned()))?;
        if key.is_empty() {
            return Err(KeywordArgumentError::EmptyKey(input.to_owned()));
        }
        Ok(Self {
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }
}
