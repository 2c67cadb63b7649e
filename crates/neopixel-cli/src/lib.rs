//! Producer CLI for the `neopixeld` relay.
//!
//! `neopixel send` builds a command envelope from its arguments and frames it
//! onto the daemon's inbound pipe; `neopixel read` takes one envelope off the
//! outbound pipe and prints it. Both resolve the pipe locations from the same
//! layered configuration as the daemon, so configuration flags given before
//! the subcommand apply here too.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

use neopixel_config::DaemonPaths;
use neopixel_wire::{CommandEnvelope, receive_envelope, send_envelope};

mod cli;
mod config;
mod errors;

use cli::{Cli, CliCommand, KeywordArgument};
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
pub(crate) use errors::AppError;

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);
    let result = Cli::try_parse_from(&split.cli_arguments)
        .map_err(AppError::CliUsage)
        .and_then(|cli| {
            loader
                .load(&split.config_arguments)
                .map(|config| (cli, config))
        })
        .and_then(|(cli, config)| execute(cli.command, &config.paths(), &mut *stdout));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write>(
    command: CliCommand,
    paths: &DaemonPaths,
    stdout: &mut W,
) -> Result<(), AppError> {
    match command {
        CliCommand::Send { name, args, kwargs } => {
            let envelope = build_envelope(name, args, kwargs);
            let path = paths.inbound_pipe();
            send_envelope(path, &envelope).map_err(|source| AppError::Send {
                path: path.to_path_buf(),
                source,
            })
        }
        CliCommand::Read { json } => {
            let path = paths.outbound_pipe();
            let envelope = receive_envelope(path).map_err(|source| AppError::Receive {
                path: path.to_path_buf(),
                source,
            })?;
            let line = if json {
                serde_json::to_string(&envelope).map_err(AppError::Serialise)?
            } else {
                envelope.to_string()
            };
            writeln!(stdout, "{line}").map_err(AppError::Output)
        }
    }
}

fn build_envelope(
    name: String,
    args: Vec<String>,
    kwargs: Vec<KeywordArgument>,
) -> CommandEnvelope {
    let envelope = args
        .into_iter()
        .fold(CommandEnvelope::new(name), |envelope, arg| envelope.with_arg(arg));
    kwargs.into_iter().fold(envelope, |envelope, kwarg| {
        envelope.with_kwarg(kwarg.key, kwarg.value)
    })
}

#[cfg(test)]
mod tests;
