//! Operator command line for `neopixeld`.
//!
//! Configuration flags are split out of the argument list before `clap`
//! sees it, so `--pid-file` and friends may appear anywhere alongside the
//! action flags. `--kill` runs before `--start`, which makes `-k -s` a restart.

use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;

use crate::loader::ArgsConfigLoader;
use crate::process::{
    KillOutcome, LaunchError, SystemPrivilege, run_daemon, stop_daemon,
};

/// CLI flags recognised by the configuration loader.
///
/// Keep in sync with the fields of `neopixel_config::Config`.
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--log-filter",
    "--log-format",
    "--working-dir",
    "--pid-file",
    "--pipe-dir",
    "--pixel-count",
];

const USAGE_EXIT: u8 = 2;

/// Action flags accepted by `neopixeld`.
#[derive(Parser, Debug)]
#[command(
    name = "neopixeld",
    about = "Relays pixel strip commands received over a named pipe.",
    after_help = "Configuration flags: --config-path, --log-filter, --log-format, \
                  --working-dir, --pid-file, --pipe-dir, --pixel-count."
)]
pub(crate) struct Cli {
    /// Starts the daemon.
    #[arg(short = 's', long)]
    pub(crate) start: bool,
    /// Stops the daemon recorded in the PID file.
    #[arg(short = 'k', long)]
    pub(crate) kill: bool,
    /// Stays attached to the terminal instead of detaching.
    #[arg(long)]
    pub(crate) foreground: bool,
}

impl Cli {
    const fn has_action(&self) -> bool {
        self.start || self.kill
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("nothing to do; pass --start or --kill (see --help)")]
    NoAction,
    #[error("failed to stop daemon: {0}")]
    Stop(#[source] LaunchError),
    #[error("failed to start daemon: {0}")]
    Start(#[source] LaunchError),
}

/// Arguments split between the configuration loader and `clap`.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ArgumentPartition {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) action_arguments: Vec<OsString>,
}

/// Routes configuration flags (and their values) to the loader and leaves
/// everything else for `clap`. Both lists keep the program name.
pub(crate) fn partition_arguments(args: &[OsString]) -> ArgumentPartition {
    let mut remaining = args.iter();
    let Some(program) = remaining.next() else {
        return ArgumentPartition::default();
    };
    let mut partition = ArgumentPartition {
        config_arguments: vec![program.clone()],
        action_arguments: vec![program.clone()],
    };
    while let Some(argument) = remaining.next() {
        match config_flag(argument) {
            Some(needs_value) => {
                partition.config_arguments.push(argument.clone());
                if needs_value && let Some(value) = remaining.next() {
                    partition.config_arguments.push(value.clone());
                }
            }
            None => partition.action_arguments.push(argument.clone()),
        }
    }
    partition
}

/// `Some(needs_value)` when `argument` is a configuration flag.
fn config_flag(argument: &OsStr) -> Option<bool> {
    let text = argument.to_str()?;
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text, false),
    };
    CONFIG_CLI_FLAGS.contains(&flag).then_some(!inline_value)
}

/// Runs the operator CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let partition = partition_arguments(&args);
    let cli = match Cli::try_parse_from(&partition.action_arguments) {
        Ok(cli) => cli,
        Err(error) if error.use_stderr() => {
            let _ = write!(stderr, "{error}");
            return ExitCode::from(USAGE_EXIT);
        }
        Err(error) => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
    };
    if !cli.has_action() {
        let _ = writeln!(stderr, "neopixeld: {}", CliError::NoAction);
        return ExitCode::from(USAGE_EXIT);
    }

    let loader = ArgsConfigLoader::new(partition.config_arguments);
    match execute(&cli, loader, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "neopixeld: {error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write>(cli: &Cli, loader: ArgsConfigLoader, stdout: &mut W) -> Result<(), CliError> {
    if cli.kill {
        let outcome = stop_daemon(&loader, &SystemPrivilege).map_err(CliError::Stop)?;
        let _ = writeln!(stdout, "{}", describe(outcome));
    }
    if cli.start {
        run_daemon(loader, cli.foreground).map_err(CliError::Start)?;
    }
    Ok(())
}

fn describe(outcome: KillOutcome) -> String {
    match outcome {
        KillOutcome::NotRunning => String::from("neopixeld is not running"),
        KillOutcome::Stale { pid } => format!("pid file names {pid}, which is not running"),
        KillOutcome::Stopped { pid } => format!("stopped neopixeld (pid {pid})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case(&["neopixeld", "-s", "--pid-file", "/tmp/x.pid"], &["neopixeld", "--pid-file", "/tmp/x.pid"], &["neopixeld", "-s"])]
    #[case(&["neopixeld", "--log-filter=debug", "--kill"], &["neopixeld", "--log-filter=debug"], &["neopixeld", "--kill"])]
    #[case(&["neopixeld", "--foreground", "--start"], &["neopixeld"], &["neopixeld", "--foreground", "--start"])]
    #[case(&["neopixeld", "--unknown", "-s"], &["neopixeld"], &["neopixeld", "--unknown", "-s"])]
    fn configuration_flags_are_routed_to_the_loader(
        #[case] input: &[&str],
        #[case] config: &[&str],
        #[case] action: &[&str],
    ) {
        let partition = partition_arguments(&os_args(input));
        assert_eq!(partition.config_arguments, os_args(config));
        assert_eq!(partition.action_arguments, os_args(action));
    }

    #[test]
    fn empty_argument_lists_partition_to_nothing() {
        assert_eq!(partition_arguments(&[]), ArgumentPartition::default());
    }

    #[test]
    fn missing_action_is_a_usage_error() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit = run(os_args(&["neopixeld"]), &mut stdout, &mut stderr);
        assert_eq!(exit, ExitCode::from(USAGE_EXIT));
        let message = String::from_utf8(stderr).expect("utf8 stderr");
        assert!(message.contains("--start or --kill"), "stderr: {message}");
        assert!(stdout.is_empty());
    }

    #[test]
    fn unknown_flags_are_usage_errors() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit = run(os_args(&["neopixeld", "--bogus"]), &mut stdout, &mut stderr);
        assert_eq!(exit, ExitCode::from(USAGE_EXIT));
        assert!(!stderr.is_empty());
    }

    #[test]
    fn help_goes_to_stdout() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit = run(os_args(&["neopixeld", "--help"]), &mut stdout, &mut stderr);
        assert_eq!(exit, ExitCode::SUCCESS);
        let help = String::from_utf8(stdout).expect("utf8 stdout");
        assert!(help.contains("--kill"), "help: {help}");
        assert!(help.contains("--pipe-dir"), "help: {help}");
    }

    #[rstest]
    #[case(KillOutcome::NotRunning, "neopixeld is not running")]
    #[case(KillOutcome::Stale { pid: 7 }, "pid file names 7, which is not running")]
    #[case(KillOutcome::Stopped { pid: 7 }, "stopped neopixeld (pid 7)")]
    fn kill_outcomes_are_described(#[case] outcome: KillOutcome, #[case] expected: &str) {
        assert_eq!(describe(outcome), expected);
    }
}
