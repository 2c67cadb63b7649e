//! Configuration loading helpers for the producer CLI.
//!
//! Configuration flags are peeled off the front of the argument list so the
//! loader only sees flags it understands and `clap` only sees the subcommand.

use std::ffi::{OsStr, OsString};

use neopixel_config::Config;
use ortho_config::OrthoConfig;

use crate::AppError;

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

pub(crate) trait ConfigLoader {
    /// Loads configuration for the CLI.
    ///
    /// Configuration flags must appear before the subcommand; later ones are
    /// treated as command arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let Some(text) = argument.to_str() else {
        return FlagAction::Stop;
    };
    let (flag, has_inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text, false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !has_inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Leading configuration flags, and the arguments left for `clap`.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) cli_arguments: Vec<OsString>,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit::default();
    };
    let mut split = ConfigArgumentSplit {
        config_arguments: vec![program.clone()],
        cli_arguments: vec![program.clone()],
    };
    let mut remaining = rest.iter();
    while let Some(argument) = remaining.next() {
        match classify(argument) {
            FlagAction::Include { needs_value } => {
                split.config_arguments.push(argument.clone());
                if needs_value && let Some(value) = remaining.next() {
                    split.config_arguments.push(value.clone());
                }
            }
            FlagAction::Stop => {
                split.cli_arguments.push(argument.clone());
                split.cli_arguments.extend(remaining.cloned());
                break;
            }
        }
    }
    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case("--pipe-dir=/tmp", FlagAction::Include { needs_value: false })]
    #[case("--pipe-dir", FlagAction::Include { needs_value: true })]
    #[case("send", FlagAction::Stop)]
    #[case("--unknown", FlagAction::Stop)]
    fn classifies_arguments(#[case] argument: &str, #[case] expected: FlagAction) {
        assert_eq!(classify(OsStr::new(argument)), expected);
    }

    #[test]
    fn flags_after_the_subcommand_belong_to_the_command() {
        let split = split_config_arguments(&os_args(&[
            "neopixel",
            "--pipe-dir",
            "/tmp/pipes",
            "send",
            "echo",
            "--pipe-dir",
        ]));
        assert_eq!(
            split.config_arguments,
            os_args(&["neopixel", "--pipe-dir", "/tmp/pipes"])
        );
        assert_eq!(
            split.cli_arguments,
            os_args(&["neopixel", "send", "echo", "--pipe-dir"])
        );
    }
}
