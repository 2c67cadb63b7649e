//! Unit tests for the producer CLI runtime.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use neopixel_config::{Config, DaemonPaths};
use neopixel_wire::{CommandEnvelope, ensure_fifo, receive_envelope, send_envelope};

use crate::cli::{KeywordArgument, KeywordArgumentError};
use crate::config::ConfigLoader;
use crate::{AppError, run_with_loader};

/// Loader that points every pipe into a temporary directory.
struct TestConfigLoader {
    dir: TempDir,
}

impl TestConfigLoader {
    fn config(&self) -> Config {
        let pipe_dir =
            Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf()).expect("utf8 temp path");
        Config {
            pipe_dir: Some(pipe_dir),
            ..Config::default()
        }
    }

    fn paths(&self) -> DaemonPaths {
        self.config().paths()
    }

    fn inbound(&self) -> PathBuf {
        self.paths().inbound_pipe().to_path_buf()
    }

    fn outbound(&self) -> PathBuf {
        self.paths().outbound_pipe().to_path_buf()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config())
    }
}

#[fixture]
fn loader() -> TestConfigLoader {
    TestConfigLoader {
        dir: TempDir::new().expect("create temp dir"),
    }
}

struct Outcome {
    exit: ExitCode,
    stdout: String,
    stderr: String,
}

fn invoke(loader: &TestConfigLoader, args: &[&str]) -> Outcome {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let argv = std::iter::once("neopixel")
        .chain(args.iter().copied())
        .map(OsString::from);
    let exit = run_with_loader(argv, &mut stdout, &mut stderr, loader);
    Outcome {
        exit,
        stdout: String::from_utf8(stdout).expect("utf8 stdout"),
        stderr: String::from_utf8(stderr).expect("utf8 stderr"),
    }
}

#[rstest]
fn send_frames_the_envelope_onto_the_inbound_pipe(loader: TestConfigLoader) {
    let inbound = loader.inbound();
    ensure_fifo(&inbound).expect("create inbound pipe");
    let reader = thread::spawn(move || receive_envelope(&inbound));

    let outcome = invoke(
        &loader,
        &[
            "send",
            "set",
            "ring",
            "--kw",
            "brightness=0.6",
            "--kw",
            "color=0xE09D37",
        ],
    );

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    let received = reader
        .join()
        .expect("reader thread")
        .expect("envelope received");
    assert_eq!(
        received,
        CommandEnvelope::new("set")
            .with_arg("ring")
            .with_kwarg("brightness", "0.6")
            .with_kwarg("color", "0xE09D37")
    );
}

#[rstest]
fn send_reports_a_missing_pipe(loader: TestConfigLoader) {
    let outcome = invoke(&loader, &["send", "off"]);
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(
        outcome.stderr.contains("does not exist"),
        "stderr: {}",
        outcome.stderr
    );
}

#[rstest]
#[case(false, "echo hello -level 2\n")]
#[case(true, "{\"command\":\"echo\",\"args\":[\"hello\"],\"kwargs\":{\"level\":\"2\"}}\n")]
fn read_prints_one_outbound_envelope(
    loader: TestConfigLoader,
    #[case] json: bool,
    #[case] expected: &str,
) {
    let outbound = loader.outbound();
    ensure_fifo(&outbound).expect("create outbound pipe");
    let envelope = CommandEnvelope::new("echo")
        .with_arg("hello")
        .with_kwarg("level", "2");
    let writer = thread::spawn(move || send_envelope(&outbound, &envelope));

    let args: &[&str] = if json { &["read", "--json"] } else { &["read"] };
    let outcome = invoke(&loader, args);

    writer
        .join()
        .expect("writer thread")
        .expect("envelope sent");
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert_eq!(outcome.stdout, expected);
}

#[rstest]
fn malformed_keyword_arguments_are_usage_errors(loader: TestConfigLoader) {
    let outcome = invoke(&loader, &["send", "set", "--kw", "brightness"]);
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(
        outcome.stderr.contains("KEY=VALUE"),
        "stderr: {}",
        outcome.stderr
    );
}

#[rstest]
fn a_subcommand_is_required(loader: TestConfigLoader) {
    let outcome = invoke(&loader, &[]);
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(!outcome.stderr.is_empty());
}

#[rstest]
#[case("color=0x000000", Ok(("color", "0x000000")))]
#[case("note=a=b", Ok(("note", "a=b")))]
#[case("empty=", Ok(("empty", "")))]
#[case("brightness", Err(KeywordArgumentError::MissingSeparator(String::from("brightness"))))]
#[case("=1", Err(KeywordArgumentError::EmptyKey(String::from("=1"))))]
fn keyword_arguments_split_on_the_first_equals(
    #[case] input: &str,
    #[case] expected: Result<(&str, &str), KeywordArgumentError>,
) {
    let parsed: Result<KeywordArgument, _> = input.parse();
    let expected = expected.map(|(key, value)| KeywordArgument {
        key: key.to_owned(),
        value: value.to_owned(),
    });
    assert_eq!(parsed, expected);
}
