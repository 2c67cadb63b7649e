//! CLI entrypoint for the `neopixel` producer.
//!
//! Delegates to [`neopixel_cli::run`], which loads configuration, frames the
//! requested envelope onto the daemon's inbound pipe or reads one reply from
//! its outbound pipe.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    neopixel_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
