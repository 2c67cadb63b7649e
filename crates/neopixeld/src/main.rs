//! Entrypoint for the `neopixeld` daemon and its operator controls.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked handles: the signal thread logs to stderr while the relay runs.
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    neopixeld::run(std::env::args_os(), &mut stdout, &mut stderr)
}
