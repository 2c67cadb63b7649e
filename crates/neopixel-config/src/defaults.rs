//! Built-in values used when no configuration layer supplies an override.

use crate::logging::LogFormat;

/// Name shared by the daemon binary, its PID file and its pipes.
pub const DAEMON_NAME: &str = "neopixeld";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default location of the daemon PID file.
pub const DEFAULT_PID_FILE: &str = "/var/run/neopixeld.pid";

/// Default working directory the detached daemon switches into.
pub const DEFAULT_WORKING_DIR: &str = "/var/lib/neopixeld";

/// File name of the inbound (producer to daemon) pipe.
pub const INBOUND_PIPE_NAME: &str = "neopixeld.stdin";

/// File name of the outbound (daemon to producer) pipe.
pub const OUTBOUND_PIPE_NAME: &str = "neopixeld.stdout";

/// File name of the log the detached daemon writes inside its working directory.
pub const LOG_FILE_NAME: &str = "neopixeld.log";

/// Number of addressable elements on the default strip (three 12-pixel rings).
pub const DEFAULT_PIXEL_COUNT: usize = 36;

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
