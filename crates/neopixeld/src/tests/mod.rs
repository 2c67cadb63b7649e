//! Test suites for the relay daemon.

pub(crate) mod support;
