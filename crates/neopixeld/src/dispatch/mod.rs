//! Command registry and dispatch.
//!
//! Envelopes are resolved to commands in two steps: [`CommandRegistry`] looks
//! the name up and validates the arguments into a [`Command`], then
//! [`Command::execute`] drives the strip. Keeping the steps apart lets callers
//! tell a rejected request from a failed actuator update.

mod arguments;
mod command;
mod errors;
mod registry;

pub use command::{Command, CommandKind, EchoCommand, SetCommand};
pub use errors::{ArgumentError, DispatchError, RegistryError};
pub use registry::CommandRegistry;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
