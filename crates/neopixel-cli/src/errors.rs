//! Error types for the producer CLI.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use neopixel_wire::ExchangeError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to send command to '{path}': {source}")]
    Send {
        path: PathBuf,
        #[source]
        source: ExchangeError,
    },
    #[error("failed to receive from '{path}': {source}")]
    Receive {
        path: PathBuf,
        #[source]
        source: ExchangeError,
    },
    #[error("failed to serialise envelope: {0}")]
    Serialise(serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(io::Error),
}
