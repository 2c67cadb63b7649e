//! Named-pipe transport carrying one frame per open/close cycle.
//!
//! Writers open the FIFO, move exactly one frame and close it again. Opening
//! blocks until a peer opens the other end, and reads block until the
//! declared number of bytes has arrived or the writer hangs up. An open cycle
//! that ends before the first byte of a frame carries no message and is not
//! an error; a cycle that ends partway through a frame is.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use thiserror::Error;
use tracing::debug;

use crate::envelope::{CommandEnvelope, EnvelopeError};
use crate::frame::{FrameError, PREFIX_LEN, decode_length, encode_frame};

const PIPE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::pipe");

/// Permissions applied to pipes created by [`ensure_fifo`].
pub const FIFO_MODE: Mode = Mode::from_bits_truncate(0o660);

/// Outcome of [`ensure_fifo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FifoStatus {
    /// The pipe was created by this call.
    Created,
    /// A pipe already existed at the path and was left untouched.
    Existing,
}

/// Errors raised by the pipe transport.
#[derive(Debug, Error)]
pub enum PipeError {
    /// Nothing exists at the pipe path.
    #[error("named pipe '{path}' does not exist")]
    NotFound {
        /// Missing pipe path.
        path: PathBuf,
    },
    /// Something other than a FIFO occupies the pipe path.
    #[error("'{path}' exists but is not a named pipe")]
    NotAFifo {
        /// Offending path.
        path: PathBuf,
    },
    /// Inspecting the pipe path failed.
    #[error("failed to inspect '{path}': {source}")]
    Inspect {
        /// Inspected path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Creating the FIFO failed.
    #[error("failed to create named pipe '{path}': {source}")]
    Create {
        /// Pipe path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
    /// Opening the pipe failed.
    #[error("failed to open named pipe '{path}': {source}")]
    Open {
        /// Pipe path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Reading from the pipe failed.
    #[error("failed to read from named pipe '{path}': {source}")]
    Read {
        /// Pipe path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing to the pipe failed.
    #[error("failed to write to named pipe '{path}': {source}")]
    Write {
        /// Pipe path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The writer hung up before the whole prefix or payload arrived.
    #[error("message on '{path}' truncated: expected {expected} bytes, received {received}")]
    Truncated {
        /// Pipe path.
        path: PathBuf,
        /// Bytes the current section of the frame required.
        expected: u64,
        /// Bytes that actually arrived.
        received: u64,
    },
    /// The payload could not be framed or the prefix could not be decoded.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl PipeError {
    /// Whether the bytes on the pipe were malformed, as opposed to the pipe
    /// itself being unusable.
    #[must_use]
    pub const fn is_framing(&self) -> bool {
        matches!(self, Self::Truncated { .. } | Self::Frame(_))
    }

    /// Whether the failure happened before any peer connected, so an
    /// immediate retry meets the same condition.
    #[must_use]
    pub const fn before_connect(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::NotAFifo { .. }
                | Self::Inspect { .. }
                | Self::Create { .. }
                | Self::Open { .. }
        )
    }
}

/// Errors raised while exchanging whole envelopes over a pipe.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The transport failed.
    #[error(transparent)]
    Pipe(#[from] PipeError),
    /// The envelope could not be encoded or decoded.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// Creates a FIFO at `path` unless one is already present.
///
/// Existing pipes are never deleted or recreated.
///
/// # Errors
///
/// Returns [`PipeError::NotAFifo`] when another file type occupies `path`,
/// or [`PipeError::Create`] when the FIFO cannot be created.
pub fn ensure_fifo(path: &Path) -> Result<FifoStatus, PipeError> {
    if require_fifo(path).is_ok() {
        return Ok(FifoStatus::Existing);
    }
    match fs::symlink_metadata(path) {
        Ok(_) => Err(PipeError::NotAFifo {
            path: path.to_path_buf(),
        }),
        Err(error) if error.kind() == io::ErrorKind::NotFound => create_fifo(path),
        Err(source) => Err(PipeError::Inspect {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn create_fifo(path: &Path) -> Result<FifoStatus, PipeError> {
    match mkfifo(path, FIFO_MODE) {
        Ok(()) => {
            debug!(target: PIPE_TARGET, path = %path.display(), "named pipe created");
            Ok(FifoStatus::Created)
        }
        Err(Errno::EEXIST) => require_fifo(path).map(|()| FifoStatus::Existing),
        Err(source) => Err(PipeError::Create {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn require_fifo(path: &Path) -> Result<(), PipeError> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.file_type().is_fifo() => Ok(()),
        Ok(_) => Err(PipeError::NotAFifo {
            path: path.to_path_buf(),
        }),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Err(PipeError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(PipeError::Inspect {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Frames `payload` and writes it to the FIFO at `path` in one cycle.
///
/// Blocks until a reader opens the pipe.
///
/// # Errors
///
/// Returns [`PipeError::NotFound`] or [`PipeError::NotAFifo`] when `path` is
/// not a FIFO, [`PipeError::Frame`] for oversize payloads and
/// [`PipeError::Open`]/[`PipeError::Write`] for IO failures.
pub fn write_message(path: &Path, payload: &[u8]) -> Result<(), PipeError> {
    require_fifo(path)?;
    let frame = encode_frame(payload)?;
    let mut pipe = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|source| PipeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    pipe.write_all(&frame).map_err(|source| PipeError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    pipe.flush().map_err(|source| PipeError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        target: PIPE_TARGET,
        path = %path.display(),
        bytes = payload.len(),
        "message written"
    );
    Ok(())
}

/// Reads one complete frame from the FIFO at `path` and returns its payload.
///
/// Blocks until a writer opens the pipe and then until the declared payload
/// length has arrived. A writer that hangs up before sending a single byte
/// has not sent a message, so the pipe is reopened and the wait continues.
///
/// # Errors
///
/// Returns [`PipeError::Truncated`] when the writer hangs up partway through
/// a frame, and [`PipeError::NotFound`], [`PipeError::NotAFifo`],
/// [`PipeError::Open`] or [`PipeError::Read`] for path and IO failures.
pub fn read_message(path: &Path) -> Result<Vec<u8>, PipeError> {
    loop {
        let mut pipe = open_reader(path)?;
        if let Some(payload) = read_frame(&mut pipe, path)? {
            return Ok(payload);
        }
        debug!(target: PIPE_TARGET, path = %path.display(), "writer closed without a frame");
    }
}

fn open_reader(path: &Path) -> Result<File, PipeError> {
    require_fifo(path)?;
    File::open(path).map_err(|source| PipeError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the next frame from `reader`.
///
/// `None` means the writer side closed on a frame boundary.
fn read_frame(reader: &mut impl Read, path: &Path) -> Result<Option<Vec<u8>>, PipeError> {
    let read_error = |source| PipeError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut prefix = [0_u8; PREFIX_LEN];
    let prefix_len = read_full(reader, &mut prefix).map_err(read_error)?;
    if prefix_len == 0 {
        return Ok(None);
    }
    if prefix_len < PREFIX_LEN {
        return Err(PipeError::Truncated {
            path: path.to_path_buf(),
            expected: PREFIX_LEN as u64,
            received: prefix_len as u64,
        });
    }
    let expected = u64::from(decode_length(&prefix)?);

    // Grow with the data actually received instead of trusting the prefix.
    let mut payload = Vec::new();
    let received = Read::by_ref(reader)
        .take(expected)
        .read_to_end(&mut payload)
        .map_err(read_error)? as u64;
    if received < expected {
        return Err(PipeError::Truncated {
            path: path.to_path_buf(),
            expected,
            received,
        });
    }
    debug!(
        target: PIPE_TARGET,
        path = %path.display(),
        bytes = received,
        "message read"
    );
    Ok(Some(payload))
}

fn read_full(reader: &mut impl Read, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while let Some(rest) = buffer.get_mut(filled..) {
        if rest.is_empty() {
            break;
        }
        match reader.read(rest) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
    Ok(filled)
}

/// Serialises `envelope` and writes it to the FIFO at `path`.
///
/// # Errors
///
/// Returns [`ExchangeError::Envelope`] when the envelope cannot be encoded and
/// [`ExchangeError::Pipe`] when the transport fails.
pub fn send_envelope(path: &Path, envelope: &CommandEnvelope) -> Result<(), ExchangeError> {
    let payload = envelope.to_bytes()?;
    write_message(path, &payload)?;
    Ok(())
}

/// Reads one frame from the FIFO at `path` and decodes it as an envelope.
///
/// # Errors
///
/// Returns [`ExchangeError::Pipe`] when the transport fails and
/// [`ExchangeError::Envelope`] when the payload is not an envelope.
pub fn receive_envelope(path: &Path) -> Result<CommandEnvelope, ExchangeError> {
    let payload = read_message(path)?;
    Ok(CommandEnvelope::from_bytes(&payload)?)
}

/// Endless sequence of inbound messages read from one FIFO.
///
/// The read end stays open across frames and is reopened once every writer
/// has closed, so frames written back to back by successive producers are
/// all delivered. The iterator never ends on its own; callers bound it with
/// adapters such as [`Iterator::take`] when they need to stop.
#[derive(Debug)]
pub struct InboundMessages {
    path: PathBuf,
    pipe: Option<File>,
}

impl InboundMessages {
    /// Reads messages from the FIFO at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pipe: None,
        }
    }

    /// Pipe the messages are read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    fn next_message(&mut self) -> Result<Vec<u8>, PipeError> {
        loop {
            let mut pipe = match self.pipe.take() {
                Some(pipe) => pipe,
                None => open_reader(&self.path)?,
            };
            if let Some(payload) = read_frame(&mut pipe, &self.path)? {
                self.pipe = Some(pipe);
                return Ok(payload);
            }
            debug!(target: PIPE_TARGET, path = %self.path.display(), "writers closed; reopening");
        }
    }
}

impl Iterator for InboundMessages {
    type Item = Result<Vec<u8>, PipeError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_message())
    }
}
