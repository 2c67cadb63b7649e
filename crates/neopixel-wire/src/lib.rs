//! Wire protocol shared by `neopixeld` and its producers.
//!
//! Commands travel over a named pipe as frames: a 4-byte little-endian
//! length prefix followed by a UTF-8 JSON [`CommandEnvelope`]. The [`frame`]
//! module owns the byte layout, [`envelope`] the JSON schema and [`pipe`] the
//! one-message-per-open transport discipline.

pub mod envelope;
pub mod frame;
pub mod pipe;

pub use envelope::{CommandEnvelope, EnvelopeError};
pub use frame::{
    FrameError, MAX_FRAME_LEN, PREFIX_LEN, decode_frame, decode_length, encode_frame,
    frame_length,
};
pub use pipe::{
    ExchangeError, FIFO_MODE, FifoStatus, InboundMessages, PipeError, ensure_fifo, read_message,
    receive_envelope, send_envelope, write_message,
};
