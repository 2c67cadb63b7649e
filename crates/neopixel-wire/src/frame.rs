//! Length-prefixed framing shared by producers and the daemon.
//!
//! A frame is a 4-byte little-endian unsigned length followed by exactly that
//! many payload bytes. The codec never looks inside the payload.

use thiserror::Error;

/// Size of the length prefix in bytes.
pub const PREFIX_LEN: usize = 4;

/// Largest payload a frame can describe.
pub const MAX_FRAME_LEN: u32 = u32::MAX;

/// Errors raised while encoding or decoding frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The payload does not fit in a 32-bit length prefix.
    #[error("payload of {len} bytes exceeds the {max} byte frame limit")]
    Oversize {
        /// Length of the rejected payload.
        len: usize,
        /// Maximum encodable length.
        max: u32,
    },
    /// The length prefix was not exactly four bytes.
    #[error("length prefix must be {PREFIX_LEN} bytes, got {len}")]
    MalformedLength {
        /// Number of bytes supplied.
        len: usize,
    },
    /// The frame ended before the declared payload length.
    #[error("frame declares {expected} payload bytes but only {actual} arrived")]
    Truncated {
        /// Length declared by the prefix.
        expected: u32,
        /// Payload bytes actually present.
        actual: usize,
    },
    /// The buffer continued past the declared payload.
    #[error("frame declares {expected} payload bytes but {actual} follow the prefix")]
    TrailingBytes {
        /// Length declared by the prefix.
        expected: u32,
        /// Payload bytes actually present.
        actual: usize,
    },
}

/// Validates that `len` can be described by a frame prefix.
///
/// # Errors
///
/// Returns [`FrameError::Oversize`] when `len` exceeds [`MAX_FRAME_LEN`].
pub fn frame_length(len: usize) -> Result<u32, FrameError> {
    u32::try_from(len).map_err(|_| FrameError::Oversize {
        len,
        max: MAX_FRAME_LEN,
    })
}

/// Frames `payload` behind its little-endian length prefix.
///
/// # Errors
///
/// Returns [`FrameError::Oversize`] when the payload is longer than
/// [`MAX_FRAME_LEN`].
#[expect(
    clippy::little_endian_bytes,
    reason = "the wire format fixes the prefix to little-endian"
)]
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let len = frame_length(payload.len())?;
    let mut frame = Vec::with_capacity(PREFIX_LEN + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Interprets a 4-byte little-endian length prefix.
///
/// # Errors
///
/// Returns [`FrameError::MalformedLength`] unless exactly four bytes are
/// supplied.
#[expect(
    clippy::little_endian_bytes,
    reason = "the wire format fixes the prefix to little-endian"
)]
pub fn decode_length(bytes: &[u8]) -> Result<u32, FrameError> {
    let prefix: [u8; PREFIX_LEN] = bytes
        .try_into()
        .map_err(|_| FrameError::MalformedLength { len: bytes.len() })?;
    Ok(u32::from_le_bytes(prefix))
}

/// Splits a complete in-memory frame and returns its payload.
///
/// # Errors
///
/// Returns [`FrameError::MalformedLength`] when the buffer is shorter than
/// the prefix, [`FrameError::Truncated`] when the payload is shorter than
/// declared and [`FrameError::TrailingBytes`] when it is longer.
pub fn decode_frame(bytes: &[u8]) -> Result<&[u8], FrameError> {
    let Some((prefix, payload)) = bytes.split_at_checked(PREFIX_LEN) else {
        return Err(FrameError::MalformedLength { len: bytes.len() });
    };
    let expected = decode_length(prefix)?;
    let declared = usize::try_from(expected).map_err(|_| FrameError::Oversize {
        len: payload.len(),
        max: MAX_FRAME_LEN,
    })?;
    match payload.len().cmp(&declared) {
        std::cmp::Ordering::Less => Err(FrameError::Truncated {
            expected,
            actual: payload.len(),
        }),
        std::cmp::Ordering::Greater => Err(FrameError::TrailingBytes {
            expected,
            actual: payload.len(),
        }),
        std::cmp::Ordering::Equal => Ok(payload),
    }
}
