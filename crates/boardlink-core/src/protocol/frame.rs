//! Newline-delimited JSON frame codec.
//!
//! A frame is one UTF-8 JSON object followed by `\n`.  The codec is
//! deliberately thin: TCP line framing is handled by the callers' buffered
//! readers, so this module only converts between raw frame bytes and typed
//! messages.
//!
//! A frame that is not valid UTF-8, not valid JSON, or not a JSON object is
//! a decode fault.  The codec reports it as a typed [`FrameError`]; whether
//! a fault is recoverable is the caller's policy, not the codec's.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while encoding or decoding a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame bytes are not valid UTF-8.
    #[error("frame is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    /// The frame text is not valid JSON, or does not match the target type.
    #[error("frame is not a valid JSON message: {0}")]
    Json(#[from] serde_json::Error),

    /// The frame decoded to a JSON value that is not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// The frame is empty (blank line).
    #[error("frame is empty")]
    Empty,
}

/// Encodes a message as one JSON frame, including the trailing newline.
///
/// # Errors
///
/// Returns [`FrameError::Json`] if serialization fails.
pub fn encode_frame<T: Serialize>(msg: &T) -> Result<Vec<u8>, FrameError> {
    let mut bytes = serde_json::to_vec(msg)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decodes one frame into a typed message.
///
/// Trailing line terminators (`\n`, `\r\n`) and surrounding whitespace are
/// stripped before parsing.
///
/// # Errors
///
/// Returns a [`FrameError`] if the bytes are not UTF-8, not JSON, or do not
/// deserialize into `T`.
pub fn decode_frame<T: DeserializeOwned>(raw: &[u8]) -> Result<T, FrameError> {
    let text = std::str::from_utf8(raw)?.trim();
    if text.is_empty() {
        return Err(FrameError::Empty);
    }
    Ok(serde_json::from_str(text)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
