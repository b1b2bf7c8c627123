//! Serial link port: the traits the service talks to, plus the adapters.
//!
//! A board is attached by a [`SerialOpener`] and produces a
//! [`SerialHandle`]: the write half plus a channel of complete lines read
//! from the device.  The service never sees the tty itself, which is what
//! makes the attach/identity/read flows testable against
//! [`mock::MockSerialOpener`].

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub mod mock;
#[cfg(unix)]
pub mod tty;

/// Error type for serial link operations.
#[derive(Debug, Error)]
pub enum SerialError {
    /// The device file could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A write to the device failed.
    #[error("write to {path} failed: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The link is no longer usable.
    #[error("serial link to {path} closed")]
    Closed { path: String },
}

/// An open serial link: the write half and the inbound line channel.
///
/// The channel's sender side lives in the adapter's read task; it closes
/// when the device goes away, which is how consumers observe detachment.
pub struct SerialHandle {
    pub writer: Box<dyn SerialWriter>,
    pub lines: mpsc::Receiver<String>,
}

/// Write half of a serial link.
#[async_trait]
pub trait SerialWriter: Send + Sync {
    /// Writes one line to the device, terminator included.
    async fn write_line(&mut self, data: &str) -> Result<(), SerialError>;

    /// Discards anything buffered on the link.  Used between the two `ID`
    /// probe writes; some boards garble the first write after open.
    async fn clear(&mut self) -> Result<(), SerialError>;
}

/// Opens serial links to device paths.
#[async_trait]
pub trait SerialOpener: Send + Sync {
    /// Opens the device at `path` at the given baud rate.
    ///
    /// # Errors
    ///
    /// Returns [`SerialError::Open`] if the device cannot be opened.
    async fn open(&self, path: &str, baud_rate: u32) -> Result<SerialHandle, SerialError>;
}
