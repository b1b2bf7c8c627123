//! Unix tty-file serial adapter.
//!
//! Arduino-style boards enumerate as CDC-ACM or USB-serial ttys and speak
//! plain line-oriented text, so the adapter treats the device node as a
//! file: one handle for writing, a cloned handle feeding a buffered line
//! reader.  CDC-ACM ignores the configured baud rate entirely; for the
//! USB-serial bridges this adapter relies on the kernel default (9600,
//! which is also the gateway default) rather than carrying a termios
//! dependency.
//!
//! The read task owns the line channel's sender: when the board is
//! unplugged the read fails, the task ends, and the channel closes — that
//! closure is how the rest of the gateway observes a dead link ahead of
//! the next scan.

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use super::{SerialError, SerialHandle, SerialOpener, SerialWriter};

const LINE_CHANNEL_CAPACITY: usize = 32;

/// Opens board tty device files.
#[derive(Debug, Clone, Default)]
pub struct TtyOpener;

impl TtyOpener {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SerialOpener for TtyOpener {
    async fn open(&self, path: &str, _baud_rate: u32) -> Result<SerialHandle, SerialError> {
        let open_err = |source| SerialError::Open {
            path: path.to_string(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .await
            .map_err(open_err)?;
        let read_half = file.try_clone().await.map_err(open_err)?;

        let (line_tx, lines) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        tokio::spawn(read_lines(path.to_string(), read_half, line_tx));

        Ok(SerialHandle {
            writer: Box::new(TtyWriter {
                path: path.to_string(),
                file,
            }),
            lines,
        })
    }
}

/// Forwards complete lines from the tty into the channel until the device
/// goes away or the handle is dropped.
async fn read_lines(path: String, file: File, line_tx: mpsc::Sender<String>) {
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if line_tx.send(line.clone()).await.is_err() {
                    break;
                }
            }
        }
    }
    debug!("tty read loop for {path} ended");
}

/// Write half of an open tty.
pub struct TtyWriter {
    path: String,
    file: File,
}

#[async_trait]
impl SerialWriter for TtyWriter {
    async fn write_line(&mut self, data: &str) -> Result<(), SerialError> {
        let write_err = |source| SerialError::Write {
            path: self.path.clone(),
            source,
        };
        self.file
            .write_all(format!("{data}\n").as_bytes())
            .await
            .map_err(write_err)?;
        self.file.flush().await.map_err(write_err)
    }

    async fn clear(&mut self) -> Result<(), SerialError> {
        // No userspace buffer to discard on a raw device file; flushing the
        // write half is the closest equivalent the probe needs.
        self.file.flush().await.map_err(|source| SerialError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
