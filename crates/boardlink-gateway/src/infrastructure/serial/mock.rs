//! Mock serial adapter for unit and integration testing.
//!
//! The real adapter opens tty device files; tests have no boards plugged
//! in, so the mock records every write into a `Mutex<Vec<String>>` and
//! lets the test play the board's side by pushing lines into the handle's
//! channel.
//!
//! # Usage in tests
//!
//! ```ignore
//! let opener = MockSerialOpener::new();
//! let handle = opener.open("/dev/ttyUSB0", 9600).await.unwrap();
//!
//! let port = opener.port("/dev/ttyUSB0").unwrap();
//! port.push_line("arduino").await;        // the board replies to ID
//! assert_eq!(port.written(), vec!["ID", "ID"]);
//! ```
//!
//! Call [`MockSerialOpener::fail_on`] to make a path unopenable, and
//! [`MockPort::fail_writes`] to simulate a dead link mid-session.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{SerialError, SerialHandle, SerialOpener, SerialWriter};

/// A writer that records lines instead of touching hardware.
#[derive(Clone, Default)]
pub struct MockWriter {
    /// Every line passed to `write_line`, in order, without terminators.
    written: Arc<Mutex<Vec<String>>>,
    /// Number of `clear` calls observed.
    clears: Arc<Mutex<usize>>,
    /// When `true`, every write returns a [`SerialError::Write`].
    should_fail: Arc<AtomicBool>,
}

impl MockWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded lines.
    pub fn written(&self) -> Vec<String> {
        self.written.lock().unwrap().clone()
    }

    /// Number of buffer clears observed.
    pub fn clears(&self) -> usize {
        *self.clears.lock().unwrap()
    }

    /// Makes every subsequent write fail, simulating an unplugged board
    /// that the scan has not yet noticed.
    pub fn fail_writes(&self) {
        self.should_fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SerialWriter for MockWriter {
    async fn write_line(&mut self, data: &str) -> Result<(), SerialError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SerialError::Write {
                path: "<mock>".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "mock failure"),
            });
        }
        self.written.lock().unwrap().push(data.to_string());
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), SerialError> {
        *self.clears.lock().unwrap() += 1;
        Ok(())
    }
}

/// The test's view of one opened mock port.
#[derive(Clone)]
pub struct MockPort {
    writer: MockWriter,
    line_tx: mpsc::Sender<String>,
}

impl MockPort {
    /// Plays the board's side: delivers one line to the reader.
    pub async fn push_line(&self, line: &str) {
        // Ignore a dropped receiver; the test tore the handle down first.
        let _ = self.line_tx.send(line.to_string()).await;
    }

    /// Lines the gateway wrote to this port.
    pub fn written(&self) -> Vec<String> {
        self.writer.written()
    }

    /// Number of buffer clears the gateway performed.
    pub fn clears(&self) -> usize {
        self.writer.clears()
    }

    /// Makes every subsequent write to this port fail.
    pub fn fail_writes(&self) {
        self.writer.fail_writes();
    }
}

/// A [`SerialOpener`] that fabricates in-memory ports.
#[derive(Clone, Default)]
pub struct MockSerialOpener {
    ports: Arc<Mutex<HashMap<String, MockPort>>>,
    fail_paths: Arc<Mutex<HashSet<String>>>,
}

impl MockSerialOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `open` fail for the given path.
    pub fn fail_on(&self, path: &str) {
        self.fail_paths.lock().unwrap().insert(path.to_string());
    }

    /// The port opened at `path`, if any.
    pub fn port(&self, path: &str) -> Option<MockPort> {
        self.ports.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl SerialOpener for MockSerialOpener {
    async fn open(&self, path: &str, _baud_rate: u32) -> Result<SerialHandle, SerialError> {
        if self.fail_paths.lock().unwrap().contains(path) {
            return Err(SerialError::Open {
                path: path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock open failure"),
            });
        }

        let (line_tx, lines) = mpsc::channel(32);
        let writer = MockWriter::new();
        self.ports.lock().unwrap().insert(
            path.to_string(),
            MockPort {
                writer: writer.clone(),
                line_tx,
            },
        );
        Ok(SerialHandle {
            writer: Box::new(writer),
            lines,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
