//! DeviceRegistry: the gateway's in-memory table of attached boards.
//!
//! Each entry pairs the pure [`DeviceLink`] metadata with the serial
//! writer for that board.  Entries keep insertion order (a `Vec`, not a
//! map) because the send fallback targets "the first registered device"
//! and that must mean the oldest attachment.
//!
//! # Send routing
//!
//! [`DeviceRegistry::route_mut`] resolves a `send` command's target with a
//! fixed precedence:
//!
//! 1. identity (`id` or `name` wire key) — unknown identity is an error;
//! 2. tty path (`device` wire key) — unknown path is an error;
//! 3. no target at all — the first registered device, or an error when
//!    the registry is empty.

use thiserror::Error;

use boardlink_core::SendCommand;

use crate::domain::connection::DeviceLink;
use crate::infrastructure::serial::SerialWriter;

/// Why a `send` command could not be routed to a device.
///
/// The message text of each variant is sent verbatim as the `error` event
/// frame, so peers can match on it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// A target was named but no attached board matches it.
    #[error("not connected")]
    NotConnected,
    /// No target was named and no boards are attached.
    #[error("no id or device or no devices connected")]
    NoTarget,
}

/// One attached board: its metadata plus the open serial writer.
pub struct RegisteredDevice {
    pub link: DeviceLink,
    pub writer: Box<dyn SerialWriter>,
}

/// Added/removed paths produced by diffing a scan against the registry.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// In-memory registry of all attached boards, in attachment order.
#[derive(Default)]
pub struct DeviceRegistry {
    entries: Vec<RegisteredDevice>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Registers a freshly attached board at the end of the order.
    pub fn insert(&mut self, device: RegisteredDevice) {
        self.entries.push(device);
    }

    /// Removes and returns the board at `path`.
    pub fn remove(&mut self, path: &str) -> Option<RegisteredDevice> {
        let index = self.entries.iter().position(|d| d.link.path == path)?;
        Some(self.entries.remove(index))
    }

    /// The board attached at `path`.
    pub fn get_mut(&mut self, path: &str) -> Option<&mut RegisteredDevice> {
        self.entries.iter_mut().find(|d| d.link.path == path)
    }

    /// All attached boards, in attachment order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredDevice> {
        self.entries.iter()
    }

    /// Resolves the target of a `send` command.
    ///
    /// # Errors
    ///
    /// [`RouteError::NotConnected`] when a named target (identity or path)
    /// matches no attached board; [`RouteError::NoTarget`] when the command
    /// names no target and nothing is attached.
    pub fn route_mut(
        &mut self,
        command: &SendCommand,
    ) -> Result<&mut RegisteredDevice, RouteError> {
        if let Some(identity) = command.identity() {
            return self
                .entries
                .iter_mut()
                .find(|d| d.link.matches_identity(identity))
                .ok_or(RouteError::NotConnected);
        }
        if let Some(path) = command.device.as_deref() {
            return self
                .entries
                .iter_mut()
                .find(|d| d.link.path == path)
                .ok_or(RouteError::NotConnected);
        }
        self.entries.first_mut().ok_or(RouteError::NoTarget)
    }

    /// Diffs the current scan result against the registered paths.
    pub fn diff_against(&self, scanned: &[String]) -> ScanDiff {
        let added = scanned
            .iter()
            .filter(|path| !self.entries.iter().any(|d| &d.link.path == *path))
            .cloned()
            .collect();
        let removed = self
            .entries
            .iter()
            .filter(|d| !scanned.contains(&d.link.path))
            .map(|d| d.link.path.clone())
            .collect();
        ScanDiff { added, removed }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
