//! Per-device link state.
//!
//! A [`DeviceLink`] is the pure bookkeeping half of an attached board: its
//! tty path, the identity it reported (if any), and the stream tag a
//! client may have attached to it.  The serial handle itself lives in the
//! application layer's registry entry, next to this.

use boardlink_core::StreamTag;

/// Metadata for one attached board.
///
/// A freshly attached board has no identity yet; by protocol, the first
/// line it produces (the reply to the `ID` probe) *is* its identity, and
/// every line after that is data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLink {
    /// Tty path the board is attached at, e.g. `/dev/ttyACM0`.
    pub path: String,
    /// Identity reported by the board, once known.
    pub identity: Option<String>,
    /// Upstream routing metadata attached by a client, if any.
    pub stream: Option<StreamTag>,
}

impl DeviceLink {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            identity: None,
            stream: None,
        }
    }

    /// Whether the next line from this board is its identity.
    pub fn awaiting_identity(&self) -> bool {
        self.identity.is_none()
    }

    /// Records the identity line (trimmed) and returns it.
    pub fn record_identity(&mut self, line: &str) -> &str {
        self.identity = Some(line.trim().to_string());
        self.identity.as_deref().unwrap_or_default()
    }

    /// Whether this board reported the given identity.
    pub fn matches_identity(&self, identity: &str) -> bool {
        self.identity.as_deref() == Some(identity)
    }
}
