//! The two named dispatch policies.
//!
//! The client's reaction to the event feed historically existed in two
//! near-duplicate versions with silently divergent behavior.  Neither is
//! authoritative, so both are kept as named, selectable policies rather
//! than merged — the differences (what reacts, what announces, what
//! happens to unmatched events) are part of each policy's contract and are
//! pinned by tests in `application::dispatch`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Which policy table the dispatcher uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Variant 1: reacts to `added` by flashing the fixed name `arduino`;
    /// events outside its table are dropped without a log line.
    ByName,
    /// Variant 2: announces itself on startup, reacts to `device` by
    /// flashing that device, and logs `not handled` for unmatched events.
    ByDevice,
}

impl DispatchPolicy {
    /// Whether this policy emits the `{"connected": ...}` startup
    /// announcement before any inbound frame is processed.
    pub fn announces_on_startup(&self) -> bool {
        matches!(self, DispatchPolicy::ByDevice)
    }
}

impl fmt::Display for DispatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchPolicy::ByName => write!(f, "by-name"),
            DispatchPolicy::ByDevice => write!(f, "by-device"),
        }
    }
}

/// Error for an unrecognized `--policy` value.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown policy '{0}': expected 'by-name' or 'by-device'")]
pub struct PolicyParseError(String);

impl FromStr for DispatchPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "by-name" => Ok(DispatchPolicy::ByName),
            "by-device" => Ok(DispatchPolicy::ByDevice),
            other => Err(PolicyParseError(other.to_string())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
