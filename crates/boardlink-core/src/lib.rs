//! # boardlink-core
//!
//! Shared library for Boardlink containing the wire protocol types and the
//! newline-delimited JSON frame codec.
//!
//! This crate is used by both the gateway daemon and the client application.
//! It has zero dependencies on sockets, serial ports, or the async runtime.
//!
//! # Wire format
//!
//! Both channels carry one UTF-8 JSON object per frame, terminated by a
//! newline:
//!
//! - **Event feed** (gateway → clients, default port 5559): single-key
//!   objects such as `{"device":"/dev/ttyACM0"}` — see
//!   [`protocol::events::GatewayEvent`].
//! - **Command sink** (clients → gateway, default port 5558): objects such
//!   as `{"send":{"name":"arduino","data":"FLASH"}}` — see
//!   [`protocol::commands::ClientCommand`].

pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `boardlink_core::GatewayEvent` instead of the full module path.
pub use protocol::commands::{ClientCommand, SendCommand, StreamTag};
pub use protocol::events::GatewayEvent;
pub use protocol::frame::{decode_frame, encode_frame, FrameError};

/// Default TCP port of the gateway's event feed (gateway → clients).
pub const DEFAULT_EVENT_PORT: u16 = 5559;

/// Default TCP port of the gateway's command sink (clients → gateway).
pub const DEFAULT_COMMAND_PORT: u16 = 5558;
