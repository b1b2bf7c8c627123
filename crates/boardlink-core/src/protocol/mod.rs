//! Protocol module containing the wire message types and the frame codec.

pub mod commands;
pub mod events;
pub mod frame;

pub use commands::{ClientCommand, SendCommand, StreamTag};
pub use events::GatewayEvent;
pub use frame::{decode_frame, encode_frame, FrameError};
