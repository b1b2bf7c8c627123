//! Command frames accepted by the gateway on its command sink.
//!
//! Same key-discriminated wire shape as the event feed, checked in the
//! order `connected`, `stream`, `send`:
//!
//! ```json
//! {"connected":"me"}
//! {"stream":"s1","user":"u1","device":"/dev/ttyACM0","sequence":"7"}
//! {"send":{"name":"arduino","data":"FLASH"}}
//! {"send":{"device":"/dev/ttyACM0","data":"FLASH"}}
//! {"send":{"data":"FLASH"}}
//! ```
//!
//! Targeting a `send`: `id` and `name` both select a device by its
//! reported identity (the historical variant-1 client sends `name` with
//! exactly that meaning), `device` selects by tty path, and a `send` with
//! no target falls back to the gateway's first registered device.
//! Field-level validation (missing `data`, missing `user`) is the gateway's
//! job; decoding here is permissive so the gateway can answer with its own
//! error frames instead of dropping the connection.

use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::protocol::frame::{self, FrameError};

/// Payload of a `{"send": {...}}` command.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SendCommand {
    /// Device identity to target, as reported by the board's `ID` reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Device identity to target — same meaning as `id`, kept as its own
    /// wire key because the variant-1 client shape uses `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Device tty path to target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// The line to write to the board.  Required; validated by the gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Payload of a `{"stream": ...}` tagging command.
///
/// Attaches upstream routing metadata to a device connection.  The gateway
/// stores the tags verbatim; `user` and `device` are required there,
/// `sequence` is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamTag {
    /// Stream identifier.
    pub stream: String,
    /// User identifier.  Optional on the wire; the gateway rejects a tag
    /// without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Device path the tag applies to.  Optional on the wire; the gateway
    /// rejects a tag without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Optional sequence identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
}

/// One command frame from a client, discriminated by its JSON key.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// `{"connected": "<client-name>"}` — a client announces itself; the
    /// gateway re-announces every live device on the feed.
    Connected { name: String },
    /// `{"stream": ...}` — tag a device connection with routing metadata.
    Stream(StreamTag),
    /// `{"send": {...}}` — write a line to a device.
    Send(SendCommand),
    /// An object that matched none of the recognized keys.
    Unrecognized(Map<String, Value>),
}

impl SendCommand {
    /// The identity target of this send, whichever wire key carried it.
    /// `id` wins when both are present.
    pub fn identity(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }
}

impl ClientCommand {
    /// Builds a send addressed by reported device identity, using the
    /// variant-1 `name` wire key.
    pub fn send_to_name(name: &str, data: &str) -> Self {
        ClientCommand::Send(SendCommand {
            id: None,
            name: Some(name.to_string()),
            device: None,
            data: Some(data.to_string()),
        })
    }

    /// Builds a send addressed by device tty path.
    pub fn send_to_device(device: &str, data: &str) -> Self {
        ClientCommand::Send(SendCommand {
            id: None,
            name: None,
            device: Some(device.to_string()),
            data: Some(data.to_string()),
        })
    }

    /// Builds the client startup announcement.
    pub fn connected(name: &str) -> Self {
        ClientCommand::Connected {
            name: name.to_string(),
        }
    }

    /// Decodes a command from a decoded JSON object, first matching key wins.
    pub fn from_object(obj: Map<String, Value>) -> Self {
        if let Some(s) = obj.get("connected").and_then(Value::as_str) {
            return ClientCommand::Connected {
                name: s.to_string(),
            };
        }
        if obj.contains_key("stream") {
            // The stream tag is a flat multi-key object; deserialize the
            // whole frame as the tag.
            if let Ok(tag) = serde_json::from_value(Value::Object(obj.clone())) {
                return ClientCommand::Stream(tag);
            }
        }
        if let Some(send) = obj.get("send") {
            if let Ok(send) = serde_json::from_value(send.clone()) {
                return ClientCommand::Send(send);
            }
        }
        ClientCommand::Unrecognized(obj)
    }

    /// Returns the command as the JSON value it travels as on the wire.
    pub fn to_value(&self) -> Value {
        match self {
            ClientCommand::Connected { name } => {
                serde_json::json!({ "connected": name })
            }
            // serializing a StreamTag cannot fail: all fields are strings
            ClientCommand::Stream(tag) => serde_json::to_value(tag).unwrap_or(Value::Null),
            ClientCommand::Send(send) => {
                serde_json::json!({ "send": send })
            }
            ClientCommand::Unrecognized(obj) => Value::Object(obj.clone()),
        }
    }

    /// Decodes one raw frame into a command.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] if the frame is not UTF-8, not JSON, or not
    /// a JSON object.  An object with no recognized key is *not* an error;
    /// it decodes as [`ClientCommand::Unrecognized`].
    pub fn decode(raw: &[u8]) -> Result<Self, FrameError> {
        match frame::decode_frame::<Value>(raw)? {
            Value::Object(obj) => Ok(Self::from_object(obj)),
            _ => Err(FrameError::NotAnObject),
        }
    }

    /// Encodes the command as one wire frame, newline included.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Json`] if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        frame::encode_frame(&self.to_value())
    }
}

impl Serialize for ClientCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_value() {
            Value::Object(obj) => {
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in &obj {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            _ => Err(serde::ser::Error::custom("command did not serialize to an object")),
        }
    }
}

impl<'de> Deserialize<'de> for ClientCommand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(obj) => Ok(Self::from_object(obj)),
            other => Err(D::Error::custom(format!(
                "expected a JSON object command frame, got {other}"
            ))),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
