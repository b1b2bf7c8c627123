//! Event frames pushed by the gateway to every subscribed client.
//!
//! # Wire shape
//!
//! Unlike a `{"type": ...}`-tagged protocol, each event is a JSON object
//! whose *key* is the discriminant:
//!
//! ```json
//! {"device":"/dev/ttyACM0"}
//! {"id":{"device":"/dev/ttyACM0","name":"arduino"}}
//! {"received":{"device":"/dev/ttyACM0","data":"pong"}}
//! {"error":"couldn't open port"}
//! ```
//!
//! # Match order
//!
//! Decoding checks the keys in a fixed priority order and the first present
//! key wins: `sent`, `added`, `device`, `id`, `received`, `removed`,
//! `error`.  An object with several recognized keys therefore decodes as
//! the highest-priority one, and an object with none of them decodes as
//! [`GatewayEvent::Unrecognized`] — an explicit variant, so every consumer
//! match is exhaustive and the "none matched" case cannot silently fall
//! through.
//!
//! A recognized key whose value has the wrong shape (e.g. `{"added":5}`
//! where a string is required) does *not* match that variant; the check
//! continues down the priority order.

use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::protocol::frame::{self, FrameError};

/// One event frame from the gateway's feed, discriminated by its JSON key.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// `{"sent": <any>}` — a prior send was written to a device.
    ///
    /// The gateway sets the value to the device path; clients treat the
    /// value as an opaque flag.
    Sent(Value),
    /// `{"added": "<id-or-path>"}` — a device was added.
    Added(String),
    /// `{"device": "<path>"}` — a device connected.
    Device(String),
    /// `{"id": <payload>}` — a device reported its identity.
    ///
    /// The gateway emits `{"device": path, "name": id}` as the payload.
    Id(Value),
    /// `{"received": <payload>}` — a line was read from a device.
    Received(Value),
    /// `{"removed": "<path>"}` — a device was unplugged.
    Removed(String),
    /// `{"error": "<message>"}` — a gateway-side error.
    Error(String),
    /// An object that matched none of the recognized keys.
    Unrecognized(Map<String, Value>),
}

impl GatewayEvent {
    /// The wire label of this event — the JSON key it is carried under.
    ///
    /// [`GatewayEvent::Unrecognized`] has no key of its own and reports
    /// `"unrecognized"`.
    pub fn label(&self) -> &'static str {
        match self {
            GatewayEvent::Sent(_) => "sent",
            GatewayEvent::Added(_) => "added",
            GatewayEvent::Device(_) => "device",
            GatewayEvent::Id(_) => "id",
            GatewayEvent::Received(_) => "received",
            GatewayEvent::Removed(_) => "removed",
            GatewayEvent::Error(_) => "error",
            GatewayEvent::Unrecognized(_) => "unrecognized",
        }
    }

    /// Builds the `{"id": {"device": ..., "name": ...}}` identity report.
    pub fn id_report(device: &str, name: &str) -> Self {
        GatewayEvent::Id(serde_json::json!({ "device": device, "name": name }))
    }

    /// Builds the `{"received": {"device": ..., "data": ...}}` data report.
    pub fn received_line(device: &str, data: &str) -> Self {
        GatewayEvent::Received(serde_json::json!({ "device": device, "data": data }))
    }

    /// Builds the `{"sent": "<path>"}` write acknowledgement.
    pub fn sent(device: &str) -> Self {
        GatewayEvent::Sent(Value::String(device.to_string()))
    }

    /// Builds the `{"error": "<message>"}` frame.
    pub fn error(message: &str) -> Self {
        GatewayEvent::Error(message.to_string())
    }

    /// Decodes an event from a decoded JSON object, first matching key wins.
    pub fn from_object(obj: Map<String, Value>) -> Self {
        // Priority order mirrors the sequential checks consumers historically
        // performed on these frames; it must not be reordered.
        if let Some(v) = obj.get("sent") {
            return GatewayEvent::Sent(v.clone());
        }
        if let Some(s) = obj.get("added").and_then(Value::as_str) {
            return GatewayEvent::Added(s.to_string());
        }
        if let Some(s) = obj.get("device").and_then(Value::as_str) {
            return GatewayEvent::Device(s.to_string());
        }
        if let Some(v) = obj.get("id") {
            return GatewayEvent::Id(v.clone());
        }
        if let Some(v) = obj.get("received") {
            return GatewayEvent::Received(v.clone());
        }
        if let Some(s) = obj.get("removed").and_then(Value::as_str) {
            return GatewayEvent::Removed(s.to_string());
        }
        if let Some(s) = obj.get("error").and_then(Value::as_str) {
            return GatewayEvent::Error(s.to_string());
        }
        GatewayEvent::Unrecognized(obj)
    }

    /// Returns the event as the JSON value it travels as on the wire.
    pub fn to_value(&self) -> Value {
        let (key, value) = match self {
            GatewayEvent::Sent(v) => ("sent", v.clone()),
            GatewayEvent::Added(s) => ("added", Value::String(s.clone())),
            GatewayEvent::Device(s) => ("device", Value::String(s.clone())),
            GatewayEvent::Id(v) => ("id", v.clone()),
            GatewayEvent::Received(v) => ("received", v.clone()),
            GatewayEvent::Removed(s) => ("removed", Value::String(s.clone())),
            GatewayEvent::Error(s) => ("error", Value::String(s.clone())),
            GatewayEvent::Unrecognized(obj) => return Value::Object(obj.clone()),
        };
        let mut obj = Map::with_capacity(1);
        obj.insert(key.to_string(), value);
        Value::Object(obj)
    }

    /// Decodes one raw frame into an event.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] if the frame is not UTF-8, not JSON, or not
    /// a JSON object.  An object with no recognized key is *not* an error;
    /// it decodes as [`GatewayEvent::Unrecognized`].
    pub fn decode(raw: &[u8]) -> Result<Self, FrameError> {
        match frame::decode_frame::<Value>(raw)? {
            Value::Object(obj) => Ok(Self::from_object(obj)),
            _ => Err(FrameError::NotAnObject),
        }
    }

    /// Encodes the event as one wire frame, newline included.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Json`] if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        frame::encode_frame(&self.to_value())
    }
}

impl Serialize for GatewayEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_value() {
            Value::Object(obj) => {
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in &obj {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            // to_value always yields an object
            _ => Err(serde::ser::Error::custom("event did not serialize to an object")),
        }
    }
}

impl<'de> Deserialize<'de> for GatewayEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(obj) => Ok(Self::from_object(obj)),
            other => Err(D::Error::custom(format!(
                "expected a JSON object event frame, got {other}"
            ))),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_device_frame_decodes_to_device_variant() {
        // Arrange
        let raw = b"{\"device\":\"/dev/ttyACM0\"}\n";

        // Act
        let event = GatewayEvent::decode(raw).unwrap();

        // Assert
        assert_eq!(event, GatewayEvent::Device("/dev/ttyACM0".to_string()));
        assert_eq!(event.label(), "device");
    }

    #[test]
    fn test_sent_frame_accepts_any_value() {
        // The gateway sends the device path, older peers send `true`; both
        // must decode as Sent.
        let from_bool = GatewayEvent::decode(b"{\"sent\":true}").unwrap();
        let from_path = GatewayEvent::decode(b"{\"sent\":\"/dev/ttyUSB0\"}").unwrap();

        assert_eq!(from_bool.label(), "sent");
        assert_eq!(from_path.label(), "sent");
    }

    #[test]
    fn test_match_order_sent_beats_added() {
        // Arrange: two recognized keys in one object
        let obj = json!({"added": "dev1", "sent": true});

        // Act
        let event = GatewayEvent::from_object(obj.as_object().unwrap().clone());

        // Assert: `sent` is checked first, so it wins
        assert_eq!(event.label(), "sent");
    }

    #[test]
    fn test_unknown_keys_decode_as_unrecognized() {
        // Arrange
        let raw = b"{\"foo\":\"bar\"}";

        // Act
        let event = GatewayEvent::decode(raw).unwrap();

        // Assert
        match event {
            GatewayEvent::Unrecognized(obj) => assert_eq!(obj["foo"], "bar"),
            other => panic!("expected Unrecognized, got {other:?}"),
        }
    }

    #[test]
    fn test_wrongly_typed_added_falls_through_to_unrecognized() {
        // `added` must carry a string identifier; a number does not match.
        let event = GatewayEvent::decode(b"{\"added\":5}").unwrap();
        assert!(matches!(event, GatewayEvent::Unrecognized(_)));
    }

    #[test]
    fn test_non_object_frame_is_a_decode_fault() {
        let result = GatewayEvent::decode(b"[1,2,3]");
        assert!(matches!(result, Err(FrameError::NotAnObject)));
    }

    #[test]
    fn test_malformed_frame_is_a_decode_fault() {
        let result = GatewayEvent::decode(b"not json at all");
        assert!(matches!(result, Err(FrameError::Json(_))));
    }

    #[test]
    fn test_id_report_wire_shape() {
        // Arrange / Act
        let event = GatewayEvent::id_report("/dev/ttyACM0", "arduino");

        // Assert: exact wire shape of the identity report
        assert_eq!(
            event.to_value(),
            json!({"id": {"device": "/dev/ttyACM0", "name": "arduino"}})
        );
    }

    #[test]
    fn test_received_line_wire_shape() {
        let event = GatewayEvent::received_line("/dev/ttyACM0", "pong");
        assert_eq!(
            event.to_value(),
            json!({"received": {"device": "/dev/ttyACM0", "data": "pong"}})
        );
    }

    #[test]
    fn test_event_round_trips_through_frame_codec() {
        let original = GatewayEvent::Removed("/dev/ttyUSB1".to_string());
        let bytes = original.encode().unwrap();
        let decoded = GatewayEvent::decode(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_serde_deserialize_integration() {
        // GatewayEvent also works through plain serde entry points.
        let event: GatewayEvent = serde_json::from_str("{\"error\":\"boom\"}").unwrap();
        assert_eq!(event, GatewayEvent::Error("boom".to_string()));
    }
}
