//! The versioned JSON envelope shared by both directions of the bus.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value, json};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::errors::{CodecError, TransportError};
use crate::identity::DeviceIdentity;

/// Protocol version stamped on every outbound envelope. Inbound envelopes
/// with any other version are dropped, not errored.
pub const PROTOCOL_VERSION: u32 = 1;

/// Upper bound on inbound datagram size. Matches the fixed decode buffer
/// used by the embedded devices on the same bus; anything larger is
/// rejected whole rather than truncated.
pub const MAX_DATAGRAM_LEN: usize = 896;

/// The type tag of an envelope.
///
/// `discover`, `pong` and `state` flow device-to-hub; `ping` and `command`
/// flow hub-to-device. Anything else decodes as [`MessageType::Unknown`]
/// and is never dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum MessageType {
    Discover,
    Ping,
    Pong,
    State,
    Command,
    Unknown,
}

impl MessageType {
    /// The wire tag for this message type.
    pub fn tag(self) -> &'static str {
        match self {
            MessageType::Discover => "discover",
            MessageType::Ping => "ping",
            MessageType::Pong => "pong",
            MessageType::State => "state",
            MessageType::Command => "command",
            MessageType::Unknown => "unknown",
        }
    }

    /// Parse a wire tag, mapping anything unrecognized (including the
    /// empty string a tag-less envelope defaults to) to `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        MessageType::iter()
            .find(|kind| kind.tag() == tag)
            .unwrap_or(MessageType::Unknown)
    }

    /// Whether a message of this type names its sender as the hub.
    ///
    /// Only `ping` and `command` are hub-originated in this protocol; a
    /// `discover` or `state` overheard from a peer must never move the
    /// hub record.
    pub(crate) fn is_hub_evidence(self) -> bool {
        matches!(self, MessageType::Ping | MessageType::Command)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A decoded inbound envelope. Transient: constructed per datagram and
/// discarded after dispatch.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub version: u32,
    pub kind: MessageType,
    pub id: String,
    pub class: String,
    pub payload: Map<String, Value>,
}

/// Raw wire shape with the protocol's lenient field defaults: a missing
/// `v` reads as 0 (unsupported), missing strings read as empty.
#[derive(Deserialize)]
struct WireEnvelope {
    #[serde(default)]
    v: u32,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    payload: Map<String, Value>,
}

/// Serialize an outbound envelope.
///
/// The caller's payload is union-merged with the stable identity fields
/// `name` and `fw`; on a key collision the identity fields win, so a hub
/// can always trust them.
pub fn encode(
    kind: MessageType,
    identity: &DeviceIdentity,
    payload: &Map<String, Value>,
) -> Result<Vec<u8>, TransportError> {
    let mut merged = payload.clone();
    merged.insert("name".to_string(), Value::from(identity.name()));
    merged.insert("fw".to_string(), Value::from(identity.firmware_version()));

    let doc = json!({
        "v": PROTOCOL_VERSION,
        "type": kind.tag(),
        "id": identity.id(),
        "class": identity.class(),
        "payload": merged,
    });
    serde_json::to_vec(&doc).map_err(TransportError::Encode)
}

/// Decode an inbound datagram, all-or-nothing.
///
/// Oversized or unparseable input yields [`CodecError::Malformed`]; a
/// well-formed envelope of any version other than [`PROTOCOL_VERSION`]
/// yields [`CodecError::UnsupportedVersion`]. Callers treat both as
/// "ignore this packet."
pub fn decode(bytes: &[u8]) -> Result<Envelope, CodecError> {
    if bytes.len() > MAX_DATAGRAM_LEN {
        return Err(CodecError::Malformed(format!(
            "{} byte datagram exceeds the {MAX_DATAGRAM_LEN} byte bound",
            bytes.len()
        )));
    }

    let wire: WireEnvelope = serde_json::from_slice(bytes).map_err(CodecError::malformed)?;
    if wire.v != PROTOCOL_VERSION {
        return Err(CodecError::UnsupportedVersion(wire.v));
    }

    Ok(Envelope {
        version: wire.v,
        kind: MessageType::from_tag(&wire.kind),
        id: wire.id,
        class: wire.class,
        payload: wire.payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity() -> DeviceIdentity {
        DeviceIdentity::new("dev-1", "rgb", "Shelf Light", "2.0.0")
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_round_trip_preserves_payload() {
        let payload = map(json!({"on": true, "brightness": 128}));
        let bytes = encode(MessageType::State, &identity(), &payload).unwrap();

        let env = decode(&bytes).unwrap();
        assert_eq!(env.version, PROTOCOL_VERSION);
        assert_eq!(env.kind, MessageType::State);
        assert_eq!(env.id, "dev-1");
        assert_eq!(env.class, "rgb");
        assert_eq!(env.payload["on"], json!(true));
        assert_eq!(env.payload["brightness"], json!(128));
        // Engine-added identity fields are additive.
        assert_eq!(env.payload["name"], json!("Shelf Light"));
        assert_eq!(env.payload["fw"], json!("2.0.0"));
    }

    #[test]
    fn test_identity_fields_override_caller_keys() {
        let payload = map(json!({"name": "spoofed", "fw": "0.0.0"}));
        let bytes = encode(MessageType::State, &identity(), &payload).unwrap();

        let env = decode(&bytes).unwrap();
        assert_eq!(env.payload["name"], json!("Shelf Light"));
        assert_eq!(env.payload["fw"], json!("2.0.0"));
    }

    #[test]
    fn test_decode_defaults_missing_fields() {
        let bytes = serde_json::to_vec(&json!({"v": 1})).unwrap();
        let env = decode(&bytes).unwrap();
        assert_eq!(env.kind, MessageType::Unknown);
        assert_eq!(env.id, "");
        assert_eq!(env.class, "");
        assert!(env.payload.is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode(b"{not json").unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn test_decode_rejects_oversized_input() {
        let oversized = vec![b'x'; MAX_DATAGRAM_LEN + 1];
        let err = decode(&oversized).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn test_decode_drops_other_versions() {
        for v in [0, 2, 99] {
            let bytes = serde_json::to_vec(&json!({"v": v, "type": "command"})).unwrap();
            let err = decode(&bytes).unwrap_err();
            assert_eq!(err, CodecError::UnsupportedVersion(v));
        }
        // Missing version reads as 0, which is unsupported.
        let bytes = serde_json::to_vec(&json!({"type": "command"})).unwrap();
        assert_eq!(decode(&bytes).unwrap_err(), CodecError::UnsupportedVersion(0));
    }

    #[test]
    fn test_tag_round_trip() {
        for kind in MessageType::iter() {
            assert_eq!(MessageType::from_tag(kind.tag()), kind);
        }
        assert_eq!(MessageType::from_tag("syncPilot"), MessageType::Unknown);
        assert_eq!(MessageType::from_tag(""), MessageType::Unknown);
    }

    #[test]
    fn test_hub_evidence_types() {
        assert!(MessageType::Ping.is_hub_evidence());
        assert!(MessageType::Command.is_hub_evidence());
        assert!(!MessageType::Discover.is_hub_evidence());
        assert!(!MessageType::State.is_hub_evidence());
        assert!(!MessageType::Pong.is_hub_evidence());
        assert!(!MessageType::Unknown.is_hub_evidence());
    }
}
