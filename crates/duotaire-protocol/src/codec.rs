//! Codec trait for turning messages into text frames and back.
//!
//! The transport carries self-contained text frames; it doesn't care what
//! is in them. Whether those frames are pretty JSON snapshots or some
//! compact delta encoding is a policy decision made here, invisible to the
//! room engine.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values into text frames and decodes frames back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes one frame back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the frame is malformed or
    /// doesn't match the expected shape.
    fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<T, ProtocolError>;
}

/// JSON codec — one JSON object per frame.
///
/// Human-readable, inspectable in browser DevTools, and what the client
/// SDK speaks. A binary delta codec could replace this without touching
/// the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientMessage;

    #[test]
    fn test_json_codec_round_trip() {
        let codec = JsonCodec;
        let msg = ClientMessage::JoinRoom {
            room_code: "QZWXYZ".into(),
        };
        let frame = codec.encode(&msg).unwrap();
        let back: ClientMessage = codec.decode(&frame).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_json_codec_decode_garbage_is_error() {
        let codec = JsonCodec;
        let result: Result<ClientMessage, _> = codec.decode("not json at all");
        assert!(result.is_err());
    }

    #[test]
    fn test_json_codec_decode_wrong_shape_is_error() {
        let codec = JsonCodec;
        let result: Result<ClientMessage, _> =
            codec.decode(r#"{"name": "hello"}"#);
        assert!(result.is_err());
    }
}
