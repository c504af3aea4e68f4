//! Codec trait and implementations for serializing/deserializing
//! channel messages.
//!
//! The session driver doesn't care HOW messages become bytes — it
//! just needs something that implements [`Codec`]. [`JsonCodec`] is
//! the wire format both peers speak today (UTF-8 JSON, one object per
//! channel message); a binary codec could be swapped in without
//! touching the engine or the transport.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode messages to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the codec is held by the session
/// actor task for the lifetime of the connection. `DeserializeOwned`
/// (vs plain `Deserialize`) lets the caller drop the input frame after
/// decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] using JSON via `serde_json`.
///
/// Human-readable, which makes channel traffic easy to inspect and
/// log while debugging a two-peer session. Behind the `json` feature
/// flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use runecast_protocol::{Codec, GameMessage, JsonCodec, Side};
///
/// let codec = JsonCodec;
/// let msg = GameMessage::GameOver { winner: Side::Player };
///
/// let bytes = codec.encode(&msg).unwrap();
/// let decoded: GameMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(msg, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
