//! Error types for the protocol layer.
//!
//! Each crate in Runecast defines its own error enum, so a
//! `ProtocolError` always points at serialization, never at the
//! transport or the game rules.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown `type` tag,
    /// missing fields, or a truncated frame. The session driver logs
    /// and drops these — they are never fatal to the session.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but violates a protocol rule — e.g. a
    /// selection with more than three dice.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
