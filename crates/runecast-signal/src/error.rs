//! Error types for the signaling layer.

use runecast_transport::TransportError;

/// Errors that can occur while negotiating a peer channel.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// The token failed to decode: bad base64, bad JSON, or a shape
    /// that isn't `[descriptor, candidate, ...]`.
    #[error("invalid signaling token: {0}")]
    BadToken(String),

    /// The token carries the wrong intent for this step — e.g. an
    /// offer pasted where an answer was expected.
    #[error("expected {expected} token, got {got}")]
    WrongIntent {
        expected: crate::Intent,
        got: crate::Intent,
    },

    /// The token's session nonce doesn't belong to this exchange.
    /// The exchange stays in negotiation; a correct token can still
    /// be applied.
    #[error("token session does not match this exchange")]
    SessionMismatch,

    /// The token was already consumed. Tokens are single-use.
    #[error("signaling token already consumed")]
    StaleToken,

    /// `create_answer` was called before an offer was applied.
    #[error("no remote offer applied; call accept_offer first")]
    NoRemoteOffer,

    /// Binding the local listener failed.
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    /// A transport operation failed during the handshake.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The hello/ack handshake over the freshly dialed channel failed.
    #[error("signaling handshake failed: {0}")]
    Handshake(String),
}
