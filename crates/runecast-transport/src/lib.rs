//! Transport abstraction layer for Runecast.
//!
//! Provides the [`Connection`] trait — an ordered, reliable,
//! message-framed channel between exactly two peers — plus the
//! WebSocket implementation and the [`Lifecycle`] state machine that
//! tracks a channel from negotiation to open to its terminal end.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket channel via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
mod lifecycle;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use lifecycle::{ChannelState, Lifecycle, OpenSignal};
#[cfg(feature = "websocket")]
pub use websocket::{ClientWs, ServerWs, WsConnection};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A single open channel that can send and receive message frames.
///
/// The channel is ordered and reliable once open; the game protocol
/// layers no acknowledgement or retry on top of it. A send on a
/// closed channel fails — callers log and drop, they do not queue.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one message frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next message frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the channel is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the channel.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
