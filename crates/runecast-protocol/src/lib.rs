//! Wire protocol for Runecast.
//!
//! This crate defines the "language" the two peers speak once their
//! channel is open:
//!
//! - **Types** ([`GameMessage`], [`DieFace`], [`Side`], etc.) — the
//!   message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw channel frames)
//! and the game engine (turn state). It doesn't know about signaling,
//! connections, or turns — it only knows how to serialize and
//! deserialize the three game message kinds.
//!
//! ```text
//! Transport (bytes) → Protocol (GameMessage) → Engine (turn state)
//! ```
//!
//! There is deliberately no envelope, sequence number, or ack layer:
//! delivery relies entirely on the channel's ordered, reliable
//! guarantee.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{DieFace, FaceName, GameMessage, Side, SymbolKind};
