//! # Runecast
//!
//! Peer-to-peer dice combat over a direct channel.
//!
//! Two peers negotiate a connection by exchanging signaling tokens
//! out-of-band, then play a symmetric turn-based dice game with no
//! server relaying game state: each peer runs its own copy of the
//! rules and the two copies stay consistent by exchanging three
//! message kinds over the open channel.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use runecast::prelude::*;
//!
//! # async fn play() -> Result<(), RunecastError> {
//! // Two peers in one process, over loopback:
//! let (host_conn, guest_conn) = connect_local().await?;
//! let host = PeerSession::spawn(host_conn, true);
//! let _guest = PeerSession::spawn(guest_conn, false);
//!
//! host.command(PeerCommand::Roll);
//! # Ok(())
//! # }
//! ```
//!
//! For a real two-machine game, drive [`HostExchange`] and
//! [`GuestExchange`] with pasted tokens instead of `connect_local`.
//!
//! [`HostExchange`]: runecast_signal::HostExchange
//! [`GuestExchange`]: runecast_signal::GuestExchange

mod error;
mod session;
mod solo;

pub use error::RunecastError;
pub use session::{PeerCommand, PeerEvent, PeerSession, turn_status};
pub use solo::SoloSession;

pub use runecast_engine as engine;
pub use runecast_protocol as protocol;
pub use runecast_signal as signal;
pub use runecast_transport as transport;

/// The commonly used surface in one import.
pub mod prelude {
    pub use crate::{
        PeerCommand, PeerEvent, PeerSession, RunecastError, SoloSession, turn_status,
    };
    pub use runecast_engine::{GameState, Outcome, Phase, RoundReport};
    pub use runecast_protocol::{DieFace, FaceName, GameMessage, Side, SymbolKind};
    pub use runecast_signal::{
        GuestExchange, HostExchange, SignalConfig, SignalToken, connect_local,
    };
}

pub use runecast_signal::connect_local;
