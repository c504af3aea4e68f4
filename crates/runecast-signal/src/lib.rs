//! Peer signaling for Runecast: negotiating a direct channel between
//! two peers using only locally generated connection descriptors.
//!
//! No third party relays the descriptors — they travel out-of-band as
//! opaque text tokens (a shareable link fragment or a pasted blob).
//! The flow mirrors a classic offer/answer exchange:
//!
//! ```text
//! host                                guest
//! ────                                ─────
//! create_offer() ──── offer token ──▶ accept_offer(token)
//!                                     create_answer()
//! accept_answer() ◀── answer token ── (connectivity task dials)
//!      │                                   │
//!      └──────── open channel ─────────────┘
//! ```
//!
//! Tokens are single-use and nonce-checked. There is deliberately no
//! timeout on a stalled exchange: a stale token surfaces only as a
//! session stuck in `negotiating` — the recovery contract is
//! "reload to retry".
//!
//! [`connect_local`] runs the same state transitions programmatically
//! over loopback, without the manual encode/decode step. It exists for
//! local testing.

mod error;
mod exchange;
mod token;

pub use error::SignalError;
pub use exchange::{GuestExchange, HostExchange, PendingChannel, SignalConfig, connect_local};
pub use token::{Candidate, Descriptor, Intent, SignalToken};
