//! Turn state machine and combat resolution for Runecast.
//!
//! The engine is transport-free: it consumes [`GameMessage`]s and
//! local actions, mutates one [`GameState`], and hands back the
//! messages to transmit. The session driver in the `runecast` crate
//! owns the channel and the timers; this crate owns the rules.
//!
//! [`GameMessage`]: runecast_protocol::GameMessage

mod ai;
mod error;
mod roller;
mod state;

pub use ai::choose_dice;
pub use error::EngineError;
pub use roller::{RandomRoller, Roller};
pub use state::{
    AI_THINK_DELAY, Applied, GameState, INITIAL_HEALTH, KeptSelection, MAX_KEPT_DICE, Outcome,
    Phase, ROUND_START_DELAY, ResolvedRound, RoundReport, TOTAL_DICE,
};
