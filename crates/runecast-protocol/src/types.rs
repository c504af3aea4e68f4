//! Core protocol types for Runecast's wire format.
//!
//! Every type here travels "on the wire" — serialized to UTF-8 JSON,
//! one object per channel message, and deserialized on the other side.
//! The shapes are fixed by the protocol: a die is always
//! `{ "name": ..., "type": ... }` and a message always carries a
//! lowercase `type` discriminator (`dice_roll`, `dice_selection`,
//! `game_over`).

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Die faces
// ---------------------------------------------------------------------------

/// One of the six face identities a die can land on.
///
/// Exactly six distinct identities exist; each maps to a fixed
/// [`SymbolKind`] via [`FaceName::kind`]. The mapping is never
/// recomputed after a die is constructed — the wire carries both the
/// name and the kind, and the receiver trusts the transmitted pair.
///
/// Serialized capitalized (`"Axe"`, `"Prayer"`), matching the wire
/// format the UI layer also renders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceName {
    Axe,
    Arrow,
    Helmet,
    Shield,
    Hand,
    Prayer,
}

impl FaceName {
    /// All six faces, in canonical order. The symbol generator draws
    /// uniformly from this set.
    pub const ALL: [FaceName; 6] = [
        FaceName::Axe,
        FaceName::Arrow,
        FaceName::Helmet,
        FaceName::Shield,
        FaceName::Hand,
        FaceName::Prayer,
    ];

    /// The combat effect this face carries. Fixed for all time.
    pub fn kind(self) -> SymbolKind {
        match self {
            FaceName::Axe | FaceName::Arrow => SymbolKind::Attack,
            FaceName::Helmet | FaceName::Shield => SymbolKind::Defense,
            FaceName::Hand => SymbolKind::Steal,
            FaceName::Prayer => SymbolKind::GodToken,
        }
    }
}

impl fmt::Display for FaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The combat effect of a die face.
///
/// `#[serde(rename_all = "snake_case")]` produces the wire spellings
/// `"attack"`, `"defense"`, `"steal"`, `"god_token"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Attack,
    Defense,
    Steal,
    GodToken,
}

/// A single rolled die: a face identity plus its combat effect.
///
/// Two dice with the same face are still distinct entries in a roll —
/// selection works by position, not by value — so this type is a plain
/// value with no identity of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieFace {
    /// Which of the six faces was rolled.
    pub name: FaceName,
    /// The face's combat effect. `type` on the wire.
    #[serde(rename = "type")]
    pub kind: SymbolKind,
}

impl DieFace {
    /// Builds a die from a face name, deriving the kind from the fixed
    /// mapping.
    pub fn new(name: FaceName) -> Self {
        Self {
            name,
            kind: name.kind(),
        }
    }
}

impl From<FaceName> for DieFace {
    fn from(name: FaceName) -> Self {
        Self::new(name)
    }
}

// ---------------------------------------------------------------------------
// Sides
// ---------------------------------------------------------------------------

/// One of the two seats at the table, always relative to the sender.
///
/// Each peer calls itself `player` and the remote peer `opponent`, so
/// a `game_over` message with `winner: "player"` means the *sender*
/// won. State is symmetric; only this naming flips across the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    /// The other seat.
    pub fn other(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => write!(f, "player"),
            Side::Opponent => write!(f, "opponent"),
        }
    }
}

// ---------------------------------------------------------------------------
// GameMessage — the three wire message kinds
// ---------------------------------------------------------------------------

/// A message exchanged between the two peers over the open channel.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON, e.g.:
///
/// ```json
/// { "type": "dice_roll", "dice": [ { "name": "Axe", "type": "attack" } ] }
/// ```
///
/// There is no acknowledgement or retry: the channel is ordered and
/// reliable, and a malformed or unknown inbound payload is logged and
/// dropped by the session driver, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameMessage {
    /// The sender rolled their full set of dice (six entries).
    DiceRoll {
        /// The full roll, in rolled order.
        dice: Vec<DieFace>,
    },

    /// The sender finalized their kept dice (at most three entries,
    /// a subset of their last roll).
    DiceSelection {
        /// The kept dice, in selection order.
        selection: Vec<DieFace>,
    },

    /// The sender observed the end of the match. `winner` is from the
    /// sender's perspective.
    GameOver { winner: Side },
}

// =========================================================================
// Tests
// =========================================================================
