//! The per-peer turn state machine.
//!
//! Each peer runs its own copy of [`GameState`]. The local side is
//! always "player"; the remote side is always "opponent". Local
//! actions mutate the player half and emit wire messages; inbound
//! messages mutate the opponent half through [`GameState::handle_message`].
//! Both copies resolve each round independently from the same selected
//! dice, so they stay consistent without a referee.

use std::time::Duration;

use runecast_protocol::{DieFace, GameMessage, Side, SymbolKind};

use crate::error::EngineError;

/// Health both sides start each match with.
pub const INITIAL_HEALTH: u32 = 15;

/// Dice rolled per round.
pub const TOTAL_DICE: usize = 6;

/// Dice each side keeps for resolution.
pub const MAX_KEPT_DICE: usize = 3;

/// Presentation pause between a resolved round and the next roll.
pub const ROUND_START_DELAY: Duration = Duration::from_secs(3);

/// Scripted thinking pause for the AI stand-in.
pub const AI_THINK_DELAY: Duration = Duration::from_millis(1500);

/// Stage of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Waiting,
    Rolling,
    Selecting,
    Resolution,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Waiting => "waiting",
            Phase::Rolling => "rolling",
            Phase::Selecting => "selecting",
            Phase::Resolution => "resolution",
        };
        f.write_str(s)
    }
}

/// How the match ended, from the local side's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    PlayerWins,
    OpponentWins,
    Tie,
}

/// A locked-in local selection, ready to transmit.
#[derive(Debug, Clone, PartialEq)]
pub struct KeptSelection {
    /// The `dice_selection` message to send to the peer.
    pub message: GameMessage,
    /// Whether both sides have now locked in and the round can resolve.
    pub resolution_ready: bool,
}

/// The effect an inbound message had on the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    OpponentRoll,
    OpponentSelection { resolution_ready: bool },
    RemoteGameOver(Outcome),
    /// The message arrived after the match was decided.
    Ignored,
}

/// Per-round combat summary surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundReport {
    pub round: u32,
    pub damage_dealt: u32,
    pub damage_taken: u32,
    pub tokens_stolen: u32,
    pub tokens_lost: u32,
    pub tokens_gained: u32,
}

/// Result of [`GameState::resolve_turn`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRound {
    pub report: RoundReport,
    pub outcome: Option<Outcome>,
    /// `game_over` announcement to transmit, for decisive outcomes.
    pub announce: Option<GameMessage>,
}

/// The single mutable game aggregate.
///
/// Selection is tracked by positional index into `player_dice` so two
/// dice with the same face stay distinct entries. The opponent's
/// selection arrives over the wire as faces and is stored as received.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub player_health: u32,
    pub opponent_health: u32,
    pub player_tokens: u32,
    pub opponent_tokens: u32,
    pub current_player: Option<Side>,
    pub phase: Phase,
    pub round: u32,
    pub player_dice: Vec<DieFace>,
    pub opponent_dice: Vec<DieFace>,
    pub outcome: Option<Outcome>,
    selected: Vec<usize>,
    locked: bool,
    opponent_selection: Vec<DieFace>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            player_health: INITIAL_HEALTH,
            opponent_health: INITIAL_HEALTH,
            player_tokens: 0,
            opponent_tokens: 0,
            current_player: None,
            phase: Phase::Waiting,
            round: 0,
            player_dice: Vec::new(),
            opponent_dice: Vec::new(),
            outcome: None,
            selected: Vec::new(),
            locked: false,
            opponent_selection: Vec::new(),
        }
    }

    /// Returns every field to its initial value for a fresh match.
    /// Initiative is cleared too, so call [`start`](Self::start)
    /// again before the first round.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Assigns first-turn initiative once the channel opens. The host
    /// moves first.
    pub fn start(&mut self, is_host: bool) {
        if self.current_player.is_some() {
            return;
        }
        self.current_player = Some(if is_host { Side::Player } else { Side::Opponent });
    }

    /// Begins the next round: bumps the round counter, clears both
    /// sides' dice, and enters the rolling phase.
    pub fn start_new_round(&mut self) -> Result<(), EngineError> {
        if self.outcome.is_some() {
            return Err(EngineError::MatchOver);
        }
        if !matches!(self.phase, Phase::Waiting | Phase::Resolution) {
            return Err(EngineError::WrongPhase {
                op: "start_new_round",
                phase: self.phase,
            });
        }
        self.round += 1;
        self.player_dice.clear();
        self.opponent_dice.clear();
        self.selected.clear();
        self.opponent_selection.clear();
        self.locked = false;
        self.phase = Phase::Rolling;
        tracing::debug!(round = self.round, "round started");
        Ok(())
    }

    /// Stores the local roll and advances to selection. Returns the
    /// `dice_roll` message to transmit.
    pub fn apply_roll(&mut self, dice: Vec<DieFace>) -> Result<GameMessage, EngineError> {
        if self.outcome.is_some() {
            return Err(EngineError::MatchOver);
        }
        if self.phase != Phase::Rolling {
            return Err(EngineError::WrongPhase {
                op: "apply_roll",
                phase: self.phase,
            });
        }
        if dice.len() != TOTAL_DICE {
            return Err(EngineError::BadRoll {
                expected: TOTAL_DICE,
                got: dice.len(),
            });
        }
        self.player_dice = dice.clone();
        self.phase = Phase::Selecting;
        Ok(GameMessage::DiceRoll { dice })
    }

    /// Toggles membership of one die (by position) in the local
    /// selection. Returns whether the die is selected afterwards.
    /// Selecting past the cap is ignored; toggling off always works.
    pub fn toggle_die(&mut self, index: usize) -> Result<bool, EngineError> {
        if self.outcome.is_some() {
            return Err(EngineError::MatchOver);
        }
        if self.phase != Phase::Selecting {
            return Err(EngineError::WrongPhase {
                op: "toggle_die",
                phase: self.phase,
            });
        }
        if self.locked {
            return Err(EngineError::SelectionLocked);
        }
        if index >= self.player_dice.len() {
            return Err(EngineError::NoSuchDie { index });
        }
        if let Some(pos) = self.selected.iter().position(|&i| i == index) {
            self.selected.remove(pos);
            return Ok(false);
        }
        if self.selected.len() >= MAX_KEPT_DICE {
            return Ok(false);
        }
        self.selected.push(index);
        Ok(true)
    }

    /// Locks in the local selection, auto-filling to exactly
    /// [`MAX_KEPT_DICE`] by walking the roll in order. Advances to
    /// resolution if the opponent has already locked in.
    pub fn keep_selected(&mut self) -> Result<KeptSelection, EngineError> {
        if self.outcome.is_some() {
            return Err(EngineError::MatchOver);
        }
        if self.phase != Phase::Selecting {
            return Err(EngineError::WrongPhase {
                op: "keep_selected",
                phase: self.phase,
            });
        }
        if self.locked {
            return Err(EngineError::SelectionLocked);
        }
        let mut index = 0;
        while self.selected.len() < MAX_KEPT_DICE && index < self.player_dice.len() {
            if !self.selected.contains(&index) {
                self.selected.push(index);
            }
            index += 1;
        }
        self.locked = true;

        let resolution_ready = self.is_resolution_ready();
        if resolution_ready {
            self.phase = Phase::Resolution;
        }
        Ok(KeptSelection {
            message: GameMessage::DiceSelection {
                selection: self.player_selection(),
            },
            resolution_ready,
        })
    }

    /// Applies one inbound wire message to the opponent half of the
    /// state. Never fails; messages after the match is decided are
    /// ignored.
    pub fn handle_message(&mut self, msg: GameMessage) -> Applied {
        if self.outcome.is_some() {
            return Applied::Ignored;
        }
        match msg {
            GameMessage::DiceRoll { dice } => {
                self.opponent_dice = dice;
                Applied::OpponentRoll
            }
            GameMessage::DiceSelection { mut selection } => {
                selection.truncate(MAX_KEPT_DICE);
                self.opponent_selection = selection;
                // Same readiness check as keep_selected: whichever
                // lock-in lands second flips the phase. Only a round
                // still in selection can flip, so a re-delivered
                // selection after resolution changes nothing.
                let resolution_ready =
                    self.phase == Phase::Selecting && self.is_resolution_ready();
                if resolution_ready {
                    self.phase = Phase::Resolution;
                }
                Applied::OpponentSelection { resolution_ready }
            }
            GameMessage::GameOver { winner } => {
                // The winner field is from the sender's perspective.
                let outcome = match winner {
                    Side::Player => Outcome::OpponentWins,
                    Side::Opponent => Outcome::PlayerWins,
                };
                self.outcome = Some(outcome);
                Applied::RemoteGameOver(outcome)
            }
        }
    }

    /// Both sides locked in exactly [`MAX_KEPT_DICE`] dice and the
    /// match is still live.
    pub fn is_resolution_ready(&self) -> bool {
        self.outcome.is_none()
            && self.locked
            && self.selected.len() == MAX_KEPT_DICE
            && self.opponent_selection.len() == MAX_KEPT_DICE
    }

    /// Resolves the round from both selected sets. Returns `None`
    /// (and leaves the state untouched) outside the resolution phase,
    /// so a duplicate invocation is harmless.
    pub fn resolve_turn(&mut self) -> Option<ResolvedRound> {
        if self.phase != Phase::Resolution || self.outcome.is_some() {
            return None;
        }

        let mine = self.player_selection();
        let player_attacks = count(&mine, SymbolKind::Attack);
        let player_defenses = count(&mine, SymbolKind::Defense);
        let player_steals = count(&mine, SymbolKind::Steal);
        let player_generated = count(&mine, SymbolKind::GodToken);

        let theirs = &self.opponent_selection;
        let opponent_attacks = count(theirs, SymbolKind::Attack);
        let opponent_defenses = count(theirs, SymbolKind::Defense);
        let opponent_steals = count(theirs, SymbolKind::Steal);
        let opponent_generated = count(theirs, SymbolKind::GodToken);

        let damage_dealt = player_attacks.saturating_sub(opponent_defenses);
        let damage_taken = opponent_attacks.saturating_sub(player_defenses);

        // Steal bounds come from the pre-round token counts; tokens
        // generated this round are not stealable this round.
        let tokens_stolen = self.opponent_tokens.min(player_steals);
        let tokens_lost = self.player_tokens.min(opponent_steals);

        self.player_health = self.player_health.saturating_sub(damage_taken);
        self.opponent_health = self.opponent_health.saturating_sub(damage_dealt);
        self.player_tokens =
            self.player_tokens - tokens_lost + player_generated + tokens_stolen;
        self.opponent_tokens =
            self.opponent_tokens - tokens_stolen + opponent_generated + tokens_lost;

        let outcome = match (self.player_health, self.opponent_health) {
            (0, 0) => Some(Outcome::Tie),
            (0, _) => Some(Outcome::OpponentWins),
            (_, 0) => Some(Outcome::PlayerWins),
            _ => None,
        };

        let report = RoundReport {
            round: self.round,
            damage_dealt,
            damage_taken,
            tokens_stolen,
            tokens_lost,
            tokens_gained: player_generated,
        };
        tracing::debug!(
            round = report.round,
            damage_dealt,
            damage_taken,
            player_health = self.player_health,
            opponent_health = self.opponent_health,
            "round resolved"
        );

        let announce = match outcome {
            Some(Outcome::PlayerWins) => Some(GameMessage::GameOver {
                winner: Side::Player,
            }),
            Some(Outcome::OpponentWins) => Some(GameMessage::GameOver {
                winner: Side::Opponent,
            }),
            // Both sides detect a tie from identical inputs.
            Some(Outcome::Tie) | None => None,
        };

        match outcome {
            Some(o) => self.outcome = Some(o),
            None => {
                self.current_player = self.current_player.map(Side::other);
            }
        }
        // Leave the resolution phase so a second invocation (a stray
        // command, a re-delivered selection) finds nothing to do.
        self.phase = Phase::Waiting;

        Some(ResolvedRound {
            report,
            outcome,
            announce,
        })
    }

    /// The locally selected faces, in toggle order.
    pub fn player_selection(&self) -> Vec<DieFace> {
        self.selected
            .iter()
            .map(|&i| self.player_dice[i])
            .collect()
    }

    /// Positional indices of the local selection, in toggle order.
    pub fn selected_indices(&self) -> &[usize] {
        &self.selected
    }

    /// The opponent's selected faces as received.
    pub fn opponent_selection(&self) -> &[DieFace] {
        &self.opponent_selection
    }

    /// Whether the local selection has been locked in this round.
    pub fn selection_locked(&self) -> bool {
        self.locked
    }
}

fn count(dice: &[DieFace], kind: SymbolKind) -> u32 {
    dice.iter().filter(|d| d.kind == kind).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use runecast_protocol::FaceName;

    fn face(name: FaceName) -> DieFace {
        DieFace::new(name)
    }

    fn roll_of(names: [FaceName; TOTAL_DICE]) -> Vec<DieFace> {
        names.into_iter().map(face).collect()
    }

    /// A state mid-selection with a fixed local roll.
    fn selecting_state(names: [FaceName; TOTAL_DICE]) -> GameState {
        let mut state = GameState::new();
        state.start(true);
        state.start_new_round().unwrap();
        state.apply_roll(roll_of(names)).unwrap();
        state
    }

    fn lock_in(state: &mut GameState, indices: &[usize]) -> KeptSelection {
        for &i in indices {
            assert!(state.toggle_die(i).unwrap());
        }
        state.keep_selected().unwrap()
    }

    fn receive_selection(state: &mut GameState, names: &[FaceName]) -> Applied {
        state.handle_message(GameMessage::DiceSelection {
            selection: names.iter().map(|&n| face(n)).collect(),
        })
    }

    #[test]
    fn host_moves_first() {
        let mut host = GameState::new();
        host.start(true);
        assert_eq!(host.current_player, Some(Side::Player));

        let mut guest = GameState::new();
        guest.start(false);
        assert_eq!(guest.current_player, Some(Side::Opponent));
    }

    #[test]
    fn start_is_idempotent() {
        let mut state = GameState::new();
        state.start(true);
        state.start(false);
        assert_eq!(state.current_player, Some(Side::Player));
    }

    #[test]
    fn round_counter_increments_once_per_round() {
        let mut state = GameState::new();
        state.start(true);
        state.start_new_round().unwrap();
        assert_eq!(state.round, 1);
        assert_eq!(state.phase, Phase::Rolling);

        let err = state.start_new_round().unwrap_err();
        assert!(matches!(err, EngineError::WrongPhase { .. }));
        assert_eq!(state.round, 1);
    }

    #[test]
    fn roll_must_have_six_dice() {
        let mut state = GameState::new();
        state.start(true);
        state.start_new_round().unwrap();
        let err = state
            .apply_roll(vec![face(FaceName::Axe); 4])
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::BadRoll {
                expected: TOTAL_DICE,
                got: 4
            }
        );
        assert_eq!(state.phase, Phase::Rolling);
    }

    #[test]
    fn roll_advances_to_selecting_and_emits_message() {
        let mut state = GameState::new();
        state.start(true);
        state.start_new_round().unwrap();
        let msg = state
            .apply_roll(roll_of([
                FaceName::Axe,
                FaceName::Arrow,
                FaceName::Helmet,
                FaceName::Shield,
                FaceName::Hand,
                FaceName::Prayer,
            ]))
            .unwrap();
        assert_eq!(state.phase, Phase::Selecting);
        match msg {
            GameMessage::DiceRoll { dice } => assert_eq!(dice.len(), TOTAL_DICE),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn selection_cap_holds_through_every_toggle() {
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        for i in 0..TOTAL_DICE {
            state.toggle_die(i).unwrap();
            assert!(state.selected_indices().len() <= MAX_KEPT_DICE);
        }
        assert_eq!(state.selected_indices(), &[0, 1, 2]);
    }

    #[test]
    fn toggle_respects_positional_identity_with_duplicate_faces() {
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        state.toggle_die(1).unwrap();
        state.toggle_die(4).unwrap();
        assert_eq!(state.selected_indices(), &[1, 4]);

        // Toggling index 1 off must leave index 4 selected even
        // though both dice carry the same face.
        assert!(!state.toggle_die(1).unwrap());
        assert_eq!(state.selected_indices(), &[4]);
    }

    #[test]
    fn toggle_out_of_range_is_an_error() {
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        let err = state.toggle_die(TOTAL_DICE).unwrap_err();
        assert_eq!(err, EngineError::NoSuchDie { index: TOTAL_DICE });
    }

    #[test]
    fn keep_auto_fills_to_exactly_three() {
        let mut state = selecting_state([
            FaceName::Prayer,
            FaceName::Axe,
            FaceName::Helmet,
            FaceName::Hand,
            FaceName::Arrow,
            FaceName::Shield,
        ]);
        state.toggle_die(3).unwrap();
        let kept = state.keep_selected().unwrap();

        // Explicit pick first, then the roll walked in order.
        assert_eq!(state.selected_indices(), &[3, 0, 1]);
        match kept.message {
            GameMessage::DiceSelection { selection } => {
                assert_eq!(selection.len(), MAX_KEPT_DICE);
                assert_eq!(selection[0].name, FaceName::Hand);
                assert_eq!(selection[1].name, FaceName::Prayer);
                assert_eq!(selection[2].name, FaceName::Axe);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn keep_with_no_picks_takes_the_first_three() {
        let mut state = selecting_state([
            FaceName::Shield,
            FaceName::Hand,
            FaceName::Prayer,
            FaceName::Axe,
            FaceName::Axe,
            FaceName::Axe,
        ]);
        let kept = state.keep_selected().unwrap();
        assert_eq!(state.selected_indices(), &[0, 1, 2]);
        assert!(!kept.resolution_ready);
    }

    #[test]
    fn keep_twice_is_rejected() {
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        state.keep_selected().unwrap();
        assert_eq!(state.keep_selected().unwrap_err(), EngineError::SelectionLocked);
    }

    #[test]
    fn readiness_requires_both_sides() {
        // Remote selection lands first (scenario: fast opponent).
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        let applied = receive_selection(
            &mut state,
            &[FaceName::Helmet, FaceName::Helmet, FaceName::Helmet],
        );
        assert_eq!(
            applied,
            Applied::OpponentSelection {
                resolution_ready: false
            }
        );
        assert_eq!(state.phase, Phase::Selecting);

        // Local lock-in is the second one; it flips the phase.
        let kept = state.keep_selected().unwrap();
        assert!(kept.resolution_ready);
        assert_eq!(state.phase, Phase::Resolution);
    }

    #[test]
    fn readiness_fires_on_the_inbound_path_too() {
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        let kept = state.keep_selected().unwrap();
        assert!(!kept.resolution_ready);
        assert_eq!(state.phase, Phase::Selecting);

        let applied = receive_selection(
            &mut state,
            &[FaceName::Hand, FaceName::Hand, FaceName::Prayer],
        );
        assert_eq!(
            applied,
            Applied::OpponentSelection {
                resolution_ready: true
            }
        );
        assert_eq!(state.phase, Phase::Resolution);
    }

    #[test]
    fn oversized_inbound_selection_is_clamped() {
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        receive_selection(&mut state, &[FaceName::Axe; 5]);
        assert_eq!(state.opponent_selection().len(), MAX_KEPT_DICE);
    }

    #[test]
    fn resolve_outside_resolution_changes_nothing() {
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        let before = state.clone();
        assert!(state.resolve_turn().is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn damage_never_goes_negative() {
        // One attack against three defenses.
        let mut state = selecting_state([
            FaceName::Axe,
            FaceName::Prayer,
            FaceName::Prayer,
            FaceName::Prayer,
            FaceName::Prayer,
            FaceName::Prayer,
        ]);
        lock_in(&mut state, &[0, 1, 2]);
        receive_selection(
            &mut state,
            &[FaceName::Helmet, FaceName::Shield, FaceName::Helmet],
        );
        let resolved = state.resolve_turn().unwrap();
        assert_eq!(resolved.report.damage_dealt, 0);
        assert_eq!(state.opponent_health, INITIAL_HEALTH);
    }

    #[test]
    fn scenario_two_axes_and_prayer_versus_helmet_and_two_hands() {
        let mut state = selecting_state([
            FaceName::Axe,
            FaceName::Axe,
            FaceName::Prayer,
            FaceName::Shield,
            FaceName::Shield,
            FaceName::Shield,
        ]);
        state.player_tokens = 1;
        lock_in(&mut state, &[0, 1, 2]);
        receive_selection(
            &mut state,
            &[FaceName::Helmet, FaceName::Hand, FaceName::Hand],
        );

        let resolved = state.resolve_turn().unwrap();
        let report = resolved.report;

        // 2 attacks against 1 defense.
        assert_eq!(report.damage_dealt, 1);
        assert_eq!(report.damage_taken, 0);
        assert_eq!(state.opponent_health, INITIAL_HEALTH - 1);
        assert_eq!(state.player_health, INITIAL_HEALTH);

        // 2 steals against 1 pre-round token: bounded by what was held.
        assert_eq!(report.tokens_lost, 1);
        assert_eq!(report.tokens_gained, 1);
        // 1 held - 1 stolen + 1 generated.
        assert_eq!(state.player_tokens, 1);
        assert_eq!(state.opponent_tokens, 1);
    }

    #[test]
    fn token_totals_grow_only_by_generation() {
        let mut state = selecting_state([
            FaceName::Hand,
            FaceName::Hand,
            FaceName::Prayer,
            FaceName::Axe,
            FaceName::Axe,
            FaceName::Axe,
        ]);
        state.player_tokens = 2;
        state.opponent_tokens = 3;
        let before = state.player_tokens + state.opponent_tokens;

        lock_in(&mut state, &[0, 1, 2]);
        receive_selection(
            &mut state,
            &[FaceName::Hand, FaceName::Prayer, FaceName::Prayer],
        );
        state.resolve_turn().unwrap();

        // One Prayer on each... player has 1, opponent has 2: 3 generated.
        let generated = 1 + 2;
        assert_eq!(state.player_tokens + state.opponent_tokens, before + generated);
    }

    #[test]
    fn turn_toggles_exactly_once_per_resolved_round() {
        let mut state = selecting_state([FaceName::Prayer; TOTAL_DICE]);
        assert_eq!(state.current_player, Some(Side::Player));
        lock_in(&mut state, &[0, 1, 2]);
        receive_selection(
            &mut state,
            &[FaceName::Prayer, FaceName::Prayer, FaceName::Prayer],
        );
        state.resolve_turn().unwrap();
        assert_eq!(state.current_player, Some(Side::Opponent));

        // A stray duplicate resolve changes nothing further.
        assert!(state.resolve_turn().is_none());
        assert_eq!(state.current_player, Some(Side::Opponent));
    }

    #[test]
    fn resolution_exits_the_resolution_phase() {
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        lock_in(&mut state, &[0, 1, 2]);
        receive_selection(
            &mut state,
            &[FaceName::Prayer, FaceName::Prayer, FaceName::Prayer],
        );
        state.resolve_turn().unwrap();
        assert_eq!(state.phase, Phase::Waiting);
        assert_eq!(state.opponent_health, INITIAL_HEALTH - 3);

        // A second invocation during the presentation gap finds no
        // resolution to run: no damage re-applied, turn untouched.
        assert!(state.resolve_turn().is_none());
        assert_eq!(state.opponent_health, INITIAL_HEALTH - 3);
        assert_eq!(state.current_player, Some(Side::Opponent));
    }

    #[test]
    fn redelivered_selection_after_resolve_stays_resolved() {
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        lock_in(&mut state, &[0, 1, 2]);
        receive_selection(
            &mut state,
            &[FaceName::Prayer, FaceName::Prayer, FaceName::Prayer],
        );
        state.resolve_turn().unwrap();

        // The same dice_selection lands again before the next round.
        let applied = receive_selection(
            &mut state,
            &[FaceName::Prayer, FaceName::Prayer, FaceName::Prayer],
        );
        assert_eq!(
            applied,
            Applied::OpponentSelection {
                resolution_ready: false
            }
        );
        assert!(state.resolve_turn().is_none());
        assert_eq!(state.opponent_health, INITIAL_HEALTH - 3);
    }

    #[test]
    fn reset_restores_the_initial_state() {
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        state.player_tokens = 2;
        lock_in(&mut state, &[0, 1, 2]);
        receive_selection(
            &mut state,
            &[FaceName::Hand, FaceName::Prayer, FaceName::Prayer],
        );
        state.resolve_turn().unwrap();

        state.reset();
        assert_eq!(state, GameState::new());

        // A fresh match starts from round one.
        state.start(true);
        state.start_new_round().unwrap();
        assert_eq!(state.round, 1);
        assert_eq!(state.current_player, Some(Side::Player));
    }

    #[test]
    fn simultaneous_knockout_is_a_tie() {
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        state.player_health = 2;
        state.opponent_health = 3;
        lock_in(&mut state, &[0, 1, 2]);
        receive_selection(&mut state, &[FaceName::Axe, FaceName::Axe, FaceName::Arrow]);

        let resolved = state.resolve_turn().unwrap();
        assert_eq!(resolved.outcome, Some(Outcome::Tie));
        assert!(resolved.announce.is_none());
        assert_eq!(state.player_health, 0);
        assert_eq!(state.opponent_health, 0);

        // No further rounds start.
        assert_eq!(state.start_new_round().unwrap_err(), EngineError::MatchOver);
    }

    #[test]
    fn decisive_win_announces_game_over() {
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        state.opponent_health = 2;
        lock_in(&mut state, &[0, 1, 2]);
        receive_selection(
            &mut state,
            &[FaceName::Helmet, FaceName::Prayer, FaceName::Prayer],
        );

        let resolved = state.resolve_turn().unwrap();
        assert_eq!(resolved.outcome, Some(Outcome::PlayerWins));
        assert_eq!(
            resolved.announce,
            Some(GameMessage::GameOver {
                winner: Side::Player
            })
        );
        // The turn does not toggle on a decided match.
        assert_eq!(state.current_player, Some(Side::Player));
    }

    #[test]
    fn remote_game_over_maps_to_the_local_perspective() {
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        let applied = state.handle_message(GameMessage::GameOver {
            winner: Side::Player,
        });
        assert_eq!(applied, Applied::RemoteGameOver(Outcome::OpponentWins));
        assert_eq!(state.outcome, Some(Outcome::OpponentWins));
    }

    #[test]
    fn messages_after_the_match_are_ignored() {
        let mut state = selecting_state([FaceName::Axe; TOTAL_DICE]);
        state.outcome = Some(Outcome::PlayerWins);
        let before = state.clone();
        let applied = receive_selection(&mut state, &[FaceName::Axe; 3]);
        assert_eq!(applied, Applied::Ignored);
        assert_eq!(state, before);
    }
}
