//! Single-player sessions against the scripted stand-in.
//!
//! Same command and event surface as a peer session, no transport:
//! the stand-in plays the opposite seat in-process by feeding its
//! roll and selection through the same inbound path a remote peer
//! would use.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use runecast_engine::{
    AI_THINK_DELAY, Applied, GameState, ROUND_START_DELAY, RandomRoller, ResolvedRound, Roller,
    TOTAL_DICE, choose_dice,
};
use runecast_protocol::GameMessage;
use runecast_timer::TimerSet;

use crate::session::{PeerCommand, PeerEvent, turn_status};

enum SoloTimer {
    RoundStart,
    StandInTurn,
}

/// Handle to a running solo session. The human side holds first-turn
/// initiative.
pub struct SoloSession {
    commands: mpsc::UnboundedSender<PeerCommand>,
    events: mpsc::UnboundedReceiver<PeerEvent>,
    task: JoinHandle<()>,
}

impl SoloSession {
    pub fn spawn() -> Self {
        Self::spawn_with_roller(RandomRoller)
    }

    /// Spawns with a caller-supplied roller, shared by both seats.
    pub fn spawn_with_roller<R>(roller: R) -> Self
    where
        R: Roller + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let driver = SoloDriver {
            state: GameState::new(),
            roller,
            timers: TimerSet::new(),
            events: event_tx,
            commands: cmd_rx,
        };
        let task = tokio::spawn(driver.run());
        Self {
            commands: cmd_tx,
            events: event_rx,
            task,
        }
    }

    pub fn command(&self, cmd: PeerCommand) {
        if self.commands.send(cmd).is_err() {
            tracing::debug!(?cmd, "session ended, command dropped");
        }
    }

    pub async fn next_event(&mut self) -> Option<PeerEvent> {
        self.events.recv().await
    }
}

impl Drop for SoloSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct SoloDriver<R> {
    state: GameState,
    roller: R,
    timers: TimerSet<SoloTimer>,
    events: mpsc::UnboundedSender<PeerEvent>,
    commands: mpsc::UnboundedReceiver<PeerCommand>,
}

enum Tick {
    Command(Option<PeerCommand>),
    Timer(SoloTimer),
}

impl<R> SoloDriver<R>
where
    R: Roller + Send + 'static,
{
    async fn run(mut self) {
        // No negotiation in solo play; the "channel" is open from the
        // first moment.
        self.state.start(true);
        self.emit(PeerEvent::Connected { is_host: true });
        if self.state.start_new_round().is_ok() {
            self.emit(PeerEvent::Status(turn_status(&self.state)));
            self.emit_state();
        }

        loop {
            let tick = tokio::select! {
                cmd = self.commands.recv() => Tick::Command(cmd),
                (_, timer) = self.timers.fired() => Tick::Timer(timer),
            };
            match tick {
                Tick::Command(Some(cmd)) => self.on_command(cmd).await,
                Tick::Command(None) => break,
                Tick::Timer(SoloTimer::RoundStart) => self.on_round_start(),
                Tick::Timer(SoloTimer::StandInTurn) => self.stand_in_turn().await,
            }
        }
        self.timers.cancel_all();
    }

    async fn on_command(&mut self, cmd: PeerCommand) {
        match cmd {
            PeerCommand::Roll => {
                let dice = self.roller.roll(TOTAL_DICE).await;
                match self.state.apply_roll(dice) {
                    Ok(_) => self.emit_state(),
                    Err(e) => tracing::debug!(error = %e, "roll ignored"),
                }
            }
            PeerCommand::ToggleDie(index) => match self.state.toggle_die(index) {
                Ok(_) => self.emit_state(),
                Err(e) => tracing::debug!(error = %e, "toggle ignored"),
            },
            PeerCommand::KeepDice => match self.state.keep_selected() {
                Ok(kept) => {
                    self.emit_state();
                    if kept.resolution_ready {
                        self.resolve();
                    } else {
                        self.emit(PeerEvent::Status("opponent is thinking...".into()));
                        self.timers.schedule(AI_THINK_DELAY, SoloTimer::StandInTurn);
                    }
                }
                Err(e) => tracing::debug!(error = %e, "keep ignored"),
            },
            PeerCommand::ResolveTurn => self.resolve(),
        }
    }

    /// The stand-in's whole turn: roll, pick by priority, lock in.
    /// Both moves flow through the same inbound path a remote peer's
    /// messages would.
    async fn stand_in_turn(&mut self) {
        let dice = self.roller.roll(TOTAL_DICE).await;
        let picks = choose_dice(&dice);
        let selection = picks.iter().map(|&i| dice[i]).collect();

        self.state.handle_message(GameMessage::DiceRoll { dice });
        self.emit_state();

        match self
            .state
            .handle_message(GameMessage::DiceSelection { selection })
        {
            Applied::OpponentSelection { resolution_ready } => {
                self.emit_state();
                if resolution_ready {
                    self.resolve();
                }
            }
            _ => tracing::debug!("stand-in selection not applied"),
        }
    }

    fn resolve(&mut self) {
        let Some(resolved) = self.state.resolve_turn() else {
            tracing::debug!("resolve outside resolution phase ignored");
            return;
        };
        let ResolvedRound {
            report, outcome, ..
        } = resolved;
        self.emit(PeerEvent::RoundResolved(report));
        self.emit_state();
        match outcome {
            Some(outcome) => self.emit(PeerEvent::GameOver(outcome)),
            None => {
                self.timers
                    .schedule(ROUND_START_DELAY, SoloTimer::RoundStart);
                self.emit(PeerEvent::Status(turn_status(&self.state)));
            }
        }
    }

    fn on_round_start(&mut self) {
        match self.state.start_new_round() {
            Ok(()) => {
                self.emit(PeerEvent::Status(turn_status(&self.state)));
                self.emit_state();
            }
            Err(e) => tracing::debug!(error = %e, "round start skipped"),
        }
    }

    fn emit_state(&self) {
        self.emit(PeerEvent::StateChanged(self.state.clone()));
    }

    fn emit(&self, event: PeerEvent) {
        let _ = self.events.send(event);
    }
}
