//! The peer session actor.
//!
//! One Tokio task per session owns the connection, the game state,
//! the lifecycle tracker, and the timers, and selects over local
//! commands, inbound frames, and timer firings. That single loop
//! serializes every mutation of the state: the transport never
//! touches [`GameState`] directly, and the logical race between
//! "my selection locked" and "their selection arrived" reduces to
//! whichever event the loop picks up first.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use runecast_engine::{
    Applied, GameState, Outcome, ROUND_START_DELAY, RandomRoller, ResolvedRound, Roller,
    RoundReport, TOTAL_DICE,
};
use runecast_protocol::{Codec, GameMessage, JsonCodec, Side};
use runecast_transport::{Connection, Lifecycle, OpenSignal, WsConnection};
use runecast_timer::TimerSet;

/// A local player action, queued onto the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerCommand {
    /// Roll this side's six dice.
    Roll,
    /// Toggle one die (by position in the roll) in the selection.
    ToggleDie(usize),
    /// Lock the selection in, auto-filling to three dice.
    KeepDice,
    /// Resolve the round. Redundant when resolution already ran;
    /// ignored outside the resolution phase.
    ResolveTurn,
}

/// What the session reports to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    /// The channel opened and the game initialized. Fired exactly
    /// once per session.
    Connected { is_host: bool },
    /// The state changed; re-render from this snapshot.
    StateChanged(GameState),
    /// A human-readable status line.
    Status(String),
    /// A round resolved with this combat summary.
    RoundResolved(RoundReport),
    /// The match is decided. No further rounds will start.
    GameOver(Outcome),
    /// The channel closed or failed. Terminal; start over to retry.
    ConnectionLost,
}

pub(crate) enum SessionTimer {
    RoundStart,
}

/// Handle to a running peer session.
///
/// Dropping the handle tears the session down and cancels its timers.
pub struct PeerSession {
    commands: mpsc::UnboundedSender<PeerCommand>,
    events: mpsc::UnboundedReceiver<PeerEvent>,
    task: JoinHandle<()>,
}

impl PeerSession {
    /// Spawns a session over an established channel using the
    /// standard dice roller. The host holds first-turn initiative.
    pub fn spawn<S>(conn: WsConnection<S>, is_host: bool) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        Self::spawn_with_roller(conn, is_host, RandomRoller)
    }

    /// Spawns a session with a caller-supplied roller. Lets tests
    /// script the dice.
    pub fn spawn_with_roller<S, R>(
        conn: WsConnection<S>,
        is_host: bool,
        roller: R,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
        R: Roller + Send + Sync + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let driver = Driver {
            conn,
            codec: JsonCodec,
            state: GameState::new(),
            roller,
            timers: TimerSet::new(),
            lifecycle: Lifecycle::new(),
            is_host,
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

    /// Queues a player action. Commands after the session has ended
    /// are dropped.
    pub fn command(&self, cmd: PeerCommand) {
        if self.commands.send(cmd).is_err() {
            tracing::debug!(?cmd, "session ended, command dropped");
        }
    }

    /// The next event from the session, or `None` once it has ended
    /// and drained.
    pub async fn next_event(&mut self) -> Option<PeerEvent> {
        self.events.recv().await
    }
}

impl Drop for PeerSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A one-line description of where the game stands, for status bars.
pub fn turn_status(state: &GameState) -> String {
    match state.outcome {
        Some(Outcome::PlayerWins) => return "you win".into(),
        Some(Outcome::OpponentWins) => return "opponent wins".into(),
        Some(Outcome::Tie) => return "tie game".into(),
        None => {}
    }
    match state.current_player {
        Some(Side::Player) => format!("round {}: your turn", state.round),
        Some(Side::Opponent) => format!("round {}: opponent's turn", state.round),
        None => "waiting for a peer".into(),
    }
}

enum Tick {
    Command(Option<PeerCommand>),
    Frame(Result<Option<Vec<u8>>, runecast_transport::TransportError>),
    Timer(SessionTimer),
}

struct Driver<S, R> {
    conn: WsConnection<S>,
    codec: JsonCodec,
    state: GameState,
    roller: R,
    timers: TimerSet<SessionTimer>,
    lifecycle: Lifecycle,
    is_host: bool,
    events: mpsc::UnboundedSender<PeerEvent>,
    commands: mpsc::UnboundedReceiver<PeerCommand>,
}

impl<S, R> Driver<S, R>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    R: Roller + Send + Sync + 'static,
{
    async fn run(mut self) {
        // The signaling handshake already completed on this channel,
        // so the ready observation arrives immediately. Lifecycle
        // still gates it so initialization fires exactly once.
        if self.lifecycle.observe_open(OpenSignal::ChannelReady) {
            self.on_connected();
        }

        loop {
            let tick = tokio::select! {
                cmd = self.commands.recv() => Tick::Command(cmd),
                frame = self.conn.recv() => Tick::Frame(frame),
                (_, timer) = self.timers.fired() => Tick::Timer(timer),
            };
            match tick {
                Tick::Command(Some(cmd)) => self.on_command(cmd).await,
                // Handle dropped: the owner is gone.
                Tick::Command(None) => break,
                Tick::Frame(Ok(Some(frame))) => self.on_frame(&frame).await,
                Tick::Frame(Ok(None)) => {
                    tracing::info!(id = %self.conn.id(), "channel closed by peer");
                    self.lifecycle.observe_closed();
                    self.emit(PeerEvent::ConnectionLost);
                    break;
                }
                Tick::Frame(Err(e)) => {
                    tracing::warn!(id = %self.conn.id(), error = %e, "channel failed");
                    self.lifecycle.observe_failed();
                    self.emit(PeerEvent::ConnectionLost);
                    break;
                }
                Tick::Timer(SessionTimer::RoundStart) => self.on_round_start(),
            }
        }
        self.timers.cancel_all();
    }

    fn on_connected(&mut self) {
        self.state.start(self.is_host);
        self.emit(PeerEvent::Connected {
            is_host: self.is_host,
        });
        if self.state.start_new_round().is_ok() {
            self.emit(PeerEvent::Status(turn_status(&self.state)));
            self.emit_state();
        }
    }

    async fn on_command(&mut self, cmd: PeerCommand) {
        match cmd {
            PeerCommand::Roll => {
                let dice = self.roller.roll(TOTAL_DICE).await;
                match self.state.apply_roll(dice) {
                    Ok(msg) => {
                        self.send(msg).await;
                        self.emit_state();
                    }
                    Err(e) => tracing::debug!(error = %e, "roll ignored"),
                }
            }
            PeerCommand::ToggleDie(index) => match self.state.toggle_die(index) {
                Ok(_) => self.emit_state(),
                Err(e) => tracing::debug!(error = %e, "toggle ignored"),
            },
            PeerCommand::KeepDice => match self.state.keep_selected() {
                Ok(kept) => {
                    self.send(kept.message).await;
                    self.emit_state();
                    if kept.resolution_ready {
                        self.resolve().await;
                    } else {
                        self.emit(PeerEvent::Status("waiting on your opponent".into()));
                    }
                }
                Err(e) => tracing::debug!(error = %e, "keep ignored"),
            },
            PeerCommand::ResolveTurn => self.resolve().await,
        }
    }

    async fn on_frame(&mut self, frame: &[u8]) {
        let msg: GameMessage = match self.codec.decode(frame) {
            Ok(msg) => msg,
            Err(e) => {
                // Malformed or unknown messages are dropped, never fatal.
                tracing::warn!(id = %self.conn.id(), error = %e, "malformed message dropped");
                return;
            }
        };
        match self.state.handle_message(msg) {
            Applied::OpponentRoll => self.emit_state(),
            Applied::OpponentSelection { resolution_ready } => {
                self.emit_state();
                if resolution_ready {
                    self.resolve().await;
                }
            }
            Applied::RemoteGameOver(outcome) => {
                self.timers.cancel_all();
                self.emit_state();
                self.emit(PeerEvent::GameOver(outcome));
            }
            Applied::Ignored => {
                tracing::debug!(id = %self.conn.id(), "message after match end ignored");
            }
        }
    }

    async fn resolve(&mut self) {
        let Some(resolved) = self.state.resolve_turn() else {
            tracing::debug!("resolve outside resolution phase ignored");
            return;
        };
        let ResolvedRound {
            report,
            outcome,
            announce,
        } = resolved;
        self.emit(PeerEvent::RoundResolved(report));
        self.emit_state();
        if let Some(msg) = announce {
            self.send(msg).await;
        }
        match outcome {
            Some(outcome) => self.emit(PeerEvent::GameOver(outcome)),
            None => {
                self.timers
                    .schedule(ROUND_START_DELAY, SessionTimer::RoundStart);
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

    /// Encodes and transmits one message. Failures are logged and the
    /// message is lost; the sender never queues or retries.
    async fn send(&self, msg: GameMessage) {
        let bytes = match self.codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "encode failed, message dropped");
                return;
            }
        };
        if let Err(e) = self.conn.send(&bytes).await {
            tracing::warn!(id = %self.conn.id(), error = %e, "send failed, message dropped");
        }
    }

    fn emit_state(&self) {
        self.emit(PeerEvent::StateChanged(self.state.clone()));
    }

    fn emit(&self, event: PeerEvent) {
        // Receiver gone means the owner stopped listening; the loop
        // exits via the command channel shortly after.
        let _ = self.events.send(event);
    }
}
