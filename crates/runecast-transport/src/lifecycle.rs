//! Connection lifecycle: negotiating → open → {closed, failed}.
//!
//! Two independent observations can report a channel as open — the
//! channel's own ready signal and the peer connection's connected
//! status — and either may arrive first, or both may arrive. The
//! [`Lifecycle`] guard guarantees the "connected" transition fires
//! exactly once regardless, and that a later negative signal lands the
//! session in a terminal, unrecoverable state. The contract after
//! `closed`/`failed` is "reload to retry": no reconnection is
//! attempted.

/// The state of a peer channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Descriptors are being exchanged; no channel exists yet. A
    /// session can sit here forever — a stale or consumed signaling
    /// token surfaces only as absence of progress.
    Negotiating,
    /// The channel is open and carrying game messages.
    Open,
    /// The channel closed after being open. Terminal.
    Closed,
    /// The underlying connection reported a failed/disconnected
    /// network state. Terminal.
    Failed,
}

impl ChannelState {
    /// Returns `true` for the unrecoverable end states.
    pub fn is_terminal(self) -> bool {
        matches!(self, ChannelState::Closed | ChannelState::Failed)
    }

    /// Returns `true` while the channel carries traffic.
    pub fn is_open(self) -> bool {
        matches!(self, ChannelState::Open)
    }
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelState::Negotiating => write!(f, "negotiating"),
            ChannelState::Open => write!(f, "open"),
            ChannelState::Closed => write!(f, "closed"),
            ChannelState::Failed => write!(f, "failed"),
        }
    }
}

/// Which observation reported the channel as open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenSignal {
    /// The data channel itself reported ready.
    ChannelReady,
    /// The peer connection reported a connected status.
    PeerStatus,
}

/// Tracks one session's channel state and guards the single
/// "connected" transition.
#[derive(Debug)]
pub struct Lifecycle {
    state: ChannelState,
    connected_once: bool,
}

impl Lifecycle {
    /// A fresh lifecycle in `Negotiating`.
    pub fn new() -> Self {
        Self {
            state: ChannelState::Negotiating,
            connected_once: false,
        }
    }

    /// Records an open observation. Returns `true` only for the first
    /// observation on a non-terminal session — that one call triggers
    /// game initialization; every duplicate returns `false`.
    pub fn observe_open(&mut self, signal: OpenSignal) -> bool {
        if self.state.is_terminal() {
            tracing::debug!(?signal, state = %self.state, "open signal after terminal state, ignoring");
            return false;
        }
        self.state = ChannelState::Open;
        if self.connected_once {
            tracing::debug!(?signal, "duplicate open signal, already connected");
            return false;
        }
        self.connected_once = true;
        tracing::info!(?signal, "channel open");
        true
    }

    /// Records a clean close. Terminal.
    pub fn observe_closed(&mut self) {
        if !self.state.is_terminal() {
            tracing::info!("channel closed");
            self.state = ChannelState::Closed;
        }
    }

    /// Records a disconnected/failed network state. Terminal.
    pub fn observe_failed(&mut self) {
        if !self.state.is_terminal() {
            tracing::warn!("connection failed");
            self.state = ChannelState::Failed;
        }
    }

    /// The current channel state.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Whether the connected transition has already fired.
    pub fn connected_once(&self) -> bool {
        self.connected_once
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
