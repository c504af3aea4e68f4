//! The offer/answer exchange state machines.
//!
//! The host binds a listener, gathers candidates over a fixed window,
//! and emits the offer token. The guest applies the offer, emits its
//! answer token, and starts dialing the host's candidates in order.
//! The channel opens once the host has applied the answer and the
//! hello/ack handshake completes over the first reachable candidate.
//!
//! The candidate-collection window is a fixed duration, not an event
//! on "gathering complete": finalizing too early risks a token with
//! too few candidates, so the exchange always waits the full window.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use runecast_transport::{ClientWs, Connection, ServerWs};

use crate::{Candidate, Descriptor, Intent, SignalError, SignalToken};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Settings for one signaling exchange.
#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// Local address the host's listener binds to (port is ephemeral).
    pub bind_ip: IpAddr,

    /// Addresses advertised as candidates, in preference order. Each
    /// is paired with the listener's bound port.
    pub advertise: Vec<IpAddr>,

    /// How long to gather candidates before finalizing a token.
    pub gather_window: Duration,

    /// Pause between dial sweeps over the candidate list when no
    /// candidate is reachable yet.
    pub redial_delay: Duration,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            advertise: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
            gather_window: Duration::from_secs(2),
            redial_delay: Duration::from_millis(500),
        }
    }
}

impl SignalConfig {
    /// A loopback config with no collection window, for in-process
    /// exchanges and tests.
    pub fn local() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            advertise: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
            gather_window: Duration::ZERO,
            redial_delay: Duration::from_millis(20),
        }
    }
}

// ---------------------------------------------------------------------------
// Hello handshake — the first frames on a freshly dialed channel
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct Hello {
    session: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct HelloAck {
    session: u64,
}

// ---------------------------------------------------------------------------
// Host side
// ---------------------------------------------------------------------------

/// The offering peer's half of the exchange.
///
/// Created by [`HostExchange::create_offer`]; consumed (logically) by
/// [`HostExchange::accept_answer`], which yields the open channel.
pub struct HostExchange {
    session: u64,
    consumed: bool,
    incoming: mpsc::UnboundedReceiver<(u64, ServerWs)>,
    accept_task: JoinHandle<()>,
}

impl HostExchange {
    /// Generates a local descriptor, binds the listener, gathers
    /// candidates for the fixed collection window, and returns the
    /// exchange plus the offer token to hand to the peer.
    pub async fn create_offer(
        config: SignalConfig,
    ) -> Result<(Self, SignalToken), SignalError> {
        let listener = TcpListener::bind((config.bind_ip, 0))
            .await
            .map_err(SignalError::Bind)?;
        let local = listener.local_addr().map_err(SignalError::Bind)?;
        let session: u64 = rand::rng().random();

        let (tx, rx) = mpsc::unbounded_channel();
        let accept_task = tokio::spawn(accept_loop(listener, tx));

        tracing::info!(session, addr = %local, "offer created, gathering candidates");
        tokio::time::sleep(config.gather_window).await;
        let candidates = gather_candidates(&config, local);

        let token = SignalToken {
            descriptor: Descriptor {
                intent: Intent::Offer,
                session,
            },
            candidates,
        };

        Ok((
            Self {
                session,
                consumed: false,
                incoming: rx,
                accept_task,
            },
            token,
        ))
    }

    /// Applies the peer's answer token and awaits the guest's
    /// connectivity dial.
    ///
    /// Validation failures (wrong intent, consumed token, foreign
    /// session nonce) return an error and leave the exchange in
    /// negotiation. A valid answer whose peer never dials pends
    /// forever — there is no timeout on connectivity.
    pub async fn accept_answer(
        &mut self,
        token: &SignalToken,
    ) -> Result<ServerWs, SignalError> {
        let d = token.descriptor;
        if d.intent != Intent::Answer {
            return Err(SignalError::WrongIntent {
                expected: Intent::Answer,
                got: d.intent,
            });
        }
        if self.consumed {
            return Err(SignalError::StaleToken);
        }
        if d.session != self.session {
            return Err(SignalError::SessionMismatch);
        }
        self.consumed = true;

        loop {
            let (hello_session, conn) = match self.incoming.recv().await {
                Some(pair) => pair,
                None => {
                    return Err(SignalError::Handshake(
                        "listener task ended".into(),
                    ));
                }
            };
            if hello_session != self.session {
                tracing::warn!(
                    got = hello_session,
                    expected = self.session,
                    "hello for a foreign session, dropping channel"
                );
                continue;
            }
            let ack = serde_json::to_vec(&HelloAck {
                session: self.session,
            })
            .map_err(|e| SignalError::Handshake(e.to_string()))?;
            conn.send(&ack).await?;
            tracing::info!(id = %conn.id(), "peer channel established (host)");
            return Ok(conn);
        }
    }

    /// The session nonce this exchange minted.
    pub fn session(&self) -> u64 {
        self.session
    }
}

impl Drop for HostExchange {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// Accepts raw streams, upgrades them, and reads the hello frame
/// before handing the channel to the exchange. One task per stream so
/// a silent dialer can't block later ones.
async fn accept_loop(
    listener: TcpListener,
    tx: mpsc::UnboundedSender<(u64, ServerWs)>,
) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                continue;
            }
        };
        let tx = tx.clone();
        tokio::spawn(async move {
            let conn = match ServerWs::accept(stream).await {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "upgrade failed");
                    return;
                }
            };
            let frame = match conn.recv().await {
                Ok(Some(frame)) => frame,
                _ => {
                    tracing::debug!(%addr, "channel dropped before hello");
                    return;
                }
            };
            let hello: Hello = match serde_json::from_slice(&frame) {
                Ok(h) => h,
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "malformed hello");
                    return;
                }
            };
            // Receiver gone means the exchange was torn down.
            let _ = tx.send((hello.session, conn));
        });
    }
}

fn gather_candidates(config: &SignalConfig, local: SocketAddr) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = config
        .advertise
        .iter()
        .map(|ip| Candidate {
            addr: SocketAddr::new(*ip, local.port()),
        })
        .collect();
    if !local.ip().is_unspecified() && !out.iter().any(|c| c.addr == local) {
        out.push(Candidate { addr: local });
    }
    out
}

// ---------------------------------------------------------------------------
// Guest side
// ---------------------------------------------------------------------------

/// The answering peer's half of the exchange.
pub struct GuestExchange {
    config: SignalConfig,
    remote: Option<SignalToken>,
    answered: bool,
}

impl GuestExchange {
    /// A fresh guest exchange with no remote offer applied.
    pub fn new(config: SignalConfig) -> Self {
        Self {
            config,
            remote: None,
            answered: false,
        }
    }

    /// Applies the host's offer as the remote side. Must be called
    /// before [`create_answer`](Self::create_answer).
    pub fn accept_offer(&mut self, token: SignalToken) -> Result<(), SignalError> {
        if token.descriptor.intent != Intent::Offer {
            return Err(SignalError::WrongIntent {
                expected: Intent::Offer,
                got: token.descriptor.intent,
            });
        }
        if token.candidates.is_empty() {
            return Err(SignalError::BadToken(
                "offer carries no candidates".into(),
            ));
        }
        if self.remote.is_some() {
            return Err(SignalError::StaleToken);
        }
        tracing::info!(
            session = token.descriptor.session,
            candidates = token.candidates.len(),
            "offer applied"
        );
        self.remote = Some(token);
        Ok(())
    }

    /// Produces the answer token after the same fixed collection
    /// window and starts the connectivity task: dial the remote
    /// candidates in order, first reachable one wins.
    ///
    /// The returned [`PendingChannel`] resolves once the host has
    /// applied the answer and acked the hello — which may be never,
    /// if the answer token is lost in transit.
    pub async fn create_answer(
        &mut self,
    ) -> Result<(SignalToken, PendingChannel), SignalError> {
        let remote = self.remote.clone().ok_or(SignalError::NoRemoteOffer)?;
        if self.answered {
            return Err(SignalError::StaleToken);
        }
        self.answered = true;

        tokio::time::sleep(self.config.gather_window).await;

        let token = SignalToken {
            descriptor: Descriptor {
                intent: Intent::Answer,
                session: remote.descriptor.session,
            },
            candidates: Vec::new(),
        };

        let (tx, rx) = oneshot::channel();
        let dial_task =
            tokio::spawn(dial_loop(remote, self.config.redial_delay, tx));

        Ok((
            token,
            PendingChannel {
                rx: Some(rx),
                dial_task,
            },
        ))
    }
}

/// A channel that is still connecting. Resolves via
/// [`established`](Self::established).
pub struct PendingChannel {
    rx: Option<oneshot::Receiver<ClientWs>>,
    dial_task: JoinHandle<()>,
}

impl std::fmt::Debug for PendingChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingChannel").finish_non_exhaustive()
    }
}

impl PendingChannel {
    /// Waits for the connectivity task to open the channel. Pends
    /// forever if the host never accepts the answer.
    pub async fn established(mut self) -> Result<ClientWs, SignalError> {
        let rx = self.rx.take().expect("established called once");
        rx.await
            .map_err(|_| SignalError::Handshake("connectivity task ended".into()))
    }
}

impl Drop for PendingChannel {
    fn drop(&mut self) {
        self.dial_task.abort();
    }
}

/// Dials candidates in order, sweeping the list until one accepts and
/// acks the hello. Runs until success or abort.
async fn dial_loop(
    remote: SignalToken,
    redial_delay: Duration,
    tx: oneshot::Sender<ClientWs>,
) {
    let session = remote.descriptor.session;
    let Ok(hello) = serde_json::to_vec(&Hello { session }) else {
        return;
    };
    loop {
        for cand in &remote.candidates {
            let conn = match ClientWs::connect(&cand.addr.to_string()).await {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!(addr = %cand.addr, error = %e, "candidate unreachable");
                    continue;
                }
            };
            if conn.send(&hello).await.is_err() {
                continue;
            }
            match conn.recv().await {
                Ok(Some(frame)) => {
                    match serde_json::from_slice::<HelloAck>(&frame) {
                        Ok(ack) if ack.session == session => {
                            tracing::info!(id = %conn.id(), addr = %cand.addr, "peer channel established (guest)");
                            let _ = tx.send(conn);
                            return;
                        }
                        _ => {
                            tracing::debug!(addr = %cand.addr, "unexpected ack, trying next candidate");
                            continue;
                        }
                    }
                }
                _ => continue,
            }
        }
        tokio::time::sleep(redial_delay).await;
    }
}

// ---------------------------------------------------------------------------
// Automated variant
// ---------------------------------------------------------------------------

/// Runs the full offer → answer → accept sequence programmatically
/// over loopback — the same state transitions as the manual exchange,
/// without the encode/decode step. Returns both ends of the open
/// channel.
pub async fn connect_local() -> Result<(ServerWs, ClientWs), SignalError> {
    let config = SignalConfig::local();
    let (mut host, offer) = HostExchange::create_offer(config.clone()).await?;
    let mut guest = GuestExchange::new(config);
    guest.accept_offer(offer)?;
    let (answer, pending) = guest.create_answer().await?;
    let (host_conn, guest_conn) =
        tokio::try_join!(host.accept_answer(&answer), pending.established())?;
    Ok((host_conn, guest_conn))
}
