//! WebSocket data channel implementation using `tokio-tungstenite`.
//!
//! Game messages are UTF-8 JSON, so frames go out as Text; inbound
//! Text and Binary are both accepted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// The accept-side channel (host end of the exchange).
pub type ServerWs = WsConnection<TcpStream>;

/// The dial-side channel (guest end of the exchange).
pub type ClientWs =
    WsConnection<tokio_tungstenite::MaybeTlsStream<TcpStream>>;

fn io_err(kind: std::io::ErrorKind, e: impl std::error::Error + Send + Sync + 'static) -> std::io::Error {
    std::io::Error::new(kind, e)
}

/// A single WebSocket channel between two peers.
pub struct WsConnection<S> {
    id: ConnectionId,
    ws: Arc<Mutex<tokio_tungstenite::WebSocketStream<S>>>,
}

impl<S> std::fmt::Debug for WsConnection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsConnection").field("id", &self.id).finish()
    }
}

impl<S> WsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wraps an already-upgraded WebSocket stream.
    pub fn new(ws: tokio_tungstenite::WebSocketStream<S>) -> Self {
        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        Self {
            id,
            ws: Arc::new(Mutex::new(ws)),
        }
    }
}

impl ServerWs {
    /// Upgrades an accepted TCP stream into a channel.
    pub async fn accept(stream: TcpStream) -> Result<Self, TransportError> {
        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| {
                TransportError::ConnectFailed(io_err(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;
        let conn = Self::new(ws);
        tracing::debug!(id = %conn.id, "accepted WebSocket channel");
        Ok(conn)
    }
}

impl ClientWs {
    /// Dials a remote peer at `ws://{addr}`.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let (ws, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .map_err(|e| {
                    TransportError::ConnectFailed(io_err(
                        std::io::ErrorKind::ConnectionRefused,
                        e,
                    ))
                })?;
        let conn = Self::new(ws);
        tracing::debug!(id = %conn.id, addr, "dialed WebSocket channel");
        Ok(conn)
    }
}

impl<S> Connection for WsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        // JSON payloads ride as Text frames; anything else falls back
        // to Binary.
        let msg = match std::str::from_utf8(data) {
            Ok(text) => Message::Text(text.to_owned().into()),
            Err(_) => Message::Binary(data.to_vec().into()),
        };
        self.ws.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(io_err(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        use futures_util::StreamExt;
        loop {
            let msg = self.ws.lock().await.next().await;
            match msg {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(io_err(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.ws.lock().await.close(None).await.map_err(|e| {
            TransportError::SendFailed(io_err(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
