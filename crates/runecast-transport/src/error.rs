/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The channel was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending a frame failed. The caller logs and drops the message;
    /// there is no retry or queueing layer.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Dialing or accepting the underlying stream failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),
}
