use thiserror::Error;

/// Any error the library surfaces, aggregated across layers.
#[derive(Debug, Error)]
pub enum RunecastError {
    #[error(transparent)]
    Protocol(#[from] runecast_protocol::ProtocolError),

    #[error(transparent)]
    Transport(#[from] runecast_transport::TransportError),

    #[error(transparent)]
    Signal(#[from] runecast_signal::SignalError),

    #[error(transparent)]
    Engine(#[from] runecast_engine::EngineError),
}
