//! Unified error type for the server crate.

use duotaire_protocol::ProtocolError;
use duotaire_room::RoomError;
use duotaire_transport::TransportError;

/// Top-level error wrapping the layer-specific ones, so `?` flows through
/// the accept loop and connection handlers.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
