//! Error types for the room layer.
//!
//! [`RoomError`] covers routing: finding, entering, and leaving rooms.
//! Illegal game actions are a different animal — see
//! [`MoveError`](crate::rules::MoveError) — and never escape the room as
//! anything but an `error` frame to the offending client.

use duotaire_protocol::RoomCode;

/// Errors that can occur while routing a connection to a room.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RoomError {
    /// No room with this code exists.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// Both seats are taken.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The room has already started (or finished) its game.
    #[error("room {0} is already playing")]
    GameInProgress(RoomCode),

    /// The room's actor is gone — disposed or crashed. Late messages to a
    /// disposed room land here and are treated as no-ops by callers.
    #[error("room {0} is no longer available")]
    Unavailable(RoomCode),
}
