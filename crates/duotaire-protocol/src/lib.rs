//! Wire protocol for the Duo-taire server.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Identity** ([`SessionId`], [`Seat`], [`RoomCode`]) — who is talking
//!   and which seat they hold.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]) — every frame on
//!   the wire is one of these, as a self-contained JSON object with a
//!   `type` field.
//! - **Snapshot** ([`RoomSnapshot`]) — the per-viewer authoritative state
//!   the server pushes after every accepted mutation.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — how messages become text frames.
//!
//! The protocol layer sits between transport (text frames) and the room
//! engine. It doesn't know about connections or rooms — it only knows how
//! to shape and parse messages.

mod codec;
mod error;
mod messages;
mod snapshot;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use messages::{ClientMessage, GameIntent, ServerMessage, SourceKind, TargetKind};
pub use snapshot::{
    FoundationView, LastMove, MoveKind, PlayerView, RoomPhase, RoomSnapshot,
};
pub use types::{GameMode, RoomCode, Seat, SessionId};
