//! Room engine for the Duo-taire server.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its game
//! state, deal RNG, and timers. The other pieces of this crate route
//! connections to those actors: the [`RoomRegistry`] maps six-character
//! codes to room handles, and the [`Matchmaker`] pairs queued connections
//! into fresh rooms.

mod config;
mod engine;
mod error;
mod matchmaker;
mod registry;
pub mod rules;
pub mod state;

pub use config::RoomConfig;
pub use engine::{LeaveInfo, PlayerSender, RoomHandle, RoomStatus};
pub use error::RoomError;
pub use matchmaker::{Matchmaker, Waiter};
pub use registry::{
    generate_code, spawn_sweeper, RoomRegistry, CODE_ALPHABET, CODE_LEN,
};
