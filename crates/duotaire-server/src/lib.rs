//! # Duo-taire server
//!
//! Authoritative real-time server for the two-player card game Duo-taire.
//! Clients connect over a text-framed WebSocket transport and submit
//! intents; the server owns all state and pushes authoritative updates.
//!
//! The crates underneath follow the data flow:
//! transport (frames) → protocol (messages) → registry/matchmaking
//! (routing) → room engine (the game).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use duotaire_server::DuotaireServer;
//!
//! # async fn run() -> Result<(), duotaire_server::ServerError> {
//! let server = DuotaireServer::builder()
//!     .bind("0.0.0.0:2567")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod http;
mod server;

pub use error::ServerError;
pub use server::{DuotaireServer, DuotaireServerBuilder};
