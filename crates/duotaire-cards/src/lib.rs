//! Card model and placement rules for Duo-taire.
//!
//! This crate is pure data + pure functions: no async, no I/O. The room
//! engine composes every legal move out of the three placement predicates
//! in [`rules`].

mod card;
mod deck;
pub mod rules;

pub use card::{Card, Color, Rank, Suit, DECK_SIZE, NUM_RANKS, NUM_SUITS};
pub use deck::{shuffled_deck, standard_deck};
