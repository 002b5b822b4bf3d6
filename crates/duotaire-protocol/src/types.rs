//! Identity types shared by every layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle for one client connection.
///
/// A newtype over the transport's connection counter. The room keeps its
/// own `seat → SessionId` mapping; nothing game-related hangs off the
/// transport object itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// One of the two fixed seats in a room. Seat 0 is the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    Host,
    Guest,
}

impl Seat {
    /// Wire index: 0 for host, 1 for guest.
    pub fn index(self) -> u8 {
        match self {
            Seat::Host => 0,
            Seat::Guest => 1,
        }
    }

    /// The other seat.
    pub fn opponent(self) -> Seat {
        match self {
            Seat::Host => Seat::Guest,
            Seat::Guest => Seat::Host,
        }
    }

    pub fn from_index(index: u8) -> Option<Seat> {
        match index {
            0 => Some(Seat::Host),
            1 => Some(Seat::Guest),
            _ => None,
        }
    }

    /// Both seats, host first.
    pub const BOTH: [Seat; 2] = [Seat::Host, Seat::Guest];
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat-{}", self.index())
    }
}

/// A six-character room code.
///
/// Stored normalized (uppercase). Codes are generated by the registry from
/// a 32-glyph alphabet with no ambiguous characters; lookups normalize the
/// client's input so `"abcdef"` finds `"ABCDEF"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalizes raw client input: trims whitespace, uppercases.
    pub fn normalize(raw: &str) -> RoomCode {
        RoomCode(raw.trim().to_ascii_uppercase())
    }

    /// Wraps an already-normalized code (registry-generated).
    pub fn from_generated(code: String) -> RoomCode {
        debug_assert_eq!(code, code.trim().to_ascii_uppercase());
        RoomCode(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a room was opened.
///
/// Private rooms are shared by telling the other player the code; public
/// rooms additionally show up in the HTTP summary. Both are joined by code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Private,
    Public,
}
