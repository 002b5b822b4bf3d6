//! Card, Suit, and Rank types for a standard 52-card deck.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of suits in a standard deck.
pub const NUM_SUITS: usize = 4;
/// Number of ranks in a standard deck.
pub const NUM_RANKS: usize = 13;
/// Number of cards in a standard deck.
pub const DECK_SIZE: usize = NUM_SUITS * NUM_RANKS;

/// The four suits, in the fixed order used for foundation slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Spades,
    Clubs,
    Hearts,
    Diamonds,
}

impl Suit {
    /// All suits in a fixed, reproducible order. Foundation `i` holds
    /// `Suit::ALL[i]`.
    pub const ALL: [Suit; NUM_SUITS] = [
        Suit::Spades,
        Suit::Clubs,
        Suit::Hearts,
        Suit::Diamonds,
    ];

    /// The color of the suit.
    pub fn color(self) -> Color {
        match self {
            Suit::Hearts | Suit::Diamonds => Color::Red,
            Suit::Spades | Suit::Clubs => Color::Black,
        }
    }

    /// Single-character representation: 'S', 'C', 'H', or 'D'.
    pub fn short_char(self) -> char {
        match self {
            Suit::Spades => 'S',
            Suit::Clubs => 'C',
            Suit::Hearts => 'H',
            Suit::Diamonds => 'D',
        }
    }
}

/// Red or black. Center-pile builds alternate colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// The thirteen ranks, Ace low. `value()` gives 1..=13.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rank {
    A,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    J,
    Q,
    K,
}

impl Rank {
    /// All ranks in a fixed, reproducible order (Ace..King).
    pub const ALL: [Rank; NUM_RANKS] = [
        Rank::A,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::J,
        Rank::Q,
        Rank::K,
    ];

    /// Rank value in 1..=13 (Ace=1, King=13).
    pub fn value(self) -> u8 {
        match self {
            Rank::A => 1,
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten => 10,
            Rank::J => 11,
            Rank::Q => 12,
            Rank::K => 13,
        }
    }

    fn short_str(self) -> &'static str {
        match self {
            Rank::A => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::J => "J",
            Rank::Q => "Q",
            Rank::K => "K",
        }
    }
}

/// A playing card. Immutable after creation.
///
/// On the wire this is `{"suit": "spades", "rank": "A"}` — readable in
/// browser DevTools, which matters more here than compactness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub fn new(suit: Suit, rank: Rank) -> Self {
        Self { suit, rank }
    }

    /// Rank value in 1..=13.
    pub fn value(self) -> u8 {
        self.rank.value()
    }

    /// Red or black, from the suit.
    pub fn color(self) -> Color {
        self.suit.color()
    }

    /// Stable index in 0..52, used for conservation checks.
    pub fn index(self) -> usize {
        let s = Suit::ALL
            .iter()
            .position(|&x| x == self.suit)
            .expect("suit is one of ALL");
        s * NUM_RANKS + (self.value() as usize - 1)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.short_str(), self.suit.short_char())
    }
}
