//! The three placement predicates, plus the run check for multi-card
//! center moves. Every legal move in the game is composed from these.

use crate::{Card, Rank, Suit};

/// Can `card` go on a center pile whose top is `top`?
///
/// An empty pile accepts anything. Otherwise the card must be exactly one
/// rank below the top and the opposite color.
pub fn can_place_on_center(card: Card, top: Option<Card>) -> bool {
    match top {
        None => true,
        Some(top) => {
            card.value() + 1 == top.value() && card.color() != top.color()
        }
    }
}

/// Can `card` go on the foundation for `suit` whose top is `top`?
///
/// Foundations are suit-locked and build A, 2, 3, … with no gaps.
pub fn can_place_on_foundation(card: Card, suit: Suit, top: Option<Card>) -> bool {
    if card.suit != suit {
        return false;
    }
    match top {
        None => card.rank == Rank::A,
        Some(top) => card.value() == top.value() + 1,
    }
}

/// Can `card` go on the opponent's discard whose top is `top`?
///
/// Legal if same rank but different suit, or same suit and adjacent rank.
/// An empty opponent discard never accepts a card — the caller must check.
pub fn can_place_on_opponent_discard(card: Card, top: Card) -> bool {
    let same_rank_other_suit = card.rank == top.rank && card.suit != top.suit;
    let same_suit_adjacent = card.suit == top.suit
        && card.value().abs_diff(top.value()) == 1;
    same_rank_other_suit || same_suit_adjacent
}

/// Is `run` a valid center-pile build — strictly descending by one rank
/// per step and strictly alternating in color?
///
/// Cards are ordered bottom-first. A single card is trivially a run.
pub fn is_descending_alternating(run: &[Card]) -> bool {
    run.windows(2).all(|pair| {
        pair[1].value() + 1 == pair[0].value()
            && pair[1].color() != pair[0].color()
    })
}
