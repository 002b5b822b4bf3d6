//! Canonical deck construction and shuffling.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{Card, Rank, Suit, DECK_SIZE};

/// The canonical 52-card deck in fixed suits × ranks order.
///
/// Every pile multiset in a room must always re-assemble into exactly this
/// set — the conservation invariant is checked against it.
pub fn standard_deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    for &suit in &Suit::ALL {
        for &rank in &Rank::ALL {
            cards.push(Card::new(suit, rank));
        }
    }
    cards
}

/// A Fisher–Yates-shuffled deck drawn from the given source.
///
/// The room owns its RNG; passing a seeded `StdRng` makes the whole deal
/// reproducible in tests.
pub fn shuffled_deck<R: Rng + ?Sized>(rng: &mut R) -> Vec<Card> {
    let mut deck = standard_deck();
    deck.shuffle(rng);
    deck
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_standard_deck_has_52_unique_cards() {
        let deck = standard_deck();
        assert_eq!(deck.len(), DECK_SIZE);

        let mut seen = [false; DECK_SIZE];
        for card in &deck {
            let idx = card.index();
            assert!(!seen[idx], "duplicate card {card}");
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&b| b));
    }

    #[test]
    fn test_shuffled_deck_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let deck = shuffled_deck(&mut rng);
        assert_eq!(deck.len(), DECK_SIZE);

        let mut seen = [false; DECK_SIZE];
        for card in &deck {
            seen[card.index()] = true;
        }
        assert!(seen.iter().all(|&b| b));
    }

    #[test]
    fn test_same_seed_same_shuffle() {
        let a = shuffled_deck(&mut StdRng::seed_from_u64(42));
        let b = shuffled_deck(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = shuffled_deck(&mut StdRng::seed_from_u64(1));
        let b = shuffled_deck(&mut StdRng::seed_from_u64(2));
        assert_ne!(a, b);
    }
}
