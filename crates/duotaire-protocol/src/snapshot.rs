//! Authoritative state as clients see it.
//!
//! A snapshot is always built *for* a specific viewer: your own drawn card
//! is visible to you, the opponent's is absent, and decks are exposed by
//! size only. The room engine builds one snapshot per seat inside the same
//! critical section as the mutation, so no client can observe an
//! intermediate state.

use duotaire_cards::{Card, Suit};
use serde::{Deserialize, Serialize};

/// Room lifecycle phase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomPhase {
    Waiting,
    Playing,
    Finished,
}

/// One seat as seen by a viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub index: u8,
    pub name: String,
    /// Decks are hidden; only their size is public.
    pub deck_size: usize,
    /// Discards are face-up and fully visible to both seats.
    pub discard_pile: Vec<Card>,
    /// Present only in the owner's own view, and only while one is held.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawn_card: Option<Card>,
}

/// One suit-locked foundation stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundationView {
    pub suit: Suit,
    pub cards: Vec<Card>,
}

/// Full per-viewer state. `state_version` lets clients detect missed
/// updates and resync by requesting a fresh snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_code: String,
    pub phase: RoomPhase,
    pub current_player: u8,
    /// -1 while undecided, else the winning seat index.
    pub winner: i8,
    pub state_version: u64,
    pub players: Vec<PlayerView>,
    pub center_piles: Vec<Vec<Card>>,
    pub foundations: Vec<FoundationView>,
}

/// What kind of mutation a delta entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Draw,
    CenterPlay,
    FoundationPlay,
    OpponentDiscardPlay,
    TurnEndDiscard,
    SequenceMove,
    Zap,
}

/// The most recent accepted mutation, attached to `state_update`.
///
/// `card` is absent for draws — the drawn card is secret from the
/// opponent, and both seats receive the same `last_move` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMove {
    pub kind: MoveKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    pub player_index: u8,
}

#[cfg(test)]
mod tests {
    use duotaire_cards::Rank;

    use super::*;

    fn sample_snapshot() -> RoomSnapshot {
        RoomSnapshot {
            room_code: "ABCDEF".into(),
            phase: RoomPhase::Playing,
            current_player: 0,
            winner: -1,
            state_version: 3,
            players: vec![
                PlayerView {
                    index: 0,
                    name: "Player 1".into(),
                    deck_size: 21,
                    discard_pile: vec![],
                    drawn_card: Some(Card::new(Suit::Spades, Rank::A)),
                },
                PlayerView {
                    index: 1,
                    name: "Player 2".into(),
                    deck_size: 21,
                    discard_pile: vec![],
                    drawn_card: None,
                },
            ],
            center_piles: vec![vec![]; 5],
            foundations: Suit::ALL
                .iter()
                .map(|&suit| FoundationView { suit, cards: vec![] })
                .collect(),
        }
    }

    #[test]
    fn test_snapshot_uses_camel_case_field_names() {
        let json = serde_json::to_value(sample_snapshot()).unwrap();
        assert_eq!(json["roomCode"], "ABCDEF");
        assert_eq!(json["phase"], "playing");
        assert_eq!(json["currentPlayer"], 0);
        assert_eq!(json["winner"], -1);
        assert_eq!(json["stateVersion"], 3);
        assert_eq!(json["centerPiles"].as_array().unwrap().len(), 5);
        assert_eq!(json["foundations"].as_array().unwrap().len(), 4);
        assert_eq!(json["players"][0]["deckSize"], 21);
        assert!(json["players"][0]["discardPile"].is_array());
    }

    #[test]
    fn test_snapshot_hides_absent_drawn_card() {
        // Seat 1 holds nothing, so the key must be absent entirely rather
        // than serialized as null.
        let json = serde_json::to_value(sample_snapshot()).unwrap();
        assert_eq!(json["players"][0]["drawnCard"]["rank"], "A");
        assert!(json["players"][1].get("drawnCard").is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snapshot = sample_snapshot();
        let text = serde_json::to_string(&snapshot).unwrap();
        let back: RoomSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_move_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&MoveKind::FoundationPlay).unwrap(),
            "\"foundation_play\""
        );
        assert_eq!(
            serde_json::to_string(&MoveKind::TurnEndDiscard).unwrap(),
            "\"turn_end_discard\""
        );
    }

    #[test]
    fn test_last_move_omits_card_for_draws() {
        let last = LastMove {
            kind: MoveKind::Draw,
            card: None,
            player_index: 0,
        };
        let json = serde_json::to_value(&last).unwrap();
        assert_eq!(json["kind"], "draw");
        assert_eq!(json["playerIndex"], 0);
        assert!(json.get("card").is_none());
    }
}
