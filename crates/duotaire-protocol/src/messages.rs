//! Inbound and outbound message types.
//!
//! Every frame is one self-contained JSON object tagged by `type`. Tags are
//! snake_case; payload fields follow the wire contract exactly — room
//! management uses snake_case (`room_code`, `player_id`), game payloads use
//! camelCase (`fromType`, `deckSize`).

use duotaire_cards::Card;
use serde::{Deserialize, Serialize};

use crate::{GameMode, LastMove, RoomSnapshot};

/// Where a played card comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    /// The card currently at play. `fromIndex` is ignored.
    Drawn,
    /// The top of center pile `fromIndex`.
    Center,
}

/// Where a played card goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetKind {
    Foundation,
    Center,
    OpponentDiscard,
    /// The turn-ending move. Only legal from `drawn`.
    OwnDiscard,
}

/// Everything a client can send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        game_mode: Option<GameMode>,
    },
    JoinRoom {
        room_code: String,
    },
    LeaveRoom,
    FindMatch {
        #[serde(
            default,
            rename = "playerName",
            skip_serializing_if = "Option::is_none"
        )]
        player_name: Option<String>,
    },
    CancelMatchmaking,
    DrawCard,
    #[serde(rename_all = "camelCase")]
    PlayCard {
        from_type: SourceKind,
        from_index: usize,
        to_type: TargetKind,
        to_index: usize,
    },
    #[serde(rename_all = "camelCase")]
    SequenceMove {
        from_center: usize,
        from_card_index: usize,
        to_center: usize,
    },
    Zap,
    RequestState,
}

/// The subset of [`ClientMessage`] that targets a bound room.
///
/// The connection adapter routes room management itself and forwards these
/// into the room's intent queue.
#[derive(Debug, Clone, PartialEq)]
pub enum GameIntent {
    DrawCard,
    PlayCard {
        from_type: SourceKind,
        from_index: usize,
        to_type: TargetKind,
        to_index: usize,
    },
    SequenceMove {
        from_center: usize,
        from_card_index: usize,
        to_center: usize,
    },
    Zap,
    RequestState,
}

impl ClientMessage {
    /// Splits game intents from room-management messages.
    ///
    /// Returns the original message unchanged when it is not a game intent.
    pub fn into_game_intent(self) -> Result<GameIntent, ClientMessage> {
        match self {
            ClientMessage::DrawCard => Ok(GameIntent::DrawCard),
            ClientMessage::PlayCard {
                from_type,
                from_index,
                to_type,
                to_index,
            } => Ok(GameIntent::PlayCard {
                from_type,
                from_index,
                to_type,
                to_index,
            }),
            ClientMessage::SequenceMove {
                from_center,
                from_card_index,
                to_center,
            } => Ok(GameIntent::SequenceMove {
                from_center,
                from_card_index,
                to_center,
            }),
            ClientMessage::Zap => Ok(GameIntent::Zap),
            ClientMessage::RequestState => Ok(GameIntent::RequestState),
            other => Err(other),
        }
    }
}

/// Everything the server can send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    RoomCreated {
        room_code: String,
        player_id: u8,
    },
    RoomJoined {
        room_code: String,
        player_id: u8,
    },
    PlayerJoined {
        player_id: u8,
    },
    PlayerLeft {
        player_id: u8,
    },
    MatchmakingWaiting {
        queue_position: usize,
    },
    MatchmakingCancelled,
    GameStarted {
        state: RoomSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    StateUpdate {
        state: RoomSnapshot,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_move: Option<LastMove>,
    },
    #[serde(rename_all = "camelCase")]
    CardDrawn {
        card: Card,
        deck_size: usize,
    },
    #[serde(rename_all = "camelCase")]
    OpponentDrew {
        player_index: u8,
        deck_size: usize,
    },
    GameOver {
        /// -1 only for degenerate ends; normally the winning seat index.
        winner: i8,
        reason: String,
    },
    Error {
        message: String,
    },
}
