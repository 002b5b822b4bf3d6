//! End-to-end tests: real WebSocket clients against a full server.

use std::time::Duration;

use duotaire_protocol::{ClientMessage, RoomPhase, ServerMessage, SourceKind, TargetKind};
use duotaire_room::RoomConfig;
use duotaire_server::DuotaireServer;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

// =========================================================================
// Helpers
// =========================================================================

async fn start() -> String {
    let server = DuotaireServer::builder()
        .bind("127.0.0.1:0")
        .room_config(RoomConfig {
            rng_seed: Some(5),
            ..RoomConfig::default()
        })
        .build()
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn ws(addr: &str) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .unwrap();
    ws
}

async fn send(ws: &mut Ws, msg: &ClientMessage) {
    let frame = serde_json::to_string(msg).unwrap();
    ws.send(Message::Text(frame.into())).await.unwrap();
}

async fn recv(ws: &mut Ws) -> ServerMessage {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .expect("transport error");
        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("valid server frame")
            }
            _ => continue, // ping/pong
        }
    }
}

/// Creates a room with `p1` and joins `p2` by code, draining the whole
/// open handshake. Returns the room code.
async fn setup_game(p1: &mut Ws, p2: &mut Ws) -> String {
    send(p1, &ClientMessage::CreateRoom { game_mode: None }).await;
    let code = match recv(p1).await {
        ServerMessage::RoomCreated {
            room_code,
            player_id,
        } => {
            assert_eq!(player_id, 0);
            room_code
        }
        other => panic!("expected room_created, got {other:?}"),
    };

    send(
        p2,
        &ClientMessage::JoinRoom {
            room_code: code.clone(),
        },
    )
    .await;
    assert!(matches!(
        recv(p2).await,
        ServerMessage::RoomJoined { player_id: 1, .. }
    ));
    assert!(matches!(
        recv(p2).await,
        ServerMessage::PlayerJoined { player_id: 1 }
    ));
    assert!(matches!(recv(p2).await, ServerMessage::GameStarted { .. }));

    assert!(matches!(
        recv(p1).await,
        ServerMessage::PlayerJoined { player_id: 1 }
    ));
    assert!(matches!(recv(p1).await, ServerMessage::GameStarted { .. }));

    code
}

// =========================================================================
// Opening a room
// =========================================================================

#[tokio::test]
async fn test_full_game_open_with_case_insensitive_code() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    let mut p2 = ws(&addr).await;

    send(&mut p1, &ClientMessage::CreateRoom { game_mode: None }).await;
    let code = match recv(&mut p1).await {
        ServerMessage::RoomCreated { room_code, .. } => room_code,
        other => panic!("expected room_created, got {other:?}"),
    };
    assert_eq!(code.len(), 6);

    // The guest types the code in lowercase; the registry must find it.
    send(
        &mut p2,
        &ClientMessage::JoinRoom {
            room_code: code.to_ascii_lowercase(),
        },
    )
    .await;
    assert!(matches!(
        recv(&mut p2).await,
        ServerMessage::RoomJoined { player_id: 1, .. }
    ));

    // Both receive player_joined, then game_started.
    assert!(matches!(
        recv(&mut p2).await,
        ServerMessage::PlayerJoined { player_id: 1 }
    ));
    let state = match recv(&mut p2).await {
        ServerMessage::GameStarted { state } => state,
        other => panic!("expected game_started, got {other:?}"),
    };
    assert_eq!(state.phase, RoomPhase::Playing);
    assert_eq!(state.center_piles.len(), 5);
    for pile in &state.center_piles {
        assert_eq!(pile.len(), 2);
    }
    for player in &state.players {
        assert_eq!(player.deck_size, 21);
    }

    assert!(matches!(
        recv(&mut p1).await,
        ServerMessage::PlayerJoined { player_id: 1 }
    ));
    assert!(matches!(
        recv(&mut p1).await,
        ServerMessage::GameStarted { .. }
    ));
}

#[tokio::test]
async fn test_join_unknown_code_returns_error() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;

    send(
        &mut p1,
        &ClientMessage::JoinRoom {
            room_code: "ZZZZZZ".into(),
        },
    )
    .await;
    match recv(&mut p1).await {
        ServerMessage::Error { message } => {
            assert_eq!(message, "room not found");
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_action_outside_a_room_returns_error() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;

    send(&mut p1, &ClientMessage::DrawCard).await;
    match recv(&mut p1).await {
        ServerMessage::Error { message } => {
            assert_eq!(message, "not in a room");
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_frame_gets_error_without_disconnect() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;

    p1.send(Message::Text("this is not json".into())).await.unwrap();
    assert!(matches!(recv(&mut p1).await, ServerMessage::Error { .. }));

    // The connection survived: a valid message still works.
    send(&mut p1, &ClientMessage::CreateRoom { game_mode: None }).await;
    assert!(matches!(
        recv(&mut p1).await,
        ServerMessage::RoomCreated { .. }
    ));
}

// =========================================================================
// Playing
// =========================================================================

#[tokio::test]
async fn test_draw_flow_notifies_both_seats() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    let mut p2 = ws(&addr).await;
    setup_game(&mut p1, &mut p2).await;

    send(&mut p1, &ClientMessage::DrawCard).await;

    match recv(&mut p1).await {
        ServerMessage::CardDrawn { deck_size, .. } => assert_eq!(deck_size, 20),
        other => panic!("expected card_drawn, got {other:?}"),
    }
    match recv(&mut p1).await {
        ServerMessage::StateUpdate { state, .. } => {
            assert!(state.players[0].drawn_card.is_some());
            assert_eq!(state.state_version, 1);
        }
        other => panic!("expected state_update, got {other:?}"),
    }

    match recv(&mut p2).await {
        ServerMessage::OpponentDrew {
            player_index,
            deck_size,
        } => {
            assert_eq!(player_index, 0);
            assert_eq!(deck_size, 20);
        }
        other => panic!("expected opponent_drew, got {other:?}"),
    }
    match recv(&mut p2).await {
        ServerMessage::StateUpdate { state, .. } => {
            assert!(state.players[0].drawn_card.is_none(), "hidden from opponent");
        }
        other => panic!("expected state_update, got {other:?}"),
    }
}

#[tokio::test]
async fn test_discard_swap_hands_the_turn_over() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    let mut p2 = ws(&addr).await;
    setup_game(&mut p1, &mut p2).await;

    send(&mut p1, &ClientMessage::DrawCard).await;
    send(
        &mut p1,
        &ClientMessage::PlayCard {
            from_type: SourceKind::Drawn,
            from_index: 0,
            to_type: TargetKind::OwnDiscard,
            to_index: 0,
        },
    )
    .await;

    let _ = recv(&mut p1).await; // card_drawn
    let _ = recv(&mut p1).await; // state_update (draw)
    match recv(&mut p1).await {
        ServerMessage::StateUpdate { state, .. } => {
            assert_eq!(state.current_player, 1);
            assert_eq!(state.players[0].discard_pile.len(), 1);
        }
        other => panic!("expected state_update, got {other:?}"),
    }

    // Now it's p2's turn; their draw succeeds.
    let _ = recv(&mut p2).await; // opponent_drew
    let _ = recv(&mut p2).await; // state_update (draw)
    let _ = recv(&mut p2).await; // state_update (swap)
    send(&mut p2, &ClientMessage::DrawCard).await;
    assert!(matches!(
        recv(&mut p2).await,
        ServerMessage::CardDrawn { .. }
    ));
}

#[tokio::test]
async fn test_request_state_returns_full_snapshot() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    let mut p2 = ws(&addr).await;
    let code = setup_game(&mut p1, &mut p2).await;

    send(&mut p1, &ClientMessage::RequestState).await;
    match recv(&mut p1).await {
        ServerMessage::StateUpdate { state, .. } => {
            assert_eq!(state.room_code, code);
            assert_eq!(state.phase, RoomPhase::Playing);
            assert_eq!(state.state_version, 0, "request_state mutates nothing");
        }
        other => panic!("expected state_update, got {other:?}"),
    }
}

// =========================================================================
// Disconnects
// =========================================================================

#[tokio::test]
async fn test_disconnect_forfeits_to_the_remaining_player() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    let mut p2 = ws(&addr).await;
    setup_game(&mut p1, &mut p2).await;

    p2.close(None).await.unwrap();

    assert!(matches!(
        recv(&mut p1).await,
        ServerMessage::PlayerLeft { player_id: 1 }
    ));
    match recv(&mut p1).await {
        ServerMessage::GameOver { winner, reason } => {
            assert_eq!(winner, 0);
            assert_eq!(reason, "Opponent disconnected");
        }
        other => panic!("expected game_over, got {other:?}"),
    }
}

// =========================================================================
// Matchmaking
// =========================================================================

#[tokio::test]
async fn test_find_match_pairs_oldest_waiter_as_host() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    let mut p2 = ws(&addr).await;

    send(
        &mut p1,
        &ClientMessage::FindMatch {
            player_name: Some("Ada".into()),
        },
    )
    .await;
    match recv(&mut p1).await {
        ServerMessage::MatchmakingWaiting { queue_position } => {
            assert_eq!(queue_position, 1);
        }
        other => panic!("expected matchmaking_waiting, got {other:?}"),
    }

    send(
        &mut p2,
        &ClientMessage::FindMatch {
            player_name: Some("Grace".into()),
        },
    )
    .await;

    // The waiter becomes seat 0, the requester seat 1.
    assert!(matches!(
        recv(&mut p1).await,
        ServerMessage::RoomCreated { player_id: 0, .. }
    ));
    assert!(matches!(
        recv(&mut p2).await,
        ServerMessage::RoomJoined { player_id: 1, .. }
    ));

    for client in [&mut p1, &mut p2] {
        assert!(matches!(
            recv(client).await,
            ServerMessage::PlayerJoined { player_id: 1 }
        ));
        let state = match recv(client).await {
            ServerMessage::GameStarted { state } => state,
            other => panic!("expected game_started, got {other:?}"),
        };
        assert_eq!(state.players[0].name, "Ada");
        assert_eq!(state.players[1].name, "Grace");
    }
}

#[tokio::test]
async fn test_cancel_matchmaking_leaves_the_queue() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    let mut p2 = ws(&addr).await;

    send(&mut p1, &ClientMessage::FindMatch { player_name: None }).await;
    let _ = recv(&mut p1).await; // matchmaking_waiting

    send(&mut p1, &ClientMessage::CancelMatchmaking).await;
    assert!(matches!(
        recv(&mut p1).await,
        ServerMessage::MatchmakingCancelled
    ));

    // p2 is not paired with the cancelled waiter.
    send(&mut p2, &ClientMessage::FindMatch { player_name: None }).await;
    match recv(&mut p2).await {
        ServerMessage::MatchmakingWaiting { queue_position } => {
            assert_eq!(queue_position, 1);
        }
        other => panic!("expected matchmaking_waiting, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disconnected_waiter_is_skipped() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;

    send(&mut p1, &ClientMessage::FindMatch { player_name: None }).await;
    let _ = recv(&mut p1).await;
    p1.close(None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The next seeker must not be paired with the ghost.
    let mut p2 = ws(&addr).await;
    send(&mut p2, &ClientMessage::FindMatch { player_name: None }).await;
    assert!(matches!(
        recv(&mut p2).await,
        ServerMessage::MatchmakingWaiting { queue_position: 1 }
    ));
}
