//! Per-connection handler: frame decode, intent routing, outbound pump.
//!
//! The connection adapter owns exactly one small record per connection —
//! the slot binding it to a room, if any. Everything game-related lives in
//! the room; everything socket-related lives here.
//!
//! Outbound traffic flows through an unbounded channel drained by a writer
//! pump task. The room actor and this handler push into the same channel,
//! so a connection's messages form a single ordered stream.

use std::sync::Arc;

use duotaire_protocol::{
    ClientMessage, Codec, GameIntent, GameMode, RoomCode, ServerMessage,
    SessionId,
};
use duotaire_room::{PlayerSender, RoomHandle};
use duotaire_transport::{Connection, WebSocketConnection};
use tokio::sync::{mpsc, Mutex};

use crate::server::ServerState;
use crate::ServerError;

/// A connection's binding to its room.
pub(crate) struct RoomBinding {
    pub(crate) code: RoomCode,
    pub(crate) handle: RoomHandle,
    pub(crate) is_host: bool,
}

/// The per-connection mutable slot. Shared with the matchmaker so the
/// pairing handler can bind a waiter into the room it created for them.
#[derive(Default)]
pub(crate) struct ConnSlot {
    pub(crate) room: Option<RoomBinding>,
}

pub(crate) type SharedSlot = Arc<Mutex<ConnSlot>>;

/// What a queued connection leaves with the matchmaker.
pub(crate) struct MatchContext {
    pub(crate) name: Option<String>,
    pub(crate) slot: SharedSlot,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let session = SessionId(conn.id().into_inner());
    tracing::debug!(%session, "handling new connection");

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let slot: SharedSlot = Arc::new(Mutex::new(ConnSlot::default()));

    // Writer pump: encodes and sends everything queued for this client.
    let pump_conn = conn.clone();
    let pump_codec = state.codec;
    let pump = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let frame = match pump_codec.encode(&message) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(error = %e, "outbound encode failed");
                    continue;
                }
            };
            if pump_conn.send(&frame).await.is_err() {
                break;
            }
        }
    });

    loop {
        let frame = match conn.recv().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!(%session, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%session, error = %e, "recv error");
                break;
            }
        };

        let message: ClientMessage = match state.codec.decode(&frame) {
            Ok(message) => message,
            Err(e) => {
                // Protocol errors get a reply, never a disconnect.
                send(&tx, error_message(format!("invalid message: {e}")));
                continue;
            }
        };

        handle_message(session, message, &tx, &slot, &state).await;
    }

    on_disconnect(session, &slot, &state).await;
    pump.abort();
    Ok(())
}

/// Dispatches one decoded message: room management here, game intents into
/// the bound room's queue.
async fn handle_message(
    session: SessionId,
    message: ClientMessage,
    tx: &PlayerSender,
    slot: &SharedSlot,
    state: &Arc<ServerState>,
) {
    match message {
        ClientMessage::CreateRoom { game_mode } => {
            if slot.lock().await.room.is_some() {
                send(tx, error_message("already in a room".into()));
                return;
            }
            let handle = {
                let mut registry = state.registry.lock().await;
                registry.create_room(game_mode.unwrap_or_default())
            };
            bind_to_room(session, None, handle, tx, slot, state).await;
        }

        ClientMessage::JoinRoom { room_code } => {
            if slot.lock().await.room.is_some() {
                send(tx, error_message("already in a room".into()));
                return;
            }
            let handle = state.registry.lock().await.lookup(&room_code);
            match handle {
                Some(handle) => {
                    bind_to_room(session, None, handle, tx, slot, state).await;
                }
                None => {
                    send(tx, error_message("room not found".into()));
                }
            }
        }

        ClientMessage::LeaveRoom => {
            let binding = slot.lock().await.room.take();
            match binding {
                Some(binding) => {
                    leave_room(session, binding, state).await;
                }
                None => {
                    send(tx, error_message("not in a room".into()));
                }
            }
        }

        ClientMessage::FindMatch { player_name } => {
            if slot.lock().await.room.is_some() {
                send(tx, error_message("already in a room".into()));
                return;
            }
            find_match(session, player_name, tx, slot, state).await;
        }

        ClientMessage::CancelMatchmaking => {
            state.matchmaker.lock().await.remove(session);
            send(tx, ServerMessage::MatchmakingCancelled);
        }

        // Everything else is a game intent for the bound room.
        other => match other.into_game_intent() {
            Ok(intent) => {
                route_intent(session, intent, tx, slot, state).await;
            }
            Err(_) => {
                send(tx, error_message("unsupported message".into()));
            }
        },
    }
}

/// Joins a room and records the binding in the connection slot.
async fn bind_to_room(
    session: SessionId,
    name: Option<String>,
    handle: RoomHandle,
    tx: &PlayerSender,
    slot: &SharedSlot,
    state: &Arc<ServerState>,
) {
    match handle.join(session, name, tx.clone()).await {
        Ok(seat) => {
            slot.lock().await.room = Some(RoomBinding {
                code: handle.code().clone(),
                handle,
                is_host: seat == duotaire_protocol::Seat::Host,
            });
        }
        Err(e) => {
            // A room that stopped between lookup and join is indistinguishable
            // from a missing one; either way the registry entry is stale.
            if matches!(e, duotaire_room::RoomError::Unavailable(_)) {
                state.registry.lock().await.remove(handle.code());
            }
            send(tx, error_message(e.to_string()));
        }
    }
}

/// Delivers a leave to the room and reaps it from the registry if that
/// leave shut it down.
async fn leave_room(
    session: SessionId,
    binding: RoomBinding,
    state: &Arc<ServerState>,
) {
    tracing::debug!(
        %session,
        room = %binding.code,
        is_host = binding.is_host,
        "leaving room"
    );
    let info = binding.handle.leave(session).await;
    if info.disposed {
        state.registry.lock().await.remove(&binding.code);
    }
}

/// `find_match`: pair with the oldest live waiter, or enqueue.
async fn find_match(
    session: SessionId,
    player_name: Option<String>,
    tx: &PlayerSender,
    slot: &SharedSlot,
    state: &Arc<ServerState>,
) {
    let waiter = {
        let mut matchmaker = state.matchmaker.lock().await;
        // A repeated find_match replaces any earlier entry.
        matchmaker.remove(session);
        match matchmaker.take_partner(session) {
            Some(waiter) => waiter,
            None => {
                let position = matchmaker.enqueue(
                    session,
                    tx.clone(),
                    MatchContext {
                        name: player_name,
                        slot: Arc::clone(slot),
                    },
                );
                send(
                    tx,
                    ServerMessage::MatchmakingWaiting {
                        queue_position: position,
                    },
                );
                return;
            }
        }
    };

    // Pair found: the waiter becomes the host (seat 0), the requester the
    // guest (seat 1). The second join deals and starts the game.
    let handle = {
        let mut registry = state.registry.lock().await;
        registry.create_room(GameMode::Private)
    };
    tracing::info!(
        host = %waiter.session,
        guest = %session,
        room = %handle.code(),
        "matchmaking paired"
    );

    match handle
        .join(waiter.session, waiter.payload.name, waiter.sender.clone())
        .await
    {
        Ok(_) => {
            waiter.payload.slot.lock().await.room = Some(RoomBinding {
                code: handle.code().clone(),
                handle: handle.clone(),
                is_host: true,
            });
        }
        Err(e) => {
            // The waiter vanished mid-pairing: tear the room down and put
            // the requester back at the head of the line.
            tracing::debug!(error = %e, "paired waiter was gone, re-queueing");
            handle.dispose().await;
            state.registry.lock().await.remove(handle.code());
            let position = state.matchmaker.lock().await.enqueue(
                session,
                tx.clone(),
                MatchContext {
                    name: player_name,
                    slot: Arc::clone(slot),
                },
            );
            send(
                tx,
                ServerMessage::MatchmakingWaiting {
                    queue_position: position,
                },
            );
            return;
        }
    }

    bind_to_room(session, player_name, handle, tx, slot, state).await;
}

/// Forwards a game intent into the bound room.
async fn route_intent(
    session: SessionId,
    intent: GameIntent,
    tx: &PlayerSender,
    slot: &SharedSlot,
    state: &Arc<ServerState>,
) {
    let mut guard = slot.lock().await;
    let Some(binding) = &guard.room else {
        send(tx, error_message("not in a room".into()));
        return;
    };

    if binding.handle.intent(session, intent).await.is_err() {
        // Disposed room: drop the stale binding and registry entry.
        let binding = guard.room.take().expect("binding checked above");
        drop(guard);
        state.registry.lock().await.remove(&binding.code);
        send(tx, error_message("room is no longer available".into()));
    }
}

/// Disconnect cleanup: leave the matchmaking queue and the room.
async fn on_disconnect(
    session: SessionId,
    slot: &SharedSlot,
    state: &Arc<ServerState>,
) {
    state.matchmaker.lock().await.remove(session);
    let binding = slot.lock().await.room.take();
    if let Some(binding) = binding {
        leave_room(session, binding, state).await;
    }
    tracing::debug!(%session, "connection cleaned up");
}

fn send(tx: &PlayerSender, message: ServerMessage) {
    let _ = tx.send(message);
}

fn error_message(message: String) -> ServerMessage {
    ServerMessage::Error { message }
}
