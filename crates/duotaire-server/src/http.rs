//! HTTP observability side-channel.
//!
//! Two read-only endpoints, served from their own listener so the game
//! port stays a pure message-framed transport:
//!
//! - `GET /health` — `{status, rooms, timestamp, uptime}`
//! - `GET /` — the same plus per-phase room counts

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use duotaire_protocol::RoomPhase;
use serde::Serialize;

use crate::server::ServerState;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    rooms: usize,
    timestamp: u64,
    uptime: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct SummaryResponse {
    service: &'static str,
    status: &'static str,
    rooms: usize,
    waiting: usize,
    playing: usize,
    finished: usize,
    timestamp: u64,
    uptime: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub(crate) async fn health(
    State(state): State<Arc<ServerState>>,
) -> Json<HealthResponse> {
    let rooms = state.registry.lock().await.room_count();
    Json(HealthResponse {
        status: "ok",
        rooms,
        timestamp: unix_now(),
        uptime: state.started_at.elapsed().as_secs(),
    })
}

pub(crate) async fn summary(
    State(state): State<Arc<ServerState>>,
) -> Json<SummaryResponse> {
    // Handles are collected under the lock; status queries run without it.
    let handles = state.registry.lock().await.handles();
    let mut waiting = 0;
    let mut playing = 0;
    let mut finished = 0;
    for handle in &handles {
        if let Ok(status) = handle.status().await {
            match status.phase {
                RoomPhase::Waiting => waiting += 1,
                RoomPhase::Playing => playing += 1,
                RoomPhase::Finished => finished += 1,
            }
        }
    }

    Json(SummaryResponse {
        service: "duotaire-server",
        status: "ok",
        rooms: handles.len(),
        waiting,
        playing,
        finished,
        timestamp: unix_now(),
        uptime: state.started_at.elapsed().as_secs(),
    })
}

/// Builds the observability router over the shared server state.
pub(crate) fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(summary))
        .route("/health", get(health))
        .with_state(state)
}
