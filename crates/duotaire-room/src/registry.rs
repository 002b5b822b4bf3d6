//! Room registry: allocation, code generation, lookup, disposal.
//!
//! The registry is a plain map; the server wraps it in one `Mutex`. Every
//! critical section is O(1) — insert, lookup, remove — and the lock is
//! never held while calling into a room actor. Lifetime is resolved by
//! choice (b) of the design: a disposed room's channel is closed, so late
//! dispatches through a stale handle degrade to no-ops.

use std::collections::HashMap;
use std::sync::Arc;

use duotaire_protocol::{GameMode, RoomCode, RoomPhase};
use rand::Rng;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::engine::{spawn_room, RoomHandle};
use crate::RoomConfig;

/// Room-code alphabet: 32 glyphs, no ambiguous I/O/0/1.
pub const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
/// Room codes are always six characters.
pub const CODE_LEN: usize = 6;

/// Generates a random six-character room code.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    let code: String = (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    RoomCode::from_generated(code)
}

/// Holds the `code → room` mapping for all live rooms.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomHandle>,
    config: RoomConfig,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
        }
    }

    /// Spawns a new room under a fresh code, retrying on collision.
    pub fn create_room(&mut self, mode: GameMode) -> RoomHandle {
        let mut rng = rand::rng();
        let code = loop {
            let candidate = generate_code(&mut rng);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let handle = spawn_room(code.clone(), mode, self.config.clone());
        self.rooms.insert(code.clone(), handle.clone());
        tracing::info!(room = %code, ?mode, "room created");
        handle
    }

    /// Looks up by raw client input: trims and uppercases before matching,
    /// so `"abcdef"` finds `"ABCDEF"`.
    pub fn lookup(&self, raw: &str) -> Option<RoomHandle> {
        self.rooms.get(&RoomCode::normalize(raw)).cloned()
    }

    /// Drops a room's registry entry. The caller is responsible for having
    /// told (or not needing to tell) the actor to stop.
    pub fn remove(&mut self, code: &RoomCode) -> Option<RoomHandle> {
        let removed = self.rooms.remove(code);
        if removed.is_some() {
            tracing::info!(room = %code, "room removed from registry");
        }
        removed
    }

    /// Cloned handles to every registered room.
    pub fn handles(&self) -> Vec<RoomHandle> {
        self.rooms.values().cloned().collect()
    }

    /// Drops entries whose actor has already stopped. Returns how many.
    pub fn prune_closed(&mut self) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|_, handle| !handle.is_closed());
        before - self.rooms.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

/// Spawns the background sweep: every `sweep_interval`, prune stopped
/// rooms and dispose waiting rooms older than `waiting_room_ttl` whose
/// guest seat never filled.
///
/// Handles are collected under the lock, queried without it, and removals
/// re-take it — the registry lock never spans a call into a room.
pub fn spawn_sweeper(registry: Arc<Mutex<RoomRegistry>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (interval, ttl) = {
            let registry = registry.lock().await;
            (
                registry.config.sweep_interval,
                registry.config.waiting_room_ttl,
            )
        };
        loop {
            tokio::time::sleep(interval).await;

            let handles = {
                let mut registry = registry.lock().await;
                let pruned = registry.prune_closed();
                if pruned > 0 {
                    tracing::debug!(pruned, "sweep dropped stopped rooms");
                }
                registry.handles()
            };

            let mut stale = Vec::new();
            for handle in handles {
                if let Ok(status) = handle.status().await {
                    let expired = status.phase == RoomPhase::Waiting
                        && !status.guest_ever_seated
                        && status.age > ttl;
                    if expired {
                        handle.dispose().await;
                        stale.push(status.code);
                    }
                }
            }

            if !stale.is_empty() {
                let mut registry = registry.lock().await;
                for code in stale {
                    tracing::info!(room = %code, "swept stale waiting room");
                    registry.remove(&code);
                }
            }
        }
    })
}
