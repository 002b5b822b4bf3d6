//! Room behavior knobs.

use std::time::Duration;

/// Configuration shared by every room a registry spawns.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Grace period after a foundation play during which the opponent may
    /// challenge with `zap`.
    pub zap_window: Duration,

    /// Penalty for a successful zap ("discard reclaim"): the zapped player
    /// takes this many cards from the top of their own discard back onto
    /// the top of their deck.
    pub zap_penalty_cards: usize,

    /// Resolution of the turn clock that accumulates play time.
    pub turn_clock_period: Duration,

    /// Waiting rooms whose guest seat was never filled are swept once
    /// older than this.
    pub waiting_room_ttl: Duration,

    /// How often the registry sweep runs.
    pub sweep_interval: Duration,

    /// Bound of each room's command channel.
    pub intent_channel_size: usize,

    /// Fixed seed for the per-room deal RNG. `None` seeds from the OS;
    /// tests set it for reproducible deals.
    pub rng_seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            zap_window: Duration::from_millis(3000),
            zap_penalty_cards: 2,
            turn_clock_period: Duration::from_secs(1),
            waiting_room_ttl: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(60),
            intent_channel_size: 64,
            rng_seed: None,
        }
    }
}
