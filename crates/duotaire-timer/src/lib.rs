//! Cooperative timers scoped to a single room.
//!
//! Each room owns two clocks: the turn clock (accumulates play time into
//! the current player at ~1 Hz) and the ZAP-window deadline. Neither ever
//! mutates anything by itself — a firing is surfaced as a [`TimerEvent`]
//! from [`RoomTimers::next_event`], which the room actor awaits inside its
//! `tokio::select!` loop and applies like any other intent. That keeps
//! every mutation on the room's single serialization point.
//!
//! When nothing is armed, `next_event` pends forever; `select!` simply
//! keeps servicing the other branches. Dropping the `RoomTimers` (room
//! disposal) cancels everything.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* handle intents */ }
//!         event = timers.next_event() => { /* apply as an intent */ }
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::trace;

/// A timer firing, delivered into the room's serialization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One period of the turn clock elapsed while a game was running.
    TurnTick,
    /// The ZAP grace window expired untouched.
    ZapExpired,
}

/// The two cooperative timers owned by one room actor.
pub struct RoomTimers {
    turn_period: Duration,
    turn: Option<Interval>,
    zap_deadline: Option<Instant>,
}

impl RoomTimers {
    /// Creates idle timers. Nothing fires until armed.
    pub fn new(turn_period: Duration) -> Self {
        Self {
            turn_period,
            turn: None,
            zap_deadline: None,
        }
    }

    /// Starts (or restarts) the turn clock. The first tick fires one full
    /// period from now.
    pub fn start_turn_clock(&mut self) {
        let mut interval =
            time::interval_at(Instant::now() + self.turn_period, self.turn_period);
        // A stalled actor should not be punished with a tick burst.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.turn = Some(interval);
        trace!(period = ?self.turn_period, "turn clock started");
    }

    /// Stops the turn clock (game finished or room waiting).
    pub fn stop_turn_clock(&mut self) {
        self.turn = None;
    }

    /// Whether the turn clock is currently running.
    pub fn turn_clock_running(&self) -> bool {
        self.turn.is_some()
    }

    /// Arms the ZAP deadline `window` from now, replacing any earlier one.
    pub fn arm_zap(&mut self, window: Duration) {
        self.zap_deadline = Some(Instant::now() + window);
        trace!(window = ?window, "zap window armed");
    }

    /// Disarms the ZAP deadline. Called whenever a move closes the window
    /// before it expires.
    pub fn disarm_zap(&mut self) {
        self.zap_deadline = None;
    }

    /// Whether a ZAP deadline is armed.
    pub fn zap_armed(&self) -> bool {
        self.zap_deadline.is_some()
    }

    /// Cancels both timers.
    pub fn clear(&mut self) {
        self.turn = None;
        self.zap_deadline = None;
    }

    /// Waits for the next timer firing.
    ///
    /// Pends forever while nothing is armed. The ZAP deadline disarms
    /// itself on expiry, so it fires at most once per arming.
    pub async fn next_event(&mut self) -> TimerEvent {
        let turn = &mut self.turn;
        let zap = self.zap_deadline;

        tokio::select! {
            _ = async {
                match turn {
                    Some(interval) => {
                        interval.tick().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            } => TimerEvent::TurnTick,

            _ = async {
                match zap {
                    Some(deadline) => time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            } => {
                self.zap_deadline = None;
                TimerEvent::ZapExpired
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_timers_are_idle() {
        let timers = RoomTimers::new(Duration::from_secs(1));
        assert!(!timers.turn_clock_running());
        assert!(!timers.zap_armed());
    }

    #[test]
    fn test_arm_and_disarm_zap() {
        let mut timers = RoomTimers::new(Duration::from_secs(1));
        timers.arm_zap(Duration::from_secs(3));
        assert!(timers.zap_armed());
        timers.disarm_zap();
        assert!(!timers.zap_armed());
    }

    #[tokio::test]
    async fn test_clear_cancels_both() {
        let mut timers = RoomTimers::new(Duration::from_secs(1));
        timers.start_turn_clock();
        timers.arm_zap(Duration::from_secs(3));
        timers.clear();
        assert!(!timers.turn_clock_running());
        assert!(!timers.zap_armed());
    }
}
