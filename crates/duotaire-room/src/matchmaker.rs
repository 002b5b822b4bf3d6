//! Matchmaking: one FIFO queue of connections waiting for a random
//! opponent.
//!
//! The queue is guarded by a single server-level mutex with O(1)-ish
//! critical sections, same discipline as the registry. Entries carry the
//! waiter's outbound channel so pairing can tell whether the waiter is
//! still alive (a closed channel means the connection is gone) and so the
//! pairer can deliver `room_created` on the waiter's behalf.
//!
//! The payload type is the caller's: the server threads its per-connection
//! slot through it so the requester's handler can bind the waiter to the
//! new room.

use std::collections::VecDeque;

use duotaire_protocol::SessionId;

use crate::engine::PlayerSender;

/// One queued connection plus the caller's context for it.
pub struct Waiter<T> {
    pub session: SessionId,
    pub sender: PlayerSender,
    pub payload: T,
}

/// FIFO matchmaking queue.
pub struct Matchmaker<T> {
    queue: VecDeque<Waiter<T>>,
}

impl<T> Matchmaker<T> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Appends a waiter and returns their 1-based queue position.
    pub fn enqueue(
        &mut self,
        session: SessionId,
        sender: PlayerSender,
        payload: T,
    ) -> usize {
        self.queue.push_back(Waiter {
            session,
            sender,
            payload,
        });
        tracing::debug!(%session, depth = self.queue.len(), "waiter enqueued");
        self.queue.len()
    }

    /// Dequeues the oldest still-connected waiter for `requester`.
    ///
    /// Dead entries (closed outbound channel) and any stale entry for the
    /// requester itself are dropped along the way.
    pub fn take_partner(&mut self, requester: SessionId) -> Option<Waiter<T>> {
        while let Some(waiter) = self.queue.pop_front() {
            if waiter.session == requester {
                continue;
            }
            if waiter.sender.is_closed() {
                tracing::debug!(
                    session = %waiter.session,
                    "skipping dead matchmaking entry"
                );
                continue;
            }
            return Some(waiter);
        }
        None
    }

    /// Removes a session's entry (cancel, or disconnect while queued).
    pub fn remove(&mut self, session: SessionId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|w| w.session != session);
        before != self.queue.len()
    }

    pub fn contains(&self, session: SessionId) -> bool {
        self.queue.iter().any(|w| w.session == session)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> Default for Matchmaker<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn sid(id: u64) -> SessionId {
        SessionId(id)
    }

    /// A live sender (receiver kept) for queue-aliveness tests.
    fn live_sender() -> (PlayerSender, mpsc::UnboundedReceiver<duotaire_protocol::ServerMessage>)
    {
        mpsc::unbounded_channel()
    }

    /// A dead sender: its receiver is dropped immediately.
    fn dead_sender() -> PlayerSender {
        let (tx, _) = mpsc::unbounded_channel();
        tx
    }

    #[test]
    fn test_enqueue_reports_one_based_position() {
        let mut mm = Matchmaker::new();
        let (tx1, _rx1) = live_sender();
        let (tx2, _rx2) = live_sender();
        assert_eq!(mm.enqueue(sid(1), tx1, ()), 1);
        assert_eq!(mm.enqueue(sid(2), tx2, ()), 2);
    }

    #[test]
    fn test_take_partner_is_fifo() {
        let mut mm = Matchmaker::new();
        let (tx1, _rx1) = live_sender();
        let (tx2, _rx2) = live_sender();
        mm.enqueue(sid(1), tx1, "first");
        mm.enqueue(sid(2), tx2, "second");

        let partner = mm.take_partner(sid(9)).expect("queue non-empty");
        assert_eq!(partner.session, sid(1));
        assert_eq!(partner.payload, "first");
        assert_eq!(mm.len(), 1);
    }

    #[test]
    fn test_take_partner_skips_dead_waiters() {
        let mut mm = Matchmaker::new();
        mm.enqueue(sid(1), dead_sender(), ());
        let (tx2, _rx2) = live_sender();
        mm.enqueue(sid(2), tx2, ());

        let partner = mm.take_partner(sid(9)).expect("live waiter exists");
        assert_eq!(partner.session, sid(2));
        assert!(mm.is_empty(), "dead entry was discarded");
    }

    #[test]
    fn test_take_partner_never_pairs_requester_with_itself() {
        let mut mm = Matchmaker::new();
        let (tx, _rx) = live_sender();
        mm.enqueue(sid(1), tx, ());

        assert!(mm.take_partner(sid(1)).is_none());
        assert!(!mm.contains(sid(1)), "own stale entry dropped");
    }

    #[test]
    fn test_remove_cancels_a_queued_entry() {
        let mut mm = Matchmaker::new();
        let (tx, _rx) = live_sender();
        mm.enqueue(sid(1), tx, ());

        assert!(mm.remove(sid(1)));
        assert!(!mm.remove(sid(1)), "second remove is a no-op");
        assert!(mm.is_empty());
    }

    #[test]
    fn test_all_dead_queue_yields_no_partner() {
        let mut mm = Matchmaker::new();
        mm.enqueue(sid(1), dead_sender(), ());
        mm.enqueue(sid(2), dead_sender(), ());
        assert!(mm.take_partner(sid(9)).is_none());
        assert!(mm.is_empty());
    }
}
