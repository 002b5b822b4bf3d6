//! Room state: a pure data container with typed accessors.
//!
//! No validation lives here. Every mutation is driven by [`crate::rules`]
//! and linearized by the room actor, which is the only task that ever
//! holds a `&mut GameState`.

use std::collections::VecDeque;

use duotaire_cards::{shuffled_deck, Card, Suit, NUM_RANKS};
use duotaire_protocol::{
    FoundationView, GameMode, LastMove, PlayerView, RoomCode, RoomPhase,
    RoomSnapshot, Seat, SessionId,
};
use rand::rngs::StdRng;
use tokio::time::Instant;

/// Number of shared center piles.
pub const CENTER_PILES: usize = 5;
/// Number of suit-locked foundations.
pub const FOUNDATIONS: usize = 4;
/// Cards dealt to each center pile.
pub const CENTER_DEAL: usize = 2;
/// How many delta entries the room retains for `deltas_since`.
const DELTA_LOG_CAP: usize = 32;

/// One seat's per-player record.
#[derive(Debug, Clone)]
pub struct PlayerState {
    /// Transport handle bound to this seat, while connected.
    pub session: Option<SessionId>,
    pub name: String,
    pub connected: bool,
    /// Accumulated play time in whole seconds (turn clock, ~1 Hz).
    pub timer_secs: u64,
    /// Face-down draw pile, top = last.
    pub deck: Vec<Card>,
    /// Face-up discard, top = last.
    pub discard: Vec<Card>,
}

impl PlayerState {
    fn empty(name: String) -> Self {
        Self {
            session: None,
            name,
            connected: false,
            timer_secs: 0,
            deck: Vec::new(),
            discard: Vec::new(),
        }
    }
}

/// One suit-locked foundation stack.
#[derive(Debug, Clone)]
pub struct Foundation {
    pub suit: Suit,
    pub cards: Vec<Card>,
}

impl Foundation {
    pub fn top(&self) -> Option<Card> {
        self.cards.last().copied()
    }

    /// Complete when it holds A..K of its suit.
    pub fn is_complete(&self) -> bool {
        self.cards.len() == NUM_RANKS
    }
}

/// An open ZAP grace window. `zapActive` is simply "a window exists";
/// the room actor's timer closes it at the deadline.
///
/// The deadline lives on the tokio clock — the same clock that fires the
/// expiry event — so deadline checks and timer firings can never disagree,
/// and both follow `tokio::time::pause` in tests.
#[derive(Debug, Clone, Copy)]
pub struct ZapWindow {
    pub deadline: Instant,
}

/// One ordered entry of the delta view. `last_move` is `None` for
/// administrative bumps (ZAP-window expiry).
#[derive(Debug, Clone)]
pub struct DeltaEntry {
    pub version: u64,
    pub last_move: Option<LastMove>,
}

/// The complete authoritative state of one room.
#[derive(Debug)]
pub struct GameState {
    pub code: RoomCode,
    pub mode: GameMode,
    pub phase: RoomPhase,
    pub current: Seat,
    pub winner: Option<Seat>,
    /// The single card at play, conceptually owned by `current`.
    pub drawn_card: Option<Card>,
    pub has_moved_this_turn: bool,
    pub zap: Option<ZapWindow>,
    pub last_move: Option<LastMove>,
    pub turn_started_at: Instant,
    pub state_version: u64,
    pub center_piles: [Vec<Card>; CENTER_PILES],
    pub foundations: [Foundation; FOUNDATIONS],
    players: [PlayerState; 2],
    deltas: VecDeque<DeltaEntry>,
}

impl GameState {
    /// A fresh room in the `waiting` phase. Piles stay empty until the
    /// second join triggers [`deal`](Self::deal).
    pub fn new(code: RoomCode, mode: GameMode) -> Self {
        Self {
            code,
            mode,
            phase: RoomPhase::Waiting,
            current: Seat::Host,
            winner: None,
            drawn_card: None,
            has_moved_this_turn: false,
            zap: None,
            last_move: None,
            turn_started_at: Instant::now(),
            state_version: 0,
            center_piles: Default::default(),
            foundations: Suit::ALL.map(|suit| Foundation {
                suit,
                cards: Vec::new(),
            }),
            players: [
                PlayerState::empty("Player 1".into()),
                PlayerState::empty("Player 2".into()),
            ],
            deltas: VecDeque::new(),
        }
    }

    // -- Accessors ---------------------------------------------------------

    pub fn player(&self, seat: Seat) -> &PlayerState {
        &self.players[seat.index() as usize]
    }

    pub fn player_mut(&mut self, seat: Seat) -> &mut PlayerState {
        &mut self.players[seat.index() as usize]
    }

    /// The seat bound to a session, if any.
    pub fn seat_of(&self, session: SessionId) -> Option<Seat> {
        Seat::BOTH
            .into_iter()
            .find(|&seat| self.player(seat).session == Some(session))
    }

    pub fn opponent_of_current(&self) -> &PlayerState {
        self.player(self.current.opponent())
    }

    pub fn zap_active(&self) -> bool {
        self.zap.is_some()
    }

    pub fn check_all_foundations_complete(&self) -> bool {
        self.foundations.iter().all(Foundation::is_complete)
    }

    // -- Mutation plumbing (called by rules and the engine only) -----------

    /// Increments `state_version` by exactly one.
    pub fn bump_version(&mut self) {
        self.state_version += 1;
    }

    /// Commits one accepted mutation: bumps the version and appends the
    /// matching delta entry. Every accepted mutation goes through here, so
    /// the delta log is dense in versions.
    pub(crate) fn commit(&mut self, last: Option<LastMove>) {
        self.bump_version();
        if last.is_some() {
            self.last_move = last.clone();
        }
        self.deltas.push_back(DeltaEntry {
            version: self.state_version,
            last_move: last,
        });
        while self.deltas.len() > DELTA_LOG_CAP {
            self.deltas.pop_front();
        }
    }

    /// Shuffles and deals: two cards to each of the five center piles,
    /// then 21 cards to each deck. Transitions to `playing` with the host
    /// to move.
    pub fn deal(&mut self, rng: &mut StdRng) {
        let mut deck = shuffled_deck(rng);
        for pile in self.center_piles.iter_mut() {
            for _ in 0..CENTER_DEAL {
                pile.push(deck.pop().expect("deck holds 52 cards"));
            }
        }
        let guest_deck = deck.split_off(deck.len() / 2);
        self.players[0].deck = deck;
        self.players[1].deck = guest_deck;

        self.phase = RoomPhase::Playing;
        self.current = Seat::Host;
        self.turn_started_at = Instant::now();
    }

    // -- Views -------------------------------------------------------------

    /// Full snapshot as seen by `viewer`: own drawn card visible, the
    /// opponent's absent, decks exposed by size only.
    pub fn snapshot_for(&self, viewer: Seat) -> RoomSnapshot {
        let players = Seat::BOTH
            .into_iter()
            .map(|seat| {
                let player = self.player(seat);
                PlayerView {
                    index: seat.index(),
                    name: player.name.clone(),
                    deck_size: player.deck.len(),
                    discard_pile: player.discard.clone(),
                    drawn_card: if seat == viewer && seat == self.current {
                        self.drawn_card
                    } else {
                        None
                    },
                }
            })
            .collect();

        RoomSnapshot {
            room_code: self.code.as_str().to_string(),
            phase: self.phase,
            current_player: self.current.index(),
            winner: self.winner.map(|s| s.index() as i8).unwrap_or(-1),
            state_version: self.state_version,
            players,
            center_piles: self.center_piles.iter().cloned().collect(),
            foundations: self
                .foundations
                .iter()
                .map(|f| FoundationView {
                    suit: f.suit,
                    cards: f.cards.clone(),
                })
                .collect(),
        }
    }

    /// The ordered deltas strictly after `version`, or `None` when the log
    /// no longer reaches back that far and the client must re-snapshot.
    pub fn deltas_since(&self, version: u64) -> Option<Vec<DeltaEntry>> {
        if version >= self.state_version {
            return Some(Vec::new());
        }
        match self.deltas.front() {
            Some(oldest) if oldest.version <= version + 1 => Some(
                self.deltas
                    .iter()
                    .filter(|e| e.version > version)
                    .cloned()
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Card conservation: every pile together must hold the canonical
    /// 52-card deck, each card exactly once. Checked by the engine after
    /// every accepted mutation; a violation is fatal for the room.
    pub fn verify_card_conservation(&self) -> bool {
        if self.phase == RoomPhase::Waiting {
            return true;
        }
        let mut seen = [false; 52];
        let mut count = 0usize;
        let mut mark = |card: &Card| {
            let idx = card.index();
            let duplicate = seen[idx];
            seen[idx] = true;
            count += 1;
            !duplicate
        };

        if let Some(card) = &self.drawn_card {
            if !mark(card) {
                return false;
            }
        }
        for player in &self.players {
            for card in player.deck.iter().chain(&player.discard) {
                if !mark(card) {
                    return false;
                }
            }
        }
        for pile in &self.center_piles {
            for card in pile {
                if !mark(card) {
                    return false;
                }
            }
        }
        for foundation in &self.foundations {
            for card in &foundation.cards {
                if !mark(card) {
                    return false;
                }
            }
        }
        count == 52
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn dealt_state() -> GameState {
        let mut state =
            GameState::new(RoomCode::normalize("ABCDEF"), GameMode::Private);
        state.deal(&mut StdRng::seed_from_u64(1));
        state
    }

    #[test]
    fn test_deal_shapes() {
        let state = dealt_state();
        assert_eq!(state.phase, RoomPhase::Playing);
        assert_eq!(state.current, Seat::Host);
        for pile in &state.center_piles {
            assert_eq!(pile.len(), CENTER_DEAL);
        }
        assert_eq!(state.player(Seat::Host).deck.len(), 21);
        assert_eq!(state.player(Seat::Guest).deck.len(), 21);
        assert!(state.verify_card_conservation());
    }

    #[test]
    fn test_deal_is_deterministic_under_seed() {
        let a = dealt_state();
        let b = dealt_state();
        assert_eq!(a.player(Seat::Host).deck, b.player(Seat::Host).deck);
        assert_eq!(a.center_piles, b.center_piles);
    }

    #[test]
    fn test_seat_of_matches_bound_sessions() {
        let mut state = dealt_state();
        state.player_mut(Seat::Host).session = Some(SessionId(10));
        state.player_mut(Seat::Guest).session = Some(SessionId(20));
        assert_eq!(state.seat_of(SessionId(10)), Some(Seat::Host));
        assert_eq!(state.seat_of(SessionId(20)), Some(Seat::Guest));
        assert_eq!(state.seat_of(SessionId(99)), None);
    }

    #[test]
    fn test_commit_bumps_version_by_exactly_one() {
        let mut state = dealt_state();
        let before = state.state_version;
        state.commit(None);
        assert_eq!(state.state_version, before + 1);
        state.commit(None);
        assert_eq!(state.state_version, before + 2);
    }

    #[test]
    fn test_snapshot_hides_opponent_drawn_card_and_decks() {
        let mut state = dealt_state();
        let card = state.player_mut(Seat::Host).deck.pop().unwrap();
        state.drawn_card = Some(card);

        let own = state.snapshot_for(Seat::Host);
        assert_eq!(own.players[0].drawn_card, Some(card));
        assert_eq!(own.players[0].deck_size, 20);
        assert!(own.players[0].discard_pile.is_empty());

        let theirs = state.snapshot_for(Seat::Guest);
        assert_eq!(theirs.players[0].drawn_card, None);
        assert_eq!(theirs.players[0].deck_size, 20);
    }

    #[test]
    fn test_snapshot_winner_is_minus_one_until_decided() {
        let mut state = dealt_state();
        assert_eq!(state.snapshot_for(Seat::Host).winner, -1);
        state.winner = Some(Seat::Guest);
        assert_eq!(state.snapshot_for(Seat::Host).winner, 1);
    }

    #[test]
    fn test_deltas_since_returns_contiguous_tail() {
        let mut state = dealt_state();
        for _ in 0..5 {
            state.commit(None);
        }
        let tail = state.deltas_since(2).expect("log covers version 2");
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].version, 3);
        assert_eq!(tail.last().unwrap().version, state.state_version);

        // Caught-up clients get an empty tail, not None.
        let caught_up = state.deltas_since(state.state_version).unwrap();
        assert!(caught_up.is_empty());
    }

    #[test]
    fn test_deltas_since_reports_gap_after_log_rollover() {
        let mut state = dealt_state();
        for _ in 0..40 {
            state.commit(None);
        }
        // Version 1 has long since rolled out of the 32-entry log.
        assert!(state.deltas_since(0).is_none());
        assert!(state.deltas_since(state.state_version - 5).is_some());
    }

    #[test]
    fn test_conservation_detects_duplicate_and_loss() {
        let mut state = dealt_state();
        assert!(state.verify_card_conservation());

        let card = state.player_mut(Seat::Host).deck.pop().unwrap();
        assert!(!state.verify_card_conservation(), "lost card must fail");

        state.player_mut(Seat::Host).deck.push(card);
        state.player_mut(Seat::Guest).discard.push(card);
        assert!(!state.verify_card_conservation(), "duplicate must fail");
    }

    #[test]
    fn test_foundation_complete_at_thirteen() {
        use duotaire_cards::Rank;
        let mut foundation = Foundation {
            suit: Suit::Spades,
            cards: Vec::new(),
        };
        assert!(!foundation.is_complete());
        for rank in Rank::ALL {
            foundation.cards.push(Card::new(Suit::Spades, rank));
        }
        assert!(foundation.is_complete());
    }
}
