//! Move validation and state mutation.
//!
//! Every function here takes the room's `&mut GameState`, checks the full
//! precondition set for one intent, and either mutates-and-commits or
//! returns a [`MoveError`] leaving the state untouched. The room actor is
//! the only caller, so these run strictly serialized.
//!
//! A rejected move never bumps `state_version`; an accepted one bumps it
//! by exactly one. Any accepted move closes an open ZAP window before the
//! engine broadcasts it, so a successful `zap` always refers to the move
//! immediately prior.

use duotaire_cards::rules::{
    can_place_on_center, can_place_on_foundation, can_place_on_opponent_discard,
    is_descending_alternating,
};
use duotaire_cards::Card;
use duotaire_protocol::{
    LastMove, MoveKind, RoomPhase, Seat, SourceKind, TargetKind,
};
// The tokio clock, not the wall clock: `ZapWindow.deadline` must live on
// the same clock that fires the expiry event.
use tokio::time::Instant;

use crate::state::{GameState, ZapWindow, CENTER_PILES, FOUNDATIONS};
use crate::RoomConfig;

/// Why a game action was rejected. The message text goes to the client as
/// an `error` frame; the state is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("game is not in progress")]
    NotPlaying,
    #[error("not your turn")]
    NotYourTurn,
    #[error("a card is already at play")]
    AlreadyDrawn,
    #[error("no cards")]
    NoCards,
    #[error("no card at play")]
    NoDrawnCard,
    #[error("source pile is empty")]
    EmptySource,
    #[error("pile index out of range")]
    BadIndex,
    #[error("that card cannot go there")]
    IllegalPlacement,
    #[error("opponent's discard is empty")]
    OpponentDiscardEmpty,
    #[error("only the drawn card can go to your own discard")]
    DiscardRequiresDrawn,
    #[error("sequence must move between two different piles")]
    SamePile,
    #[error("selected cards are not a movable run")]
    NotARun,
    #[error("no zap window is open")]
    NoZapWindow,
    #[error("you cannot zap your own move")]
    CannotZapSelf,
}

/// Result of an accepted draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOutcome {
    pub card: Card,
    pub deck_size: usize,
    /// Whether the discard was recycled into the deck first.
    pub recycled: bool,
}

/// Result of an accepted play or sequence move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayOutcome {
    pub kind: MoveKind,
    pub card: Card,
    /// A fresh ZAP window was opened (foundation play, game not won).
    pub zap_opened: bool,
    /// The turn passed to the opponent (`ownDiscard` only).
    pub turn_ended: bool,
    /// All four foundations are complete; the mover wins.
    pub finished: bool,
}

/// Result of an accepted zap challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZapOutcome {
    /// Cards the zapped player took back from their discard.
    pub reclaimed: usize,
    pub zapped: Seat,
}

fn ensure_turn(state: &GameState, seat: Seat) -> Result<(), MoveError> {
    if state.phase != RoomPhase::Playing {
        return Err(MoveError::NotPlaying);
    }
    if seat != state.current {
        return Err(MoveError::NotYourTurn);
    }
    Ok(())
}

fn close_zap(state: &mut GameState) {
    state.zap = None;
}

/// `draw_card`: pop the sender's deck top into the drawn slot.
///
/// When the deck is empty and the discard holds at least two cards, the
/// discard below the current top is recycled: reversed into the deck so
/// the earliest-discarded card is drawn next. A discard of one or zero
/// cards means the draw fails with "no cards".
pub fn draw_card(
    state: &mut GameState,
    seat: Seat,
) -> Result<DrawOutcome, MoveError> {
    ensure_turn(state, seat)?;
    if state.drawn_card.is_some() {
        return Err(MoveError::AlreadyDrawn);
    }

    let player = state.player_mut(seat);
    let mut recycled = false;
    if player.deck.is_empty() {
        if player.discard.len() < 2 {
            return Err(MoveError::NoCards);
        }
        let top = player.discard.pop().expect("discard has >= 2 cards");
        let mut rest = std::mem::take(&mut player.discard);
        rest.reverse();
        player.deck = rest;
        player.discard.push(top);
        recycled = true;
    }

    let card = player.deck.pop().expect("deck non-empty after recycle");
    let deck_size = player.deck.len();
    state.drawn_card = Some(card);

    close_zap(state);
    state.commit(Some(LastMove {
        kind: MoveKind::Draw,
        // The drawn card is secret from the opponent.
        card: None,
        player_index: seat.index(),
    }));

    Ok(DrawOutcome {
        card,
        deck_size,
        recycled,
    })
}

/// `play_card`: move one card from the drawn slot or a center-pile top to
/// a foundation, center pile, the opponent's discard, or — the turn-ending
/// move — the sender's own discard.
pub fn play_card(
    state: &mut GameState,
    seat: Seat,
    from_type: SourceKind,
    from_index: usize,
    to_type: TargetKind,
    to_index: usize,
    now: Instant,
    config: &RoomConfig,
) -> Result<PlayOutcome, MoveError> {
    ensure_turn(state, seat)?;

    // Identify the source card without removing it yet — the destination
    // check must leave a rejected state untouched.
    let card = match from_type {
        SourceKind::Drawn => state.drawn_card.ok_or(MoveError::NoDrawnCard)?,
        SourceKind::Center => {
            if from_index >= CENTER_PILES {
                return Err(MoveError::BadIndex);
            }
            *state.center_piles[from_index]
                .last()
                .ok_or(MoveError::EmptySource)?
        }
    };

    // Validate the destination.
    match to_type {
        TargetKind::Foundation => {
            if to_index >= FOUNDATIONS {
                return Err(MoveError::BadIndex);
            }
            let foundation = &state.foundations[to_index];
            if !can_place_on_foundation(card, foundation.suit, foundation.top()) {
                return Err(MoveError::IllegalPlacement);
            }
        }
        TargetKind::Center => {
            if to_index >= CENTER_PILES {
                return Err(MoveError::BadIndex);
            }
            let top = state.center_piles[to_index].last().copied();
            if !can_place_on_center(card, top) {
                return Err(MoveError::IllegalPlacement);
            }
        }
        TargetKind::OpponentDiscard => {
            let top = state
                .player(seat.opponent())
                .discard
                .last()
                .copied()
                .ok_or(MoveError::OpponentDiscardEmpty)?;
            if !can_place_on_opponent_discard(card, top) {
                return Err(MoveError::IllegalPlacement);
            }
        }
        TargetKind::OwnDiscard => {
            if from_type != SourceKind::Drawn {
                return Err(MoveError::DiscardRequiresDrawn);
            }
        }
    }

    // All checks passed: remove from the source...
    match from_type {
        SourceKind::Drawn => state.drawn_card = None,
        SourceKind::Center => {
            state.center_piles[from_index].pop();
        }
    }

    // ...apply to the destination. Any accepted move closes the previous
    // ZAP window before anything is broadcast.
    close_zap(state);
    let mut turn_ended = false;
    let kind = match to_type {
        TargetKind::Foundation => {
            state.foundations[to_index].cards.push(card);
            state.has_moved_this_turn = true;
            MoveKind::FoundationPlay
        }
        TargetKind::Center => {
            state.center_piles[to_index].push(card);
            state.has_moved_this_turn = true;
            MoveKind::CenterPlay
        }
        TargetKind::OpponentDiscard => {
            let opponent = seat.opponent();
            state.player_mut(opponent).discard.push(card);
            state.has_moved_this_turn = true;
            MoveKind::OpponentDiscardPlay
        }
        TargetKind::OwnDiscard => {
            state.player_mut(seat).discard.push(card);
            state.has_moved_this_turn = false;
            state.current = seat.opponent();
            state.turn_started_at = now;
            turn_ended = true;
            MoveKind::TurnEndDiscard
        }
    };

    // Win detection precedes the ZAP window: a game-winning foundation
    // play leaves nothing to challenge.
    let finished = state.check_all_foundations_complete();
    let mut zap_opened = false;
    if finished {
        state.phase = RoomPhase::Finished;
        state.winner = Some(seat);
    } else if kind == MoveKind::FoundationPlay {
        state.zap = Some(ZapWindow {
            deadline: now + config.zap_window,
        });
        zap_opened = true;
    }

    state.commit(Some(LastMove {
        kind,
        card: Some(card),
        player_index: seat.index(),
    }));

    Ok(PlayOutcome {
        kind,
        card,
        zap_opened,
        turn_ended,
        finished,
    })
}

/// `sequence_move`: splice a descending, color-alternating run from one
/// center pile onto another.
pub fn sequence_move(
    state: &mut GameState,
    seat: Seat,
    from_center: usize,
    from_card_index: usize,
    to_center: usize,
) -> Result<PlayOutcome, MoveError> {
    ensure_turn(state, seat)?;
    if from_center >= CENTER_PILES || to_center >= CENTER_PILES {
        return Err(MoveError::BadIndex);
    }
    if from_center == to_center {
        return Err(MoveError::SamePile);
    }
    let pile = &state.center_piles[from_center];
    if from_card_index >= pile.len() {
        return Err(MoveError::BadIndex);
    }
    let run = &pile[from_card_index..];
    if !is_descending_alternating(run) {
        return Err(MoveError::NotARun);
    }
    let bottom = run[0];
    let destination_top = state.center_piles[to_center].last().copied();
    if !can_place_on_center(bottom, destination_top) {
        return Err(MoveError::IllegalPlacement);
    }

    let moved = state.center_piles[from_center].split_off(from_card_index);
    state.center_piles[to_center].extend(moved);
    state.has_moved_this_turn = true;

    close_zap(state);
    state.commit(Some(LastMove {
        kind: MoveKind::SequenceMove,
        card: Some(bottom),
        player_index: seat.index(),
    }));

    Ok(PlayOutcome {
        kind: MoveKind::SequenceMove,
        card: bottom,
        zap_opened: false,
        turn_ended: false,
        finished: false,
    })
}

/// `zap`: the opponent challenges the foundation play that opened the
/// current window.
///
/// Penalty ("discard reclaim"): the zapped player — the current player
/// whose play was challenged — takes the top `zap_penalty_cards` of their
/// own discard back onto the top of their deck.
pub fn zap(
    state: &mut GameState,
    seat: Seat,
    now: Instant,
    config: &RoomConfig,
) -> Result<ZapOutcome, MoveError> {
    if state.phase != RoomPhase::Playing {
        return Err(MoveError::NotPlaying);
    }
    let window = state.zap.ok_or(MoveError::NoZapWindow)?;
    if seat == state.current {
        return Err(MoveError::CannotZapSelf);
    }
    if now >= window.deadline {
        // The expiry intent is already in flight; treat the race as closed.
        state.zap = None;
        return Err(MoveError::NoZapWindow);
    }

    state.zap = None;
    let zapped = state.current;
    let challenged = match &state.last_move {
        Some(last) if last.kind == MoveKind::FoundationPlay => last.card,
        _ => None,
    };

    let player = state.player_mut(zapped);
    let reclaimed = config.zap_penalty_cards.min(player.discard.len());
    for _ in 0..reclaimed {
        let card = player.discard.pop().expect("bounded by discard length");
        player.deck.push(card);
    }

    state.commit(Some(LastMove {
        kind: MoveKind::Zap,
        card: challenged,
        player_index: seat.index(),
    }));

    Ok(ZapOutcome { reclaimed, zapped })
}

/// Timer intent: the ZAP window expired untouched. Returns whether state
/// changed (and was committed).
pub fn expire_zap(state: &mut GameState) -> bool {
    if state.zap.take().is_some() {
        state.commit(None);
        true
    } else {
        false
    }
}

/// Timer intent: one turn-clock period elapsed. Accrues play time to the
/// current player. Not a game mutation — no version bump.
pub fn tick_turn_clock(state: &mut GameState) {
    if state.phase == RoomPhase::Playing {
        let current = state.current;
        state.player_mut(current).timer_secs += 1;
    }
}
