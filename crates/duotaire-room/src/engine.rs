//! Room actor: an isolated Tokio task that owns one game.
//!
//! Each room runs in its own task and is a single-consumer serialization
//! domain: every mutation — client intent, timer firing, disconnect —
//! arrives as a message on one channel and is applied serially. Broadcasts
//! happen inside the same critical section as the mutation, so no client
//! ever observes an intermediate state.

use std::time::Duration;

use duotaire_protocol::{
    GameIntent, GameMode, LastMove, RoomCode, RoomPhase, Seat, ServerMessage,
    SessionId,
};
use duotaire_timer::{RoomTimers, TimerEvent};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::rules;
use crate::state::GameState;
use crate::{RoomConfig, RoomError};

/// Channel sender for delivering outbound messages to one seat.
///
/// Unbounded on purpose: the engine must never lose a `game_over` or the
/// initial `game_started` snapshot to back-pressure; the writer pump on
/// the connection side drains it.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// What a leaver (or their handler) learns from the room.
#[derive(Debug, Clone, Copy)]
pub struct LeaveInfo {
    /// The session actually held a seat here.
    pub was_member: bool,
    /// The room shut down as a consequence; the caller should drop it
    /// from the registry.
    pub disposed: bool,
}

/// Registry-facing room metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct RoomStatus {
    pub code: RoomCode,
    pub mode: GameMode,
    pub phase: RoomPhase,
    pub player_count: usize,
    /// Whether seat 1 was ever filled — stale-waiting-room sweep keys on
    /// this staying false.
    pub guest_ever_seated: bool,
    pub age: Duration,
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        session: SessionId,
        name: Option<String>,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<Seat, RoomError>>,
    },
    Leave {
        session: SessionId,
        reply: oneshot::Sender<LeaveInfo>,
    },
    Intent {
        session: SessionId,
        intent: GameIntent,
    },
    Status {
        reply: oneshot::Sender<RoomStatus>,
    },
    Dispose,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// True once the actor has stopped; late sends become no-ops.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Seats a session. On the second join the room deals and starts.
    pub async fn join(
        &self,
        session: SessionId,
        name: Option<String>,
        sender: PlayerSender,
    ) -> Result<Seat, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                session,
                name,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Delivers a leave/disconnect. A disposed room reports a no-op.
    pub async fn leave(&self, session: SessionId) -> LeaveInfo {
        let (reply_tx, reply_rx) = oneshot::channel();
        let sent = self
            .sender
            .send(RoomCommand::Leave {
                session,
                reply: reply_tx,
            })
            .await;
        if sent.is_err() {
            return LeaveInfo {
                was_member: false,
                disposed: true,
            };
        }
        reply_rx.await.unwrap_or(LeaveInfo {
            was_member: false,
            disposed: true,
        })
    }

    /// Queues a game intent (fire-and-forget).
    pub async fn intent(
        &self,
        session: SessionId,
        intent: GameIntent,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Intent { session, intent })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Fetches room metadata for listings and the sweep.
    pub async fn status(&self) -> Result<RoomStatus, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Status { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Tells the room to shut down (sweep, fatal cleanup).
    pub async fn dispose(&self) {
        let _ = self.sender.send(RoomCommand::Dispose).await;
    }
}

enum Flow {
    Continue,
    Stop,
}

/// The internal room actor. Runs inside a Tokio task until disposed.
struct RoomActor {
    state: GameState,
    config: RoomConfig,
    rng: StdRng,
    timers: RoomTimers,
    senders: [Option<PlayerSender>; 2],
    receiver: mpsc::Receiver<RoomCommand>,
    guest_ever_seated: bool,
    /// Birth instant; drives the stale-room sweep.
    spawned_at: Instant,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room = %self.state.code, "room actor started");

        loop {
            let flow = tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => Flow::Stop,
                },
                event = self.timers.next_event() => self.handle_timer(event),
            };
            if matches!(flow, Flow::Stop) {
                break;
            }
        }

        self.timers.clear();
        tracing::info!(room = %self.state.code, "room actor stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) -> Flow {
        match cmd {
            RoomCommand::Join {
                session,
                name,
                sender,
                reply,
            } => {
                let result = self.handle_join(session, name, sender);
                let _ = reply.send(result);
                Flow::Continue
            }
            RoomCommand::Leave { session, reply } => {
                let (info, flow) = self.handle_leave(session);
                let _ = reply.send(info);
                flow
            }
            RoomCommand::Intent { session, intent } => {
                self.handle_intent(session, intent)
            }
            RoomCommand::Status { reply } => {
                let _ = reply.send(self.status());
                Flow::Continue
            }
            RoomCommand::Dispose => {
                tracing::info!(room = %self.state.code, "room disposed");
                Flow::Stop
            }
        }
    }

    fn handle_join(
        &mut self,
        session: SessionId,
        name: Option<String>,
        sender: PlayerSender,
    ) -> Result<Seat, RoomError> {
        // A retransmitted join from a seated session is idempotent.
        if let Some(seat) = self.state.seat_of(session) {
            return Ok(seat);
        }
        match self.state.phase {
            RoomPhase::Waiting => {}
            RoomPhase::Playing => {
                return Err(RoomError::GameInProgress(self.state.code.clone()))
            }
            RoomPhase::Finished => {
                return Err(RoomError::Unavailable(self.state.code.clone()))
            }
        }

        let seat = if self.state.player(Seat::Host).session.is_none() {
            Seat::Host
        } else if self.state.player(Seat::Guest).session.is_none() {
            Seat::Guest
        } else {
            return Err(RoomError::RoomFull(self.state.code.clone()));
        };

        {
            let player = self.state.player_mut(seat);
            player.session = Some(session);
            player.connected = true;
            if let Some(name) = name {
                player.name = name;
            }
        }
        self.senders[seat.index() as usize] = Some(sender);

        tracing::info!(
            room = %self.state.code,
            %session,
            %seat,
            "player joined"
        );

        match seat {
            Seat::Host => {
                self.send_to(
                    Seat::Host,
                    ServerMessage::RoomCreated {
                        room_code: self.state.code.as_str().to_string(),
                        player_id: Seat::Host.index(),
                    },
                );
            }
            Seat::Guest => {
                self.guest_ever_seated = true;
                self.send_to(
                    Seat::Guest,
                    ServerMessage::RoomJoined {
                        room_code: self.state.code.as_str().to_string(),
                        player_id: Seat::Guest.index(),
                    },
                );
                self.start_game(seat);
            }
        }

        Ok(seat)
    }

    /// Second join: deal, announce, start the turn clock.
    fn start_game(&mut self, joined: Seat) {
        self.state.deal(&mut self.rng);
        self.timers.start_turn_clock();

        let announcement = ServerMessage::PlayerJoined {
            player_id: joined.index(),
        };
        for seat in Seat::BOTH {
            self.send_to(seat, announcement.clone());
        }
        for seat in Seat::BOTH {
            let snapshot = self.state.snapshot_for(seat);
            self.send_to(seat, ServerMessage::GameStarted { state: snapshot });
        }
        tracing::info!(room = %self.state.code, "game started");
    }

    fn handle_leave(&mut self, session: SessionId) -> (LeaveInfo, Flow) {
        let Some(seat) = self.state.seat_of(session) else {
            return (
                LeaveInfo {
                    was_member: false,
                    disposed: false,
                },
                Flow::Continue,
            );
        };

        {
            let player = self.state.player_mut(seat);
            player.session = None;
            player.connected = false;
        }
        self.senders[seat.index() as usize] = None;

        tracing::info!(room = %self.state.code, %session, %seat, "player left");

        let remaining = seat.opponent();
        self.send_to(
            remaining,
            ServerMessage::PlayerLeft {
                player_id: seat.index(),
            },
        );

        let disposed = match self.state.phase {
            // Waiting rooms only ever hold the host; their leave kills it.
            RoomPhase::Waiting => true,
            RoomPhase::Playing => {
                self.forfeit(remaining);
                !self.state.player(remaining).connected
            }
            RoomPhase::Finished => {
                !self.state.player(remaining).connected
            }
        };

        let flow = if disposed { Flow::Stop } else { Flow::Continue };
        (
            LeaveInfo {
                was_member: true,
                disposed,
            },
            flow,
        )
    }

    /// Opponent disconnect during play: the remaining seat wins.
    fn forfeit(&mut self, winner: Seat) {
        self.state.phase = RoomPhase::Finished;
        self.state.winner = Some(winner);
        self.state.zap = None;
        self.state.commit(None);
        self.timers.clear();

        self.send_to(
            winner,
            ServerMessage::GameOver {
                winner: winner.index() as i8,
                reason: "Opponent disconnected".into(),
            },
        );
        tracing::info!(
            room = %self.state.code,
            %winner,
            "game forfeited on disconnect"
        );
    }

    fn handle_intent(&mut self, session: SessionId, intent: GameIntent) -> Flow {
        let Some(seat) = self.state.seat_of(session) else {
            tracing::warn!(
                room = %self.state.code,
                %session,
                "intent from non-member, ignoring"
            );
            return Flow::Continue;
        };

        match intent {
            GameIntent::RequestState => {
                // Read-only: forces a full snapshot to the requester.
                let snapshot = self.state.snapshot_for(seat);
                self.send_to(
                    seat,
                    ServerMessage::StateUpdate {
                        state: snapshot,
                        last_move: self.state.last_move.clone(),
                    },
                );
                return Flow::Continue;
            }
            GameIntent::DrawCard => match rules::draw_card(&mut self.state, seat) {
                Ok(outcome) => {
                    self.timers.disarm_zap();
                    self.send_to(
                        seat,
                        ServerMessage::CardDrawn {
                            card: outcome.card,
                            deck_size: outcome.deck_size,
                        },
                    );
                    self.send_to(
                        seat.opponent(),
                        ServerMessage::OpponentDrew {
                            player_index: seat.index(),
                            deck_size: outcome.deck_size,
                        },
                    );
                    self.broadcast_state(self.state.last_move.clone());
                }
                Err(e) => {
                    self.reject(seat, e);
                    return Flow::Continue;
                }
            },
            GameIntent::PlayCard {
                from_type,
                from_index,
                to_type,
                to_index,
            } => {
                match rules::play_card(
                    &mut self.state,
                    seat,
                    from_type,
                    from_index,
                    to_type,
                    to_index,
                    Instant::now(),
                    &self.config,
                ) {
                    Ok(outcome) => {
                        self.timers.disarm_zap();
                        if outcome.zap_opened {
                            self.timers.arm_zap(self.config.zap_window);
                        }
                        self.broadcast_state(self.state.last_move.clone());
                        if outcome.finished {
                            self.finish_by_win(seat);
                        }
                    }
                    Err(e) => {
                        self.reject(seat, e);
                        return Flow::Continue;
                    }
                }
            }
            GameIntent::SequenceMove {
                from_center,
                from_card_index,
                to_center,
            } => {
                match rules::sequence_move(
                    &mut self.state,
                    seat,
                    from_center,
                    from_card_index,
                    to_center,
                ) {
                    Ok(_) => {
                        self.timers.disarm_zap();
                        self.broadcast_state(self.state.last_move.clone());
                    }
                    Err(e) => {
                        self.reject(seat, e);
                        return Flow::Continue;
                    }
                }
            }
            GameIntent::Zap => {
                match rules::zap(
                    &mut self.state,
                    seat,
                    Instant::now(),
                    &self.config,
                ) {
                    Ok(outcome) => {
                        self.timers.disarm_zap();
                        tracing::debug!(
                            room = %self.state.code,
                            zapped = %outcome.zapped,
                            reclaimed = outcome.reclaimed,
                            "zap landed"
                        );
                        self.broadcast_state(self.state.last_move.clone());
                    }
                    Err(e) => {
                        self.reject(seat, e);
                        return Flow::Continue;
                    }
                }
            }
        }

        // A mutation was accepted above; the conservation invariant must
        // still hold or this room is corrupt and halts.
        if !self.state.verify_card_conservation() {
            tracing::error!(
                room = %self.state.code,
                "card conservation violated, halting room"
            );
            let message = ServerMessage::Error {
                message: "internal error: room state corrupted".into(),
            };
            for seat in Seat::BOTH {
                self.send_to(seat, message.clone());
            }
            return Flow::Stop;
        }
        Flow::Continue
    }

    fn handle_timer(&mut self, event: TimerEvent) -> Flow {
        match event {
            TimerEvent::TurnTick => {
                rules::tick_turn_clock(&mut self.state);
            }
            TimerEvent::ZapExpired => {
                if rules::expire_zap(&mut self.state) {
                    // Administrative bump: clients learn the window closed.
                    self.broadcast_state(None);
                }
            }
        }
        Flow::Continue
    }

    fn finish_by_win(&mut self, winner: Seat) {
        self.timers.clear();
        let message = ServerMessage::GameOver {
            winner: winner.index() as i8,
            reason: "All foundations complete".into(),
        };
        for seat in Seat::BOTH {
            self.send_to(seat, message.clone());
        }
        tracing::info!(room = %self.state.code, %winner, "game won");
    }

    fn reject(&self, seat: Seat, error: rules::MoveError) {
        tracing::debug!(
            room = %self.state.code,
            %seat,
            %error,
            "intent rejected"
        );
        self.send_to(
            seat,
            ServerMessage::Error {
                message: error.to_string(),
            },
        );
    }

    /// Per-seat state broadcast, inside the mutation's critical section.
    fn broadcast_state(&self, last_move: Option<LastMove>) {
        for seat in Seat::BOTH {
            let snapshot = self.state.snapshot_for(seat);
            self.send_to(
                seat,
                ServerMessage::StateUpdate {
                    state: snapshot,
                    last_move: last_move.clone(),
                },
            );
        }
    }

    /// Sends to one seat. Silently drops if the receiver is gone.
    fn send_to(&self, seat: Seat, message: ServerMessage) {
        if let Some(sender) = &self.senders[seat.index() as usize] {
            let _ = sender.send(message);
        }
    }

    fn status(&self) -> RoomStatus {
        RoomStatus {
            code: self.state.code.clone(),
            mode: self.state.mode,
            phase: self.state.phase,
            player_count: Seat::BOTH
                .into_iter()
                .filter(|&s| self.state.player(s).session.is_some())
                .count(),
            guest_ever_seated: self.guest_ever_seated,
            age: self.spawned_at.elapsed(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
pub(crate) fn spawn_room(
    code: RoomCode,
    mode: GameMode,
    config: RoomConfig,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.intent_channel_size);

    let rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let timers = RoomTimers::new(config.turn_clock_period);

    let actor = RoomActor {
        state: GameState::new(code.clone(), mode),
        config,
        rng,
        timers,
        senders: [None, None],
        receiver: rx,
        guest_ever_seated: false,
        spawned_at: Instant::now(),
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
