//! Client-side mirror of the authoritative game.
//!
//! The mirror keeps two games:
//! - `confirmed`: exactly what the coordinator has acknowledged, up to the
//!   last contiguous sequence number
//! - `view`: `confirmed` plus every local move still awaiting confirmation
//!
//! A local move is validated against `view`, applied to it immediately and
//! queued as pending. Authoritative messages are applied to `confirmed`.
//! When the oldest pending move is echoed back it is simply dequeued. When
//! an authoritative message conflicts with the pending queue (a rejection,
//! a different move, or a full snapshot), `view` is rebuilt from
//! `confirmed` and the pending moves are replayed; the first one that no
//! longer validates is dropped together with everything queued after it.
//!
//! Like the rest of this crate the mirror does no I/O: it returns
//! [`MirrorAction`]s for the caller to execute.

use std::collections::VecDeque;

use box_types::{
    ClientMessage, Dot, DrawLine, ErrorCode, ErrorPayload, GameSnapshot, LineDrawn, Phase,
    PlayerNumber, RoomId, RoomJoined, Scores, Seat, Seq, ServerMessage, DEFAULT_GRID_SIZE,
};

use crate::{BoxCoord, Game, MoveError, MoveResult, SoundCue};

/// Instructions for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorAction {
    /// Send a message to the coordinator
    Send(ClientMessage),
    /// Hand an event to the presentation layer
    Emit(GameEvent),
}

/// Presentation-level events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Seated in a room
    Joined {
        /// Room id
        room_id: RoomId,
        /// Our seat
        player: PlayerNumber,
    },
    /// A line should be shown
    LineDrawn {
        /// First endpoint
        start: Dot,
        /// Second endpoint
        end: Dot,
        /// Owner
        player: PlayerNumber,
        /// True for a local move not yet confirmed
        speculative: bool,
    },
    /// A box should be filled
    BoxCompleted {
        /// Box row
        row: usize,
        /// Box column
        col: usize,
        /// Owner
        player: PlayerNumber,
    },
    /// Scores changed
    ScoreChanged(Scores),
    /// Player to move changed (or was re-stated)
    TurnChanged(PlayerNumber),
    /// The game ended
    GameEnded {
        /// `"Player 1"`, `"Player 2"` or `"Draw"`
        winner: String,
        /// Final scores
        scores: Scores,
    },
    /// Redraw everything from this snapshot
    Redraw(GameSnapshot),
    /// The coordinator rejected a request
    Rejected {
        /// Reason code
        code: ErrorCode,
        /// Text for the user
        message: String,
    },
}

impl GameEvent {
    /// Sound to play for this event.
    pub fn sound_cue(&self) -> Option<SoundCue> {
        match self {
            Self::LineDrawn { .. } => Some(SoundCue::LineDraw),
            Self::BoxCompleted { .. } => Some(SoundCue::BoxComplete),
            Self::GameEnded { .. } => Some(SoundCue::GameWin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingMove {
    start: Dot,
    end: Dot,
    player: PlayerNumber,
}

impl PendingMove {
    fn matches(&self, result: &MoveResult) -> bool {
        self.start == result.start && self.end == result.end && self.player == result.player
    }

    fn is_line(&self, line: &DrawLine) -> bool {
        let same_dots = (self.start == line.start && self.end == line.end)
            || (self.start == line.end && self.end == line.start);
        same_dots && self.player == line.player
    }
}

/// Speculating, reconciling copy of a room's game.
#[derive(Debug, Clone)]
pub struct Mirror {
    confirmed: Game,
    view: Game,
    pending: VecDeque<PendingMove>,
    seat: Option<PlayerNumber>,
    room: Option<RoomId>,
    players: Vec<Seat>,
}

impl Default for Mirror {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE)
    }
}

impl Mirror {
    /// An unseated mirror with an empty board.
    pub fn new(grid_size: usize) -> Self {
        let game = Game::new(grid_size);
        Self {
            confirmed: game.clone(),
            view: game,
            pending: VecDeque::new(),
            seat: None,
            room: None,
            players: Vec::new(),
        }
    }

    /// Our seat, once joined.
    pub fn seat(&self) -> Option<PlayerNumber> {
        self.seat
    }

    /// Our room, once joined.
    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    /// Game as shown to the player (confirmed plus speculation).
    pub fn view(&self) -> &Game {
        &self.view
    }

    /// Game as acknowledged by the coordinator.
    pub fn confirmed(&self) -> &Game {
        &self.confirmed
    }

    /// Number of local moves awaiting confirmation.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the local player may move now.
    pub fn can_move(&self) -> bool {
        self.seat.is_some_and(|seat| {
            self.view.phase() == Phase::Playing && self.view.current_player() == seat
        })
    }

    /// Snapshot of the view, with the last known seats.
    pub fn snapshot(&self) -> GameSnapshot {
        self.view.snapshot(self.players.clone())
    }

    /// Make a local move.
    ///
    /// On success the move is already visible in the view and the first
    /// action sends it to the coordinator. On failure nothing changes.
    pub fn propose(&mut self, start: Dot, end: Dot) -> Result<Vec<MirrorAction>, MoveError> {
        let player = self.seat.ok_or(MoveError::NotSeated)?;
        let result = self.view.apply_move(start, end, player)?;
        self.pending.push_back(PendingMove {
            start: result.start,
            end: result.end,
            player,
        });

        let mut actions = vec![MirrorAction::Send(ClientMessage::DrawLine(DrawLine {
            start,
            end,
            player,
        }))];
        actions.extend(move_events(&result, true).into_iter().map(MirrorAction::Emit));
        Ok(actions)
    }

    /// Withdraw the most recent local move, e.g. when it could not be sent.
    ///
    /// Returns false when nothing was pending.
    pub fn abandon_last(&mut self) -> bool {
        if self.pending.pop_back().is_none() {
            return false;
        }
        self.rebase();
        true
    }

    /// Apply one authoritative message.
    pub fn on_server(&mut self, message: ServerMessage) -> Vec<MirrorAction> {
        match message {
            ServerMessage::RoomJoined(joined) => self.on_joined(joined),
            ServerMessage::GameState(snapshot) => self.on_snapshot(snapshot),
            ServerMessage::LineDrawn(line) => self.on_line(line),
            ServerMessage::BoxCompleted(done) => {
                let owner = self
                    .confirmed
                    .board()
                    .box_owner(BoxCoord::new(done.row, done.col));
                if owner == Some(done.player) {
                    vec![]
                } else if done.seq > self.confirmed.seq() {
                    // Its lineDrawn was skipped as a gap; a resync is already on the way.
                    vec![]
                } else {
                    vec![request_state()]
                }
            }
            ServerMessage::GameEnded(ended) => {
                let mut actions = Vec::new();
                if self.confirmed.phase() != Phase::Finished {
                    actions.push(request_state());
                }
                actions.push(MirrorAction::Emit(GameEvent::GameEnded {
                    winner: ended.winner,
                    scores: ended.scores,
                }));
                actions
            }
            ServerMessage::Error(payload) => self.on_error(payload),
        }
    }

    fn on_joined(&mut self, joined: RoomJoined) -> Vec<MirrorAction> {
        let Ok(game) = Game::from_snapshot(&joined.game_state) else {
            return vec![request_state()];
        };
        self.seat = Some(joined.player_number);
        self.room = Some(joined.room_id.clone());
        self.players = joined.game_state.players;
        self.confirmed = game.clone();
        self.view = game;
        self.pending.clear();

        vec![
            MirrorAction::Emit(GameEvent::Joined {
                room_id: joined.room_id,
                player: joined.player_number,
            }),
            MirrorAction::Emit(GameEvent::Redraw(self.snapshot())),
        ]
    }

    fn on_snapshot(&mut self, snapshot: GameSnapshot) -> Vec<MirrorAction> {
        let Ok(game) = Game::from_snapshot(&snapshot) else {
            return vec![];
        };
        // A lower seq means the board was reset; old speculation is void.
        if snapshot.seq < self.confirmed.seq()
            || snapshot.grid_size != self.confirmed.board().grid_size()
        {
            self.pending.clear();
        }
        self.players = snapshot.players;
        self.confirmed = game;
        self.rebase();
        vec![MirrorAction::Emit(GameEvent::Redraw(self.snapshot()))]
    }

    fn on_line(&mut self, line: LineDrawn) -> Vec<MirrorAction> {
        let sequenced = line.seq != Seq::zero();
        if sequenced {
            if line.seq <= self.confirmed.seq() {
                return vec![];
            }
            if line.seq > self.confirmed.seq().next() {
                return vec![request_state()];
            }
        }

        let result = match self.confirmed.apply_move(line.start, line.end, line.player) {
            Ok(result) => result,
            Err(MoveError::EdgeAlreadyDrawn) if !sequenced => return vec![],
            Err(_) => return vec![request_state()],
        };
        if sequenced {
            self.confirmed.set_seq(line.seq);
        }

        if self.pending.front().is_some_and(|p| p.matches(&result)) {
            self.pending.pop_front();
            return vec![];
        }
        if self.pending.is_empty() {
            self.view = self.confirmed.clone();
            return move_events(&result, false)
                .into_iter()
                .map(MirrorAction::Emit)
                .collect();
        }

        self.rebase();
        vec![MirrorAction::Emit(GameEvent::Redraw(self.snapshot()))]
    }

    fn on_error(&mut self, payload: ErrorPayload) -> Vec<MirrorAction> {
        let mut actions = Vec::new();
        if payload.code.is_move_rejection() {
            let refused = match &payload.line {
                Some(line) => self.pending.iter().position(|p| p.is_line(line)),
                None => (!self.pending.is_empty()).then_some(0),
            };
            // Not found: a rebase already dropped it.
            if let Some(index) = refused {
                self.pending.remove(index);
                self.rebase();
                actions.push(MirrorAction::Emit(GameEvent::Redraw(self.snapshot())));
            }
        }
        if matches!(
            payload.code,
            ErrorCode::NotYourTurn | ErrorCode::GameNotInPlayingPhase
        ) {
            actions.push(request_state());
        }
        actions.push(MirrorAction::Emit(GameEvent::Rejected {
            code: payload.code,
            message: payload.message,
        }));
        actions
    }

    /// Rebuild the view from `confirmed` and replay pending moves.
    fn rebase(&mut self) {
        let mut view = self.confirmed.clone();
        let mut kept = VecDeque::with_capacity(self.pending.len());
        for pending in self.pending.drain(..) {
            if view
                .apply_move(pending.start, pending.end, pending.player)
                .is_err()
            {
                break;
            }
            kept.push_back(pending);
        }
        self.pending = kept;
        self.view = view;
    }
}

fn request_state() -> MirrorAction {
    MirrorAction::Send(ClientMessage::RequestState)
}

/// Presentation events for one applied move.
fn move_events(result: &MoveResult, speculative: bool) -> Vec<GameEvent> {
    let mut events = vec![GameEvent::LineDrawn {
        start: result.start,
        end: result.end,
        player: result.player,
        speculative,
    }];
    for coord in &result.completed {
        events.push(GameEvent::BoxCompleted {
            row: coord.row,
            col: coord.col,
            player: result.player,
        });
    }
    if !result.completed.is_empty() {
        events.push(GameEvent::ScoreChanged(result.scores));
    }
    events.push(GameEvent::TurnChanged(result.next_player));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use box_types::{BoxCompleted, GameEnded};

    const P1: PlayerNumber = PlayerNumber::One;
    const P2: PlayerNumber = PlayerNumber::Two;

    fn d(row: usize, col: usize) -> Dot {
        Dot::new(row, col)
    }

    fn playing_snapshot(grid_size: usize) -> GameSnapshot {
        let mut snapshot = GameSnapshot::empty(grid_size);
        snapshot.state = Phase::Playing;
        snapshot
    }

    fn joined(seat: PlayerNumber) -> Mirror {
        let mut mirror = Mirror::new(3);
        mirror.on_server(ServerMessage::RoomJoined(RoomJoined {
            room_id: RoomId::parse("room").unwrap(),
            player_number: seat,
            game_state: playing_snapshot(3),
        }));
        mirror
    }

    fn line(start: Dot, end: Dot, player: PlayerNumber, seq: u64) -> ServerMessage {
        ServerMessage::LineDrawn(LineDrawn {
            start,
            end,
            player,
            seq: Seq::new(seq),
        })
    }

    fn sends(actions: &[MirrorAction]) -> Vec<&ClientMessage> {
        actions
            .iter()
            .filter_map(|a| match a {
                MirrorAction::Send(msg) => Some(msg),
                MirrorAction::Emit(_) => None,
            })
            .collect()
    }

    #[test]
    fn join_seats_and_redraws() {
        let mut mirror = Mirror::new(3);
        let actions = mirror.on_server(ServerMessage::RoomJoined(RoomJoined {
            room_id: RoomId::parse("room").unwrap(),
            player_number: P2,
            game_state: playing_snapshot(3),
        }));

        assert_eq!(mirror.seat(), Some(P2));
        assert_eq!(mirror.room().unwrap().as_str(), "room");
        assert!(matches!(
            actions[0],
            MirrorAction::Emit(GameEvent::Joined { player: P2, .. })
        ));
        assert!(matches!(actions[1], MirrorAction::Emit(GameEvent::Redraw(_))));
    }

    #[test]
    fn unseated_mirror_refuses_moves() {
        let mut mirror = Mirror::new(3);
        assert_eq!(mirror.propose(d(0, 0), d(0, 1)), Err(MoveError::NotSeated));
    }

    #[test]
    fn proposal_is_speculative_and_sent() {
        let mut mirror = joined(P1);
        let actions = mirror.propose(d(0, 0), d(0, 1)).unwrap();

        assert_eq!(
            sends(&actions),
            vec![&ClientMessage::DrawLine(DrawLine {
                start: d(0, 0),
                end: d(0, 1),
                player: P1,
            })]
        );
        assert!(actions.iter().any(|a| matches!(
            a,
            MirrorAction::Emit(GameEvent::LineDrawn {
                speculative: true,
                ..
            })
        )));
        assert_eq!(mirror.pending_len(), 1);
        assert!(mirror
            .view()
            .board()
            .is_edge_drawn(mirror.view().board().edge_for(d(0, 0), d(0, 1)).unwrap()));
        assert!(!mirror.can_move());
    }

    #[test]
    fn second_tap_on_same_edge_is_suppressed_locally() {
        let mut mirror = joined(P1);
        mirror.propose(d(0, 0), d(0, 1)).unwrap();
        // Turn passed to player 2 in the view, so turn fails first.
        assert_eq!(
            mirror.propose(d(0, 1), d(0, 0)),
            Err(MoveError::NotYourTurn)
        );
        assert_eq!(mirror.pending_len(), 1);
    }

    #[test]
    fn echo_confirms_without_new_events() {
        let mut mirror = joined(P1);
        mirror.propose(d(0, 1), d(0, 0)).unwrap();

        let actions = mirror.on_server(line(d(0, 0), d(0, 1), P1, 1));
        assert!(actions.is_empty());
        assert_eq!(mirror.pending_len(), 0);
        assert_eq!(mirror.confirmed().seq(), Seq::new(1));
        assert_eq!(mirror.view().board(), mirror.confirmed().board());
    }

    #[test]
    fn opponent_move_is_applied() {
        let mut mirror = joined(P2);
        let actions = mirror.on_server(line(d(0, 0), d(0, 1), P1, 1));

        assert!(actions.iter().any(|a| matches!(
            a,
            MirrorAction::Emit(GameEvent::LineDrawn {
                speculative: false,
                ..
            })
        )));
        assert!(actions
            .iter()
            .any(|a| matches!(a, MirrorAction::Emit(GameEvent::TurnChanged(P2)))));
        assert!(mirror.can_move());
    }

    #[test]
    fn duplicate_line_is_ignored() {
        let mut mirror = joined(P2);
        mirror.on_server(line(d(0, 0), d(0, 1), P1, 1));
        let before = mirror.confirmed().clone();

        assert!(mirror.on_server(line(d(0, 0), d(0, 1), P1, 1)).is_empty());
        assert_eq!(mirror.confirmed(), &before);
    }

    #[test]
    fn sequence_gap_requests_state() {
        let mut mirror = joined(P2);
        let actions = mirror.on_server(line(d(0, 0), d(0, 1), P1, 3));
        assert_eq!(sends(&actions), vec![&ClientMessage::RequestState]);
        assert_eq!(mirror.confirmed().seq(), Seq::zero());
    }

    #[test]
    fn rejected_move_is_rolled_back() {
        let mut mirror = joined(P1);
        mirror.propose(d(0, 0), d(0, 1)).unwrap();

        let actions = mirror.on_server(ServerMessage::error(
            ErrorCode::EdgeAlreadyDrawn,
            "line already drawn",
        ));

        assert_eq!(mirror.pending_len(), 0);
        assert_eq!(mirror.view(), mirror.confirmed());
        assert!(mirror.can_move());
        assert!(actions
            .iter()
            .any(|a| matches!(a, MirrorAction::Emit(GameEvent::Redraw(_)))));
        assert!(actions.iter().any(|a| matches!(
            a,
            MirrorAction::Emit(GameEvent::Rejected {
                code: ErrorCode::EdgeAlreadyDrawn,
                ..
            })
        )));
    }

    #[test]
    fn late_rejection_spares_newer_move() {
        let mut mirror = joined(P1);
        let refused = DrawLine {
            start: d(0, 0),
            end: d(0, 1),
            player: P1,
        };
        mirror.propose(refused.start, refused.end).unwrap();

        // Another P1 move wins the race; the rebase drops ours.
        mirror.on_server(line(d(2, 0), d(2, 1), P1, 1));
        assert_eq!(mirror.pending_len(), 0);
        mirror.on_server(line(d(2, 1), d(2, 2), P2, 2));
        mirror.propose(d(1, 0), d(1, 1)).unwrap();

        let actions = mirror.on_server(ServerMessage::move_rejected(
            ErrorCode::NotYourTurn,
            "not your turn",
            refused,
        ));

        assert_eq!(mirror.pending_len(), 1);
        let newer = mirror.view().board().edge_for(d(1, 0), d(1, 1)).unwrap();
        assert!(mirror.view().board().is_edge_drawn(newer));
        assert!(!actions
            .iter()
            .any(|a| matches!(a, MirrorAction::Emit(GameEvent::Redraw(_)))));
        assert!(actions.iter().any(|a| matches!(
            a,
            MirrorAction::Emit(GameEvent::Rejected {
                code: ErrorCode::NotYourTurn,
                ..
            })
        )));
    }

    #[test]
    fn rejection_naming_a_line_removes_that_move() {
        let mut mirror = joined(P1);
        mirror.propose(d(0, 1), d(0, 0)).unwrap();

        mirror.on_server(ServerMessage::move_rejected(
            ErrorCode::EdgeAlreadyDrawn,
            "line already drawn",
            DrawLine {
                start: d(0, 0),
                end: d(0, 1),
                player: P1,
            },
        ));

        assert_eq!(mirror.pending_len(), 0);
        assert_eq!(mirror.view(), mirror.confirmed());
    }

    #[test]
    fn abandoned_move_leaves_the_view() {
        let mut mirror = joined(P1);
        mirror.propose(d(0, 0), d(0, 1)).unwrap();
        assert!(!mirror.can_move());

        assert!(mirror.abandon_last());
        assert_eq!(mirror.pending_len(), 0);
        assert_eq!(mirror.view(), mirror.confirmed());
        assert!(mirror.can_move());
        assert!(!mirror.abandon_last());
    }

    #[test]
    fn not_your_turn_rejection_requests_resync() {
        let mut mirror = joined(P1);
        mirror.propose(d(0, 0), d(0, 1)).unwrap();

        let actions = mirror.on_server(ServerMessage::error(ErrorCode::NotYourTurn, "not your turn"));
        assert!(sends(&actions).contains(&&ClientMessage::RequestState));
    }

    #[test]
    fn conflicting_line_replays_pending_that_still_fit() {
        let mut mirror = joined(P1);
        // Box (0,0) has three sides; P1 speculatively takes the fourth and keeps moving.
        let mut snapshot = playing_snapshot(3);
        snapshot.lines = vec![
            box_types::LineRecord {
                start: d(0, 0),
                end: d(0, 1),
                player: P2,
            },
            box_types::LineRecord {
                start: d(1, 0),
                end: d(1, 1),
                player: P1,
            },
            box_types::LineRecord {
                start: d(0, 0),
                end: d(1, 0),
                player: P2,
            },
        ];
        snapshot.seq = Seq::new(3);
        mirror.on_server(ServerMessage::GameState(snapshot));

        mirror.propose(d(0, 1), d(1, 1)).unwrap();
        mirror.propose(d(2, 0), d(2, 1)).unwrap();
        assert_eq!(mirror.pending_len(), 2);

        // The coordinator saw a different move from P1 first.
        let actions = mirror.on_server(line(d(0, 1), d(0, 2), P1, 4));

        assert!(actions
            .iter()
            .any(|a| matches!(a, MirrorAction::Emit(GameEvent::Redraw(_)))));
        // Turn passed to P2 in the confirmed game, so both pending moves are void.
        assert_eq!(mirror.pending_len(), 0);
        assert_eq!(mirror.view(), mirror.confirmed());
    }

    #[test]
    fn reset_snapshot_discards_speculation() {
        let mut mirror = joined(P1);
        mirror.on_server(line(d(2, 0), d(2, 1), P1, 1));
        mirror.on_server(line(d(2, 1), d(2, 2), P2, 2));
        mirror.propose(d(0, 0), d(0, 1)).unwrap();

        let actions = mirror.on_server(ServerMessage::GameState(playing_snapshot(3)));
        assert_eq!(mirror.pending_len(), 0);
        assert_eq!(mirror.view().seq(), Seq::zero());
        assert!(matches!(actions[0], MirrorAction::Emit(GameEvent::Redraw(_))));
    }

    #[test]
    fn box_completed_confirms_derived_box() {
        let mut mirror = joined(P2);
        mirror.on_server(line(d(0, 0), d(0, 1), P1, 1));
        mirror.on_server(line(d(1, 0), d(1, 1), P2, 2));
        mirror.on_server(line(d(0, 0), d(1, 0), P1, 3));
        let actions = mirror.on_server(line(d(0, 1), d(1, 1), P2, 4));
        assert!(actions.iter().any(|a| matches!(
            a,
            MirrorAction::Emit(GameEvent::BoxCompleted {
                row: 0,
                col: 0,
                player: P2
            })
        )));

        let confirm = mirror.on_server(ServerMessage::BoxCompleted(BoxCompleted {
            row: 0,
            col: 0,
            player: P2,
            seq: Seq::new(4),
        }));
        assert!(confirm.is_empty());

        let conflict = mirror.on_server(ServerMessage::BoxCompleted(BoxCompleted {
            row: 1,
            col: 1,
            player: P1,
            seq: Seq::new(4),
        }));
        assert_eq!(sends(&conflict), vec![&ClientMessage::RequestState]);
    }

    #[test]
    fn game_ended_is_forwarded() {
        let mut mirror = joined(P1);
        let actions = mirror.on_server(ServerMessage::GameEnded(GameEnded {
            winner: "Draw".into(),
            scores: Scores::default(),
        }));
        let ended = actions
            .iter()
            .find_map(|a| match a {
                MirrorAction::Emit(event @ GameEvent::GameEnded { .. }) => Some(event),
                _ => None,
            })
            .unwrap();
        assert_eq!(ended.sound_cue(), Some(SoundCue::GameWin));
    }
}
