//! Rules engine: one game on one board.
//!
//! [`Game::apply_move`] validates before touching anything, so a rejected
//! move leaves the game exactly as it was.

use box_types::{
    BoxCompleted, BoxRecord, Dot, GameEnded, GameSnapshot, LineDrawn, LineRecord, Outcome, Phase,
    PlayerNumber, Scores, Seat, Seq, ServerMessage,
};

use crate::board::{MAX_GRID_SIZE, MIN_GRID_SIZE};
use crate::{validate, Board, BoxCoord, Edge, MoveError, SnapshotError, TurnState};

/// Everything one applied move changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    /// Edge that was drawn
    pub edge: Edge,
    /// Normalized first endpoint
    pub start: Dot,
    /// Normalized second endpoint
    pub end: Dot,
    /// Mover
    pub player: PlayerNumber,
    /// Boxes this move completed, each now owned by `player`
    pub completed: Vec<BoxCoord>,
    /// Player to move next
    pub next_player: PlayerNumber,
    /// Scores after the move
    pub scores: Scores,
    /// Sequence number assigned to the move
    pub seq: Seq,
    /// Set when this move finished the game
    pub outcome: Option<Outcome>,
}

impl MoveResult {
    /// Broadcast events for this move, in order: `lineDrawn`, one
    /// `boxCompleted` per box, then `gameEnded` if the board is full.
    pub fn messages(&self) -> Vec<ServerMessage> {
        let mut messages = Vec::with_capacity(self.completed.len() + 2);
        messages.push(ServerMessage::LineDrawn(LineDrawn {
            start: self.start,
            end: self.end,
            player: self.player,
            seq: self.seq,
        }));
        for coord in &self.completed {
            messages.push(ServerMessage::BoxCompleted(BoxCompleted {
                row: coord.row,
                col: coord.col,
                player: self.player,
                seq: self.seq,
            }));
        }
        if let Some(outcome) = self.outcome {
            messages.push(ServerMessage::GameEnded(GameEnded {
                winner: outcome.label(),
                scores: self.scores,
            }));
        }
        messages
    }
}

/// Board plus turn state plus move history for one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    turn: TurnState,
    seq: Seq,
    history: Vec<LineRecord>,
}

impl Game {
    /// A new game in `waiting`.
    pub fn new(grid_size: usize) -> Self {
        Self {
            board: Board::new(grid_size),
            turn: TurnState::new(),
            seq: Seq::zero(),
            history: Vec::new(),
        }
    }

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The turn state.
    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    /// Sequence number of the last applied move.
    pub fn seq(&self) -> Seq {
        self.seq
    }

    /// Phase shortcut.
    pub fn phase(&self) -> Phase {
        self.turn.phase()
    }

    /// Player to move.
    pub fn current_player(&self) -> PlayerNumber {
        self.turn.current_player()
    }

    /// Scores shortcut.
    pub fn scores(&self) -> Scores {
        self.turn.scores()
    }

    /// Move from `waiting` to `playing`.
    pub fn start(&mut self) -> bool {
        self.turn.start()
    }

    /// Validate without applying.
    pub fn check(&self, start: Dot, end: Dot, player: PlayerNumber) -> Result<Edge, MoveError> {
        validate(&self.board, &self.turn, start, end, player)
    }

    /// Apply a move atomically.
    pub fn apply_move(
        &mut self,
        start: Dot,
        end: Dot,
        player: PlayerNumber,
    ) -> Result<MoveResult, MoveError> {
        let edge = self.check(start, end, player)?;
        let completed = self.board.draw(edge, player)?;

        self.turn.record_move(player, completed.len());
        let outcome = if self.board.is_full() {
            self.turn.finish();
            Some(self.turn.scores().outcome())
        } else {
            None
        };
        self.seq = self.seq.next();

        let (start, end) = edge.endpoints();
        self.history.push(LineRecord { start, end, player });

        Ok(MoveResult {
            edge,
            start,
            end,
            player,
            completed,
            next_player: self.turn.current_player(),
            scores: self.turn.scores(),
            seq: self.seq,
            outcome,
        })
    }

    /// Overwrite the sequence counter with the coordinator's value.
    pub fn set_seq(&mut self, seq: Seq) {
        self.seq = seq;
    }

    /// Full-state snapshot with the given seat list.
    pub fn snapshot(&self, players: Vec<Seat>) -> GameSnapshot {
        GameSnapshot {
            current_player: self.turn.current_player(),
            scores: self.turn.scores(),
            state: self.turn.phase(),
            grid_size: self.board.grid_size(),
            seq: self.seq,
            lines: self.history.clone(),
            boxes: self
                .board
                .owned()
                .into_iter()
                .map(|(coord, player)| BoxRecord {
                    row: coord.row,
                    col: coord.col,
                    player,
                })
                .collect(),
            players,
        }
    }

    /// Rebuild a game by replaying a snapshot's lines.
    ///
    /// Box ownership and scores are re-derived from the lines; the reported
    /// scores are only used when the snapshot carries no lines.
    pub fn from_snapshot(snapshot: &GameSnapshot) -> Result<Self, SnapshotError> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&snapshot.grid_size) {
            return Err(SnapshotError::GridSize(snapshot.grid_size));
        }

        let mut board = Board::new(snapshot.grid_size);
        let mut scores = Scores::default();
        for line in &snapshot.lines {
            let edge = board
                .edge_for(line.start, line.end)
                .map_err(SnapshotError::Line)?;
            for _ in board.draw(edge, line.player).map_err(SnapshotError::Line)? {
                scores.increment(line.player);
            }
        }
        if snapshot.lines.is_empty() {
            scores = snapshot.scores;
        }

        Ok(Self {
            board,
            turn: TurnState::restore(snapshot.current_player, snapshot.state, scores),
            seq: snapshot.seq,
            history: snapshot.lines.clone(),
        })
    }
}
