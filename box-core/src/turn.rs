//! Turn state: player to move, phase and scores.
//!
//! Phases only move forward (`waiting -> playing -> finished`). A restart
//! is a new `TurnState`, never a backward transition of an existing one.

use box_types::{Phase, PlayerNumber, Scores};

/// Whose turn it is, which phase the game is in, and the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnState {
    current_player: PlayerNumber,
    phase: Phase,
    scores: Scores,
}

impl TurnState {
    /// A fresh game waiting for players; player 1 moves first.
    pub fn new() -> Self {
        Self {
            current_player: PlayerNumber::One,
            phase: Phase::Waiting,
            scores: Scores::default(),
        }
    }

    /// Rebuild from snapshot values.
    pub fn restore(current_player: PlayerNumber, phase: Phase, scores: Scores) -> Self {
        Self {
            current_player,
            phase,
            scores,
        }
    }

    /// Player to move.
    pub fn current_player(&self) -> PlayerNumber {
        self.current_player
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current scores.
    pub fn scores(&self) -> Scores {
        self.scores
    }

    /// Whether moves are accepted.
    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// `waiting -> playing`. Returns false from any other phase.
    pub fn start(&mut self) -> bool {
        if self.phase == Phase::Waiting {
            self.phase = Phase::Playing;
            true
        } else {
            false
        }
    }

    /// `playing -> finished`. Returns false from any other phase.
    pub fn finish(&mut self) -> bool {
        if self.phase == Phase::Playing {
            self.phase = Phase::Finished;
            true
        } else {
            false
        }
    }

    /// Credit completed boxes and pass the turn when none were completed.
    pub fn record_move(&mut self, player: PlayerNumber, boxes_completed: usize) {
        for _ in 0..boxes_completed {
            self.scores.increment(player);
        }
        if boxes_completed == 0 {
            self.current_player = player.other();
        }
    }
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_waiting_with_player_one() {
        let turn = TurnState::new();
        assert_eq!(turn.phase(), Phase::Waiting);
        assert_eq!(turn.current_player(), PlayerNumber::One);
        assert_eq!(turn.scores().total(), 0);
    }

    #[test]
    fn phases_only_move_forward() {
        let mut turn = TurnState::new();
        assert!(!turn.finish());
        assert!(turn.start());
        assert!(!turn.start());
        assert!(turn.finish());
        assert!(!turn.start());
        assert_eq!(turn.phase(), Phase::Finished);
    }

    #[test]
    fn turn_passes_without_completion() {
        let mut turn = TurnState::new();
        turn.start();
        turn.record_move(PlayerNumber::One, 0);
        assert_eq!(turn.current_player(), PlayerNumber::Two);
    }

    #[test]
    fn completion_keeps_turn_and_scores() {
        let mut turn = TurnState::new();
        turn.start();
        turn.record_move(PlayerNumber::One, 2);
        assert_eq!(turn.current_player(), PlayerNumber::One);
        assert_eq!(turn.scores().player1, 2);
    }
}
