//! Move validation.
//!
//! Side-effect free, so the client can run it speculatively against its
//! mirror before anything is sent.

use box_types::{Dot, PlayerNumber};

use crate::{Board, Edge, MoveError, TurnState};

/// Decide whether `player` may draw the line between `start` and `end`.
///
/// Checks run in a fixed order so both sides report the same reason:
/// edge geometry, then phase, then turn, then whether the edge is taken.
pub fn validate(
    board: &Board,
    turn: &TurnState,
    start: Dot,
    end: Dot,
    player: PlayerNumber,
) -> Result<Edge, MoveError> {
    let edge = board.edge_for(start, end)?;
    if !turn.is_playing() {
        return Err(MoveError::GameNotInPlayingPhase);
    }
    if turn.current_player() != player {
        return Err(MoveError::NotYourTurn);
    }
    if board.is_edge_drawn(edge) {
        return Err(MoveError::EdgeAlreadyDrawn);
    }
    Ok(edge)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing() -> TurnState {
        let mut turn = TurnState::new();
        turn.start();
        turn
    }

    #[test]
    fn accepts_legal_move() {
        let board = Board::new(3);
        let edge = validate(
            &board,
            &playing(),
            Dot::new(0, 0),
            Dot::new(0, 1),
            PlayerNumber::One,
        )
        .unwrap();
        assert_eq!((edge.row, edge.col), (0, 0));
    }

    #[test]
    fn rejects_wrong_player() {
        let board = Board::new(3);
        let result = validate(
            &board,
            &playing(),
            Dot::new(0, 0),
            Dot::new(0, 1),
            PlayerNumber::Two,
        );
        assert_eq!(result, Err(MoveError::NotYourTurn));
    }

    #[test]
    fn rejects_before_game_starts() {
        let board = Board::new(3);
        let result = validate(
            &board,
            &TurnState::new(),
            Dot::new(0, 0),
            Dot::new(0, 1),
            PlayerNumber::One,
        );
        assert_eq!(result, Err(MoveError::GameNotInPlayingPhase));
    }

    #[test]
    fn geometry_is_checked_first() {
        let board = Board::new(3);
        let dot = Dot::new(1, 1);
        let result = validate(&board, &TurnState::new(), dot, dot, PlayerNumber::Two);
        assert_eq!(result, Err(MoveError::InvalidEdge));
    }

    #[test]
    fn rejects_drawn_edge() {
        let mut board = Board::new(3);
        let edge = board.edge_for(Dot::new(0, 0), Dot::new(1, 0)).unwrap();
        board.draw(edge, PlayerNumber::Two).unwrap();

        let result = validate(
            &board,
            &playing(),
            Dot::new(1, 0),
            Dot::new(0, 0),
            PlayerNumber::One,
        );
        assert_eq!(result, Err(MoveError::EdgeAlreadyDrawn));
    }
}
