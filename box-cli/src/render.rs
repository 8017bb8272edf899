//! ASCII board rendering.
//!
//! ```text
//!     0   1   2
//!  0  +---+   +
//!     | 1 |
//!  1  +---+---+
//!
//!  2  +   +   +
//! ```

use box_core::{Board, Edge};
use box_types::{Dot, GameSnapshot, Phase, PlayerNumber};
use std::fmt::Write;

/// Draw the board described by `snapshot`.
pub fn render(snapshot: &GameSnapshot) -> String {
    let n = snapshot.grid_size;
    let mut board = Board::new(n);
    for line in &snapshot.lines {
        if let Ok(edge) = board.edge_for(line.start, line.end) {
            // Completion is taken from `boxes` below, not recomputed.
            let _ = board.draw(edge, line.player);
        }
    }
    let owner = |row: usize, col: usize| {
        snapshot
            .boxes
            .iter()
            .find(|b| b.row == row && b.col == col)
            .map(|b| b.player)
    };

    let mut out = String::new();
    let mut header = String::from("    ");
    for col in 0..n {
        let _ = write!(header, "{col:<4}");
    }
    push_line(&mut out, &header);

    for row in 0..n {
        let mut dots = format!("{row:>2}  ");
        for col in 0..n {
            dots.push('+');
            if col + 1 < n {
                let drawn = is_drawn(&board, row, col, row, col + 1);
                dots.push_str(if drawn { "---" } else { "   " });
            }
        }
        push_line(&mut out, &dots);

        if row + 1 < n {
            let mut sides = String::from("    ");
            for col in 0..n {
                let drawn = is_drawn(&board, row, col, row + 1, col);
                sides.push(if drawn { '|' } else { ' ' });
                if col + 1 < n {
                    match owner(row, col) {
                        Some(player) => {
                            let _ = write!(sides, " {} ", player.number());
                        }
                        None => sides.push_str("   "),
                    }
                }
            }
            push_line(&mut out, &sides);
        }
    }
    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn is_drawn(board: &Board, r1: usize, c1: usize, r2: usize, c2: usize) -> bool {
    Edge::between(Dot::new(r1, c1), Dot::new(r2, c2))
        .map(|edge| board.is_edge_drawn(edge))
        .unwrap_or(false)
}

/// One-line summary under the board.
pub fn status_line(snapshot: &GameSnapshot, seat: Option<PlayerNumber>) -> String {
    let scores = format!(
        "P1 {} : {} P2",
        snapshot.scores.player1, snapshot.scores.player2
    );
    let state = match snapshot.state {
        Phase::Waiting => "waiting for an opponent".to_string(),
        Phase::Finished => "game over".to_string(),
        Phase::Playing if Some(snapshot.current_player) == seat => "your turn".to_string(),
        Phase::Playing => format!("{} to move", snapshot.current_player),
    };
    format!("{scores}  |  {state}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use box_types::{BoxRecord, LineRecord, Scores, Seq};

    const P1: PlayerNumber = PlayerNumber::One;
    const P2: PlayerNumber = PlayerNumber::Two;

    fn line(a: (usize, usize), b: (usize, usize), player: PlayerNumber) -> LineRecord {
        LineRecord {
            start: Dot::new(a.0, a.1),
            end: Dot::new(b.0, b.1),
            player,
        }
    }

    #[test]
    fn empty_board_is_dots_only() {
        let text = render(&GameSnapshot::empty(3));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "    0   1   2");
        assert_eq!(lines[1], " 0  +   +   +");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], " 1  +   +   +");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn completed_box_shows_owner() {
        let mut snapshot = GameSnapshot::empty(2);
        snapshot.lines = vec![
            line((0, 0), (0, 1), P1),
            line((1, 0), (1, 1), P2),
            line((0, 0), (1, 0), P1),
            line((0, 1), (1, 1), P2),
        ];
        snapshot.boxes = vec![BoxRecord {
            row: 0,
            col: 0,
            player: P2,
        }];
        snapshot.seq = Seq::new(4);

        let text = render(&snapshot);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], " 0  +---+");
        assert_eq!(lines[2], "    | 2 |");
        assert_eq!(lines[3], " 1  +---+");
    }

    #[test]
    fn reversed_endpoints_render_the_same_edge() {
        let mut snapshot = GameSnapshot::empty(3);
        snapshot.lines = vec![line((1, 2), (0, 2), P1)];
        let text = render(&snapshot);
        assert_eq!(text.lines().nth(2), Some("            |"));
    }

    #[test]
    fn status_line_names_the_mover() {
        let mut snapshot = GameSnapshot::empty(3);
        snapshot.state = Phase::Playing;
        snapshot.current_player = P2;
        snapshot.scores = Scores {
            player1: 2,
            player2: 1,
        };

        assert_eq!(
            status_line(&snapshot, Some(P2)),
            "P1 2 : 1 P2  |  your turn"
        );
        assert_eq!(
            status_line(&snapshot, Some(P1)),
            "P1 2 : 1 P2  |  Player 2 to move"
        );
        snapshot.state = Phase::Waiting;
        assert!(status_line(&snapshot, None).ends_with("waiting for an opponent"));
    }
}
