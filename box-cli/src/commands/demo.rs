//! Local scripted game: two greedy bots, no server.

use anyhow::{Context, Result};
use box_client::Presenter;
use box_core::{Board, BoxCoord, Edge, Game, Orientation};
use box_types::Outcome;

use crate::render::render;
use crate::terminal::TerminalPresenter;

/// Final state of a demo game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSummary {
    /// Moves played
    pub moves: usize,
    /// Final result
    pub outcome: Outcome,
    /// Boxes owned by player 1 and player 2
    pub scores: (u32, u32),
}

/// Run the demo command.
pub fn run(grid_size: usize, show_board: bool) -> Result<DemoSummary> {
    let presenter = TerminalPresenter;
    let mut game = Game::new(grid_size);
    game.start();

    println!(
        "Demo: {n}x{n} dots, two bots taking turns",
        n = game.board().grid_size()
    );
    let mut moves = 0;
    let outcome = loop {
        let player = game.current_player();
        let edge = pick_edge(game.board()).context("Board has no open edge")?;
        let (start, end) = edge.endpoints();
        let result = game
            .apply_move(start, end, player)
            .context("Bot picked an illegal move")?;
        moves += 1;

        presenter.edge_drawn(result.start, result.end, result.player, false);
        for coord in &result.completed {
            presenter.box_completed(coord.row, coord.col, result.player);
        }
        if show_board {
            print!("{}", render(&game.snapshot(Vec::new())));
        }
        if let Some(outcome) = result.outcome {
            break outcome;
        }
    };

    if !show_board {
        println!();
        print!("{}", render(&game.snapshot(Vec::new())));
    }
    let scores = game.scores();
    presenter.game_ended(&outcome.label(), scores);

    Ok(DemoSummary {
        moves,
        outcome,
        scores: (scores.player1, scores.player2),
    })
}

/// Greedy choice: complete a box if possible, otherwise avoid giving one
/// away, otherwise take the first open edge.
pub fn pick_edge(board: &Board) -> Option<Edge> {
    let open: Vec<Edge> = all_edges(board.grid_size())
        .filter(|edge| !board.is_edge_drawn(*edge))
        .collect();

    let sides_after = |edge: &Edge| -> Vec<usize> {
        board
            .boxes_adjacent_to_edge(*edge)
            .into_iter()
            .map(|coord| drawn_sides(board, coord) + 1)
            .collect()
    };

    open.iter()
        .find(|edge| sides_after(edge).contains(&4))
        .or_else(|| open.iter().find(|edge| !sides_after(edge).contains(&3)))
        .or_else(|| open.first())
        .copied()
}

fn all_edges(n: usize) -> impl Iterator<Item = Edge> {
    let horizontal = (0..n).flat_map(move |row| {
        (0..n - 1).map(move |col| Edge {
            orientation: Orientation::Horizontal,
            row,
            col,
        })
    });
    let vertical = (0..n - 1).flat_map(move |row| {
        (0..n).map(move |col| Edge {
            orientation: Orientation::Vertical,
            row,
            col,
        })
    });
    horizontal.chain(vertical)
}

fn drawn_sides(board: &Board, coord: BoxCoord) -> usize {
    coord
        .edges()
        .iter()
        .filter(|edge| board.is_edge_drawn(**edge))
        .count()
}
