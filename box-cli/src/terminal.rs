//! Terminal presentation: event lines on stdout, the bell for big moments.

use box_client::{final_score_line, Presenter, SoundSink};
use box_core::SoundCue;
use box_types::{Dot, PlayerNumber, RoomId, Scores};

/// Prints game events as they happen.
#[derive(Debug, Default)]
pub struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn edge_drawn(&self, start: Dot, end: Dot, player: PlayerNumber, speculative: bool) {
        println!("{}", edge_line(start, end, player, speculative));
    }

    fn box_completed(&self, row: usize, col: usize, player: PlayerNumber) {
        println!("  box ({row},{col}) completed by {player}");
    }

    fn score_changed(&self, scores: Scores) {
        println!("  {}", final_score_line(scores));
    }

    fn turn_changed(&self, player: PlayerNumber) {
        tracing::debug!(%player, "turn changed");
    }

    fn game_ended(&self, winner: &str, scores: Scores) {
        println!();
        println!("{}", winner_line(winner));
        println!("{}", final_score_line(scores));
    }

    fn joined(&self, room_id: &RoomId, player: PlayerNumber) {
        println!("Joined room '{room_id}' as {player}");
    }

    fn show_error(&self, message: &str) {
        eprintln!("error: {message}");
    }
}

/// Rings the terminal bell on box completion and game end.
#[derive(Debug, Clone, Copy)]
pub struct Bell {
    enabled: bool,
}

impl Bell {
    /// Create a bell; a disabled bell is silent.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn rings_for(cue: SoundCue) -> bool {
        matches!(cue, SoundCue::BoxComplete | SoundCue::GameWin)
    }
}

impl SoundSink for Bell {
    fn play(&self, cue: SoundCue) {
        if self.enabled && Self::rings_for(cue) {
            print!("\x07");
        }
    }
}

fn edge_line(start: Dot, end: Dot, player: PlayerNumber, speculative: bool) -> String {
    if speculative {
        format!("  you drew {start}-{end} (waiting for server)")
    } else {
        format!("  {player} drew {start}-{end}")
    }
}

/// Headline for the final result; `winner` is a player label or `"Draw"`.
pub fn winner_line(winner: &str) -> String {
    if winner == "Draw" {
        "It's a draw!".to_string()
    } else {
        format!("{winner} wins!")
    }
}
