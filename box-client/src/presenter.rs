//! Presentation collaborators.
//!
//! Rendering and audio live outside this crate. They receive mirror
//! events through [`Presenter`] and [`SoundSink`]; [`dispatch`] routes one
//! event to both.

use box_core::{GameEvent, SoundCue};
use box_types::{Dot, GameSnapshot, PlayerNumber, RoomId, Scores};

/// Visual side of the game.
pub trait Presenter: Send + Sync {
    /// Show a line.
    fn edge_drawn(&self, start: Dot, end: Dot, player: PlayerNumber, speculative: bool);

    /// Fill a box.
    fn box_completed(&self, row: usize, col: usize, player: PlayerNumber);

    /// Update the score display.
    fn score_changed(&self, scores: Scores);

    /// Highlight the player to move.
    fn turn_changed(&self, player: PlayerNumber);

    /// Show the final result.
    fn game_ended(&self, winner: &str, scores: Scores);

    /// Redraw the whole board.
    fn redraw(&self, _snapshot: &GameSnapshot) {}

    /// Seated in a room.
    fn joined(&self, _room_id: &RoomId, _player: PlayerNumber) {}

    /// Surface a coordinator or connectivity error.
    fn show_error(&self, _message: &str) {}
}

/// Audio side of the game.
pub trait SoundSink: Send + Sync {
    /// Play a cue.
    fn play(&self, cue: SoundCue);
}

/// A sink that plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl SoundSink for Silent {
    fn play(&self, _cue: SoundCue) {}
}

/// Route one event to the presenter and the sound sink.
pub fn dispatch(event: &GameEvent, presenter: &dyn Presenter, sound: &dyn SoundSink) {
    if let Some(cue) = event.sound_cue() {
        sound.play(cue);
    }
    match event {
        GameEvent::Joined { room_id, player } => presenter.joined(room_id, *player),
        GameEvent::LineDrawn {
            start,
            end,
            player,
            speculative,
        } => presenter.edge_drawn(*start, *end, *player, *speculative),
        GameEvent::BoxCompleted { row, col, player } => {
            presenter.box_completed(*row, *col, *player)
        }
        GameEvent::ScoreChanged(scores) => presenter.score_changed(*scores),
        GameEvent::TurnChanged(player) => presenter.turn_changed(*player),
        GameEvent::GameEnded { winner, scores } => presenter.game_ended(winner, *scores),
        GameEvent::Redraw(snapshot) => presenter.redraw(snapshot),
        GameEvent::Rejected { message, .. } => presenter.show_error(message),
    }
}

/// Final-score line shown under the winner text.
pub fn final_score_line(scores: Scores) -> String {
    format!(
        "Player 1: {} | Player 2: {}",
        scores.player1, scores.player2
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Presenter that records calls as strings.
    #[derive(Default)]
    pub struct Recorder {
        pub calls: Mutex<Vec<String>>,
        pub sounds: Mutex<Vec<SoundCue>>,
    }

    impl Recorder {
        fn push(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn sounds(&self) -> Vec<SoundCue> {
            self.sounds.lock().unwrap().clone()
        }
    }

    impl Presenter for Recorder {
        fn edge_drawn(&self, start: Dot, end: Dot, player: PlayerNumber, speculative: bool) {
            self.push(format!("edge {start}-{end} {player} speculative={speculative}"));
        }

        fn box_completed(&self, row: usize, col: usize, player: PlayerNumber) {
            self.push(format!("box {row},{col} {player}"));
        }

        fn score_changed(&self, scores: Scores) {
            self.push(format!("score {}", final_score_line(scores)));
        }

        fn turn_changed(&self, player: PlayerNumber) {
            self.push(format!("turn {player}"));
        }

        fn game_ended(&self, winner: &str, scores: Scores) {
            self.push(format!("ended {winner} {}", final_score_line(scores)));
        }

        fn redraw(&self, snapshot: &GameSnapshot) {
            self.push(format!("redraw seq={}", snapshot.seq));
        }

        fn joined(&self, room_id: &RoomId, player: PlayerNumber) {
            self.push(format!("joined {room_id} as {player}"));
        }

        fn show_error(&self, message: &str) {
            self.push(format!("error {message}"));
        }
    }

    impl SoundSink for Recorder {
        fn play(&self, cue: SoundCue) {
            self.sounds.lock().unwrap().push(cue);
        }
    }
}
