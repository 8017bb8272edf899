//! Named audio cues.
//!
//! The presentation layer maps cues to actual sound; [`SoundCue::tones`]
//! gives the short synthesized tones the browser client used.

/// A named sound trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// A dot was clicked
    Click,
    /// The pointer entered a dot
    Hover,
    /// A line appeared on the board
    LineDraw,
    /// A box was completed
    BoxComplete,
    /// The game ended
    GameWin,
}

/// Oscillator shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    /// Sine wave
    Sine,
    /// Square wave
    Square,
}

/// One synthesized tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    /// Pitch in Hz
    pub frequency_hz: u32,
    /// Length in milliseconds
    pub duration_ms: u32,
    /// Oscillator shape
    pub waveform: Waveform,
}

const fn tone(frequency_hz: u32, duration_ms: u32, waveform: Waveform) -> Tone {
    Tone {
        frequency_hz,
        duration_ms,
        waveform,
    }
}

/// Delay between the notes of a chime.
pub const CHIME_STEP_MS: u32 = 100;

/// Default playback volume, 0.0 to 1.0.
pub const DEFAULT_VOLUME: f32 = 0.3;

impl SoundCue {
    /// Tones played for this cue, in order, [`CHIME_STEP_MS`] apart.
    pub fn tones(&self) -> &'static [Tone] {
        use Waveform::{Sine, Square};
        static CLICK: [Tone; 1] = [tone(1000, 50, Square)];
        static HOVER: [Tone; 1] = [tone(600, 30, Sine)];
        static LINE: [Tone; 1] = [tone(800, 100, Sine)];
        static BOX: [Tone; 3] = [tone(523, 300, Sine), tone(659, 300, Sine), tone(784, 300, Sine)];
        static WIN: [Tone; 4] = [
            tone(523, 500, Sine),
            tone(659, 500, Sine),
            tone(784, 500, Sine),
            tone(1047, 500, Sine),
        ];
        match self {
            Self::Click => &CLICK,
            Self::Hover => &HOVER,
            Self::LineDraw => &LINE,
            Self::BoxComplete => &BOX,
            Self::GameWin => &WIN,
        }
    }
}
