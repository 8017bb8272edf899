//! Two-click dot selection.
//!
//! Selection is local UI state and never goes over the wire; only a
//! completed [`Pick::Pair`] becomes a move intent.

use box_types::Dot;

use crate::{are_adjacent, SoundCue};

/// Result of one click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    /// Nothing was selected; this dot now is
    Selected(Dot),
    /// The selected dot was clicked again and is released
    Deselected(Dot),
    /// An adjacent dot was clicked; the pair is a move intent
    Pair(Dot, Dot),
    /// A non-adjacent dot was clicked and takes over the selection
    Reselected {
        /// Previously selected dot
        from: Dot,
        /// Newly selected dot
        to: Dot,
    },
    /// Click ignored (off board, or moves are disabled)
    Ignored,
}

impl Pick {
    /// Sound to play for this click.
    pub fn sound_cue(&self) -> Option<SoundCue> {
        match self {
            Self::Ignored => None,
            _ => Some(SoundCue::Click),
        }
    }
}

/// Tracks the first dot of a pending pair.
#[derive(Debug, Clone, Default)]
pub struct DotPicker {
    grid_size: usize,
    selected: Option<Dot>,
}

impl DotPicker {
    /// Create a picker for a board with `grid_size` dots per side.
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            selected: None,
        }
    }

    /// Follow a board size change; a selection off the new board is dropped.
    pub fn resize(&mut self, grid_size: usize) {
        if grid_size == self.grid_size {
            return;
        }
        self.grid_size = grid_size;
        if self
            .selected
            .is_some_and(|dot| dot.row >= grid_size || dot.col >= grid_size)
        {
            self.selected = None;
        }
    }

    /// Currently selected dot.
    pub fn selected(&self) -> Option<Dot> {
        self.selected
    }

    /// Handle a click. `enabled` is false when it is not the local
    /// player's turn or the game is not in progress.
    pub fn click(&mut self, dot: Dot, enabled: bool) -> Pick {
        if !enabled || dot.row >= self.grid_size || dot.col >= self.grid_size {
            return Pick::Ignored;
        }
        match self.selected.take() {
            None => {
                self.selected = Some(dot);
                Pick::Selected(dot)
            }
            Some(first) if first == dot => Pick::Deselected(dot),
            Some(first) if are_adjacent(first, dot) => Pick::Pair(first, dot),
            Some(first) => {
                self.selected = Some(dot);
                Pick::Reselected {
                    from: first,
                    to: dot,
                }
            }
        }
    }

    /// Hover feedback for a dot.
    pub fn hover(&self, dot: Dot) -> Option<SoundCue> {
        (dot.row < self.grid_size && dot.col < self.grid_size && self.selected != Some(dot))
            .then_some(SoundCue::Hover)
    }

    /// Drop the selection, returning what was selected.
    pub fn cancel(&mut self) -> Option<Dot> {
        self.selected.take()
    }
}
