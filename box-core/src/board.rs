//! Board model: dots, edges and boxes.
//!
//! An `N x N` dot lattice has `N * (N-1)` horizontal edges, the same number
//! of vertical edges and `(N-1)^2` boxes. Edges are stored by a normalized
//! key so `(A, B)` and `(B, A)` address the same slot:
//! - horizontal: `(row, min(start.col, end.col))`
//! - vertical: `(min(start.row, end.row), col)`
//!
//! Each box keeps a counter of drawn bounding edges. Drawing an edge bumps
//! the counter of its 0-2 neighbouring boxes and a box is awarded exactly
//! when its counter reaches 4.

use box_types::{Dot, PlayerNumber};

use crate::MoveError;

/// Smallest playable board (one box).
pub const MIN_GRID_SIZE: usize = 2;

/// Largest board a snapshot may describe.
pub const MAX_GRID_SIZE: usize = 32;

const EDGES_PER_BOX: u8 = 4;

/// True iff exactly one coordinate differs, and by exactly 1.
pub fn are_adjacent(a: Dot, b: Dot) -> bool {
    let row_diff = a.row.abs_diff(b.row);
    let col_diff = a.col.abs_diff(b.col);
    (row_diff == 1 && col_diff == 0) || (row_diff == 0 && col_diff == 1)
}

/// Edge direction, derived from its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Endpoints share a row
    Horizontal,
    /// Endpoints share a column
    Vertical,
}

/// Storage key of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Direction
    pub orientation: Orientation,
    /// Row of the normalized first endpoint
    pub row: usize,
    /// Column of the normalized first endpoint
    pub col: usize,
}

impl Edge {
    /// Normalize two adjacent dots into an edge key.
    ///
    /// Does not check the board bounds; see [`Board::edge_for`].
    pub fn between(a: Dot, b: Dot) -> Result<Self, MoveError> {
        if !are_adjacent(a, b) {
            return Err(MoveError::InvalidEdge);
        }
        let edge = if a.row == b.row {
            Self {
                orientation: Orientation::Horizontal,
                row: a.row,
                col: a.col.min(b.col),
            }
        } else {
            Self {
                orientation: Orientation::Vertical,
                row: a.row.min(b.row),
                col: a.col,
            }
        };
        Ok(edge)
    }

    /// Normalized endpoints, smaller coordinate first.
    pub fn endpoints(&self) -> (Dot, Dot) {
        let start = Dot::new(self.row, self.col);
        let end = match self.orientation {
            Orientation::Horizontal => Dot::new(self.row, self.col + 1),
            Orientation::Vertical => Dot::new(self.row + 1, self.col),
        };
        (start, end)
    }
}

/// A box, addressed by its top-left dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxCoord {
    /// Row
    pub row: usize,
    /// Column
    pub col: usize,
}

impl BoxCoord {
    /// Create a new box coordinate.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The four bounding edges: top, bottom, left, right.
    pub fn edges(&self) -> [Edge; 4] {
        let (row, col) = (self.row, self.col);
        [
            Edge {
                orientation: Orientation::Horizontal,
                row,
                col,
            },
            Edge {
                orientation: Orientation::Horizontal,
                row: row + 1,
                col,
            },
            Edge {
                orientation: Orientation::Vertical,
                row,
                col,
            },
            Edge {
                orientation: Orientation::Vertical,
                row,
                col: col + 1,
            },
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct BoxCell {
    drawn: u8,
    owner: Option<PlayerNumber>,
}

/// Dot lattice with edge and box ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    grid_size: usize,
    horizontal: Vec<Option<PlayerNumber>>,
    vertical: Vec<Option<PlayerNumber>>,
    boxes: Vec<BoxCell>,
}

impl Board {
    /// Create an empty board with `grid_size` dots per side.
    ///
    /// Sizes below [`MIN_GRID_SIZE`] are raised to it.
    pub fn new(grid_size: usize) -> Self {
        let n = grid_size.max(MIN_GRID_SIZE);
        let spans = n - 1;
        Self {
            grid_size: n,
            horizontal: vec![None; n * spans],
            vertical: vec![None; spans * n],
            boxes: vec![BoxCell::default(); spans * spans],
        }
    }

    /// Dots per side.
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Boxes per side.
    pub fn boxes_per_side(&self) -> usize {
        self.grid_size - 1
    }

    /// Number of boxes on the board.
    pub fn total_boxes(&self) -> usize {
        self.boxes.len()
    }

    /// Whether a dot lies on the lattice.
    pub fn contains(&self, dot: Dot) -> bool {
        dot.row < self.grid_size && dot.col < self.grid_size
    }

    /// Edge between two on-board adjacent dots.
    pub fn edge_for(&self, a: Dot, b: Dot) -> Result<Edge, MoveError> {
        if !self.contains(a) || !self.contains(b) {
            return Err(MoveError::InvalidEdge);
        }
        Edge::between(a, b)
    }

    fn edge_slot(&self, edge: Edge) -> Option<usize> {
        let spans = self.grid_size - 1;
        match edge.orientation {
            Orientation::Horizontal if edge.row < self.grid_size && edge.col < spans => {
                Some(edge.row * spans + edge.col)
            }
            Orientation::Vertical if edge.row < spans && edge.col < self.grid_size => {
                Some(edge.row * self.grid_size + edge.col)
            }
            _ => None,
        }
    }

    fn box_slot(&self, coord: BoxCoord) -> Option<usize> {
        let spans = self.grid_size - 1;
        (coord.row < spans && coord.col < spans).then(|| coord.row * spans + coord.col)
    }

    /// Owner of an edge, if drawn.
    pub fn edge_owner(&self, edge: Edge) -> Option<PlayerNumber> {
        let slot = self.edge_slot(edge)?;
        match edge.orientation {
            Orientation::Horizontal => self.horizontal[slot],
            Orientation::Vertical => self.vertical[slot],
        }
    }

    /// Whether an edge has been drawn.
    pub fn is_edge_drawn(&self, edge: Edge) -> bool {
        self.edge_owner(edge).is_some()
    }

    /// Boxes bordering an edge: one for outer edges, two for interior ones.
    pub fn boxes_adjacent_to_edge(&self, edge: Edge) -> Vec<BoxCoord> {
        let spans = self.grid_size - 1;
        let mut boxes = Vec::with_capacity(2);
        match edge.orientation {
            Orientation::Horizontal => {
                if edge.row > 0 {
                    boxes.push(BoxCoord::new(edge.row - 1, edge.col));
                }
                if edge.row < spans {
                    boxes.push(BoxCoord::new(edge.row, edge.col));
                }
            }
            Orientation::Vertical => {
                if edge.col > 0 {
                    boxes.push(BoxCoord::new(edge.row, edge.col - 1));
                }
                if edge.col < spans {
                    boxes.push(BoxCoord::new(edge.row, edge.col));
                }
            }
        }
        boxes.retain(|b| self.box_slot(*b).is_some());
        boxes
    }

    /// Whether all four bounding edges of a box are drawn.
    pub fn is_box_complete(&self, coord: BoxCoord) -> bool {
        self.box_slot(coord).is_some() && coord.edges().iter().all(|e| self.is_edge_drawn(*e))
    }

    /// Owner of a box, if completed.
    pub fn box_owner(&self, coord: BoxCoord) -> Option<PlayerNumber> {
        self.box_slot(coord).and_then(|slot| self.boxes[slot].owner)
    }

    /// Number of owned boxes.
    pub fn owned_boxes(&self) -> usize {
        self.boxes.iter().filter(|b| b.owner.is_some()).count()
    }

    /// Whether every box has an owner.
    pub fn is_full(&self) -> bool {
        self.boxes.iter().all(|b| b.owner.is_some())
    }

    /// Mark an edge owned and award every box it completes.
    ///
    /// Returns the newly completed boxes (0, 1 or 2). Leaves the board
    /// untouched on error.
    pub fn draw(&mut self, edge: Edge, player: PlayerNumber) -> Result<Vec<BoxCoord>, MoveError> {
        let slot = self.edge_slot(edge).ok_or(MoveError::InvalidEdge)?;
        let cell = match edge.orientation {
            Orientation::Horizontal => &mut self.horizontal[slot],
            Orientation::Vertical => &mut self.vertical[slot],
        };
        if cell.is_some() {
            return Err(MoveError::EdgeAlreadyDrawn);
        }
        *cell = Some(player);

        let mut completed = Vec::new();
        for coord in self.boxes_adjacent_to_edge(edge) {
            let Some(box_slot) = self.box_slot(coord) else {
                continue;
            };
            let cell = &mut self.boxes[box_slot];
            cell.drawn += 1;
            if cell.drawn == EDGES_PER_BOX && cell.owner.is_none() {
                cell.owner = Some(player);
                completed.push(coord);
            }
        }
        Ok(completed)
    }

    /// Every drawn edge with its owner, horizontal edges first.
    pub fn drawn_edges(&self) -> Vec<(Edge, PlayerNumber)> {
        let spans = self.grid_size - 1;
        let horizontal = self.horizontal.iter().enumerate().filter_map(|(i, owner)| {
            owner.map(|p| {
                (
                    Edge {
                        orientation: Orientation::Horizontal,
                        row: i / spans,
                        col: i % spans,
                    },
                    p,
                )
            })
        });
        let vertical = self.vertical.iter().enumerate().filter_map(|(i, owner)| {
            owner.map(|p| {
                (
                    Edge {
                        orientation: Orientation::Vertical,
                        row: i / self.grid_size,
                        col: i % self.grid_size,
                    },
                    p,
                )
            })
        });
        horizontal.chain(vertical).collect()
    }

    /// Every owned box with its owner, row-major.
    pub fn owned(&self) -> Vec<(BoxCoord, PlayerNumber)> {
        let spans = self.grid_size - 1;
        self.boxes
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.owner.map(|p| (BoxCoord::new(i / spans, i % spans), p)))
            .collect()
    }

    /// Check that a box is owned iff its four edges are drawn.
    pub fn ownership_consistent(&self) -> bool {
        let spans = self.grid_size - 1;
        (0..spans).all(|row| {
            (0..spans).all(|col| {
                let coord = BoxCoord::new(row, col);
                self.box_owner(coord).is_some() == self.is_box_complete(coord)
            })
        })
    }
}
