use serde::{Deserialize, Serialize};

/// Highest hint a revealed cell can show.
pub const MAX_HINT: u8 = 8;

/// Represents a 2D coordinate, either on the grid or in image space.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Point { x, y }
    }
}

/// What the extractor saw at one board position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Not clicked yet, or not classifiable.
    Unchecked,
    Revealed(u8), // The u8 is the number of adjacent mines.
}

/// One observed square of a board snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Where to click this cell, in the coordinate space of the captured image.
    pub anchor: Point,
    pub state: CellState,
}

impl Cell {
    pub const fn unchecked(anchor: Point) -> Self {
        Cell {
            anchor,
            state: CellState::Unchecked,
        }
    }

    pub const fn revealed(anchor: Point, value: u8) -> Self {
        Cell {
            anchor,
            state: CellState::Revealed(value),
        }
    }

    pub fn is_unchecked(&self) -> bool {
        matches!(self.state, CellState::Unchecked)
    }

    pub fn is_revealed(&self) -> bool {
        !self.is_unchecked()
    }

    /// The hint shown on the cell, `None` while it is unchecked.
    pub fn value(&self) -> Option<u8> {
        match self.state {
            CellState::Unchecked => None,
            CellState::Revealed(value) => Some(value),
        }
    }
}
