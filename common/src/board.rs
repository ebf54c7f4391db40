use crate::cell::{Cell, CellState, MAX_HINT, Point};
use itertools::{Itertools, iproduct};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A rectangular snapshot of the visible board, stored row-major.
///
/// A `Board` is only ever built through validating constructors, so the
/// engines downstream can rely on it being non-empty, rectangular and
/// holding hints within `0..=8`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

/// A cell whose observed state differs between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellChange {
    /// Grid position of the change.
    pub at: Point,
    pub before: Cell,
    pub after: Cell,
}

impl Board {
    /// Builds a snapshot from rows of cells as delivered by a vision extractor.
    pub fn new(rows: Vec<Vec<Cell>>) -> anyhow::Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            anyhow::bail!("empty_board");
        }
        if let Some((index, row)) = rows.iter().find_position(|row| row.len() != width) {
            anyhow::bail!(
                "ragged_board: row {index} has {} cells, expected {width}",
                row.len()
            );
        }

        let cells: Vec<Cell> = rows.into_iter().flatten().collect();
        if let Some(cell) = cells
            .iter()
            .find(|cell| cell.value().is_some_and(|value| value > MAX_HINT))
        {
            anyhow::bail!(
                "hint_out_of_range: {:?} at ({}, {})",
                cell.state,
                cell.anchor.x,
                cell.anchor.y
            );
        }

        Ok(Board {
            width,
            height,
            cells,
        })
    }

    /// Builds a snapshot from a flat row-major list where `-1` marks an
    /// unchecked cell and `0..=8` a revealed hint. Anchors are grid points.
    pub fn from_values(width: usize, values: &[i8]) -> anyhow::Result<Self> {
        if width == 0 || values.is_empty() {
            anyhow::bail!("empty_board");
        }
        if values.len() % width != 0 {
            anyhow::bail!(
                "ragged_board: {} values do not fill rows of {width}",
                values.len()
            );
        }

        let mut rows = Vec::with_capacity(values.len() / width);
        for (y, chunk) in values.chunks(width).enumerate() {
            let mut row = Vec::with_capacity(width);
            for (x, &value) in chunk.iter().enumerate() {
                let anchor = Point { x, y };
                let cell = match value {
                    -1 => Cell::unchecked(anchor),
                    0..=8 => Cell::revealed(anchor, value as u8),
                    other => anyhow::bail!("hint_out_of_range: {other} at ({x}, {y})"),
                };
                row.push(cell);
            }
            rows.push(row);
        }
        Board::new(rows)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of positions on the board.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width)
    }

    /// The cell at a grid position, if it lies on the board.
    pub fn get(&self, at: Point) -> Option<&Cell> {
        self.index_of(at).map(|index| &self.cells[index])
    }

    pub fn index_of(&self, at: Point) -> Option<usize> {
        (at.x < self.width && at.y < self.height).then(|| at.y * self.width + at.x)
    }

    pub fn point_of(&self, index: usize) -> Point {
        Point {
            x: index % self.width,
            y: index / self.width,
        }
    }

    pub fn unchecked_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_unchecked()).count()
    }

    /// Indices of the up to eight cells around `index`.
    /// Edges and corners simply have fewer neighbors; there is no wraparound.
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + use<> {
        grid_neighbors(self.width, self.height, index)
    }

    /// Cells that changed state between `self` and a later snapshot `next`.
    pub fn diff(&self, next: &Board) -> anyhow::Result<Vec<CellChange>> {
        if self.width != next.width || self.height != next.height {
            anyhow::bail!(
                "shape_mismatch: {}x{} vs {}x{}",
                self.width,
                self.height,
                next.width,
                next.height
            );
        }

        Ok(self
            .cells
            .iter()
            .zip_eq(&next.cells)
            .enumerate()
            .filter(|(_, (before, after))| before.state != after.state)
            .map(|(index, (&before, &after))| CellChange {
                at: self.point_of(index),
                before,
                after,
            })
            .collect())
    }
}

/// Neighbor indices of `index` on a row-major `width` x `height` grid.
pub(crate) fn grid_neighbors(
    width: usize,
    height: usize,
    index: usize,
) -> impl Iterator<Item = usize> {
    let x = index % width;
    let y = index / width;
    let rows = y.saturating_sub(1)..=(y + 1).min(height - 1);
    let columns = x.saturating_sub(1)..=(x + 1).min(width - 1);

    // Row-major, clipped at the edges.
    iproduct!(rows, columns)
        .filter(move |&(ny, nx)| (nx, ny) != (x, y))
        .map(move |(ny, nx)| ny * width + nx)
}

/// Parses the compact text form used by `Display`: one line per row,
/// digits for revealed hints and `#`, `?` or `.` for unchecked cells.
/// Whitespace inside a line is ignored. Anchors are grid points.
impl FromStr for Board {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rows = Vec::new();
        for line in s.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let y = rows.len();
            let mut row = Vec::new();
            for glyph in line.chars().filter(|c| !c.is_whitespace()) {
                let anchor = Point { x: row.len(), y };
                let cell = match glyph {
                    '#' | '?' | '.' => Cell::unchecked(anchor),
                    digit if digit.is_ascii_digit() => {
                        Cell::revealed(anchor, digit as u8 - b'0')
                    }
                    other => anyhow::bail!("bad_glyph: {other:?} at ({}, {y})", anchor.x),
                };
                row.push(cell);
            }
            rows.push(row);
        }
        Board::new(rows)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line = row
                .iter()
                .map(|cell| match cell.state {
                    CellState::Unchecked => '#',
                    CellState::Revealed(n) => char::from(b'0' + n),
                })
                .join(" ");
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
