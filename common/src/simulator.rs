//! An in-process stand-in for the real game window, so the player can be run
//! and tested without a screen.
//!
//! [`Minefield`] holds the hidden truth and the game rules, [`SimulatedScreen`]
//! renders it into [`Frame`]s in pixel space and turns pixel clicks back into
//! reveals, and [`FrameExtractor`] reads frames back into boards.

use crate::board::{Board, grid_neighbors};
use crate::cell::{Cell, Point};
use crate::screen::{DisplayController, VisionExtractor};
use rand::Rng;
use rand::prelude::IndexedRandom;
use std::collections::{HashSet, VecDeque};

/// Whether the simulated game is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// The hidden minefield behind a simulated game.
#[derive(Debug, Clone)]
pub struct Minefield {
    pub width: usize,
    pub height: usize,
    pub total_mines: usize,
    /// Mine layout; empty until the first reveal places the mines.
    mines: Vec<bool>,
    /// What the player can see: `Some(n)` once revealed.
    visible: Vec<Option<u8>>,
    pub game_state: GameState,
}

impl Minefield {
    /// A fresh game whose mines are placed on the first reveal, away from
    /// the clicked cell.
    pub fn new(width: usize, height: usize, total_mines: usize) -> anyhow::Result<Self> {
        if width == 0 || height == 0 {
            anyhow::bail!("empty_board");
        }
        let Some(cells) = width.checked_mul(height) else {
            anyhow::bail!("board_too_large: {width}x{height}");
        };
        if total_mines >= cells {
            anyhow::bail!("too_many_mines: {total_mines} for {width}x{height}");
        }
        Ok(Minefield {
            width,
            height,
            total_mines,
            mines: Vec::new(),
            visible: vec![None; cells],
            game_state: GameState::Playing,
        })
    }

    /// A game with a fixed mine layout.
    pub fn with_mines(width: usize, height: usize, mines: &[Point]) -> anyhow::Result<Self> {
        let mut field = Minefield::new(width, height, mines.len())?;
        field.mines = vec![false; width * height];
        for &point in mines {
            let index = field
                .index_of(point)
                .ok_or_else(|| anyhow::anyhow!("mine_out_of_bounds: ({}, {})", point.x, point.y))?;
            field.mines[index] = true;
        }
        field.total_mines = field.mines.iter().filter(|&&mine| mine).count();
        Ok(field)
    }

    fn index_of(&self, at: Point) -> Option<usize> {
        (at.x < self.width && at.y < self.height).then(|| at.y * self.width + at.x)
    }

    fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + use<> {
        grid_neighbors(self.width, self.height, index)
    }

    pub fn is_mine(&self, at: Point) -> bool {
        self.index_of(at)
            .is_some_and(|index| self.mines.get(index).copied().unwrap_or(false))
    }

    /// The hint shown at `at`, if it has been revealed.
    pub fn visible(&self, at: Point) -> Option<u8> {
        self.index_of(at).and_then(|index| self.visible[index])
    }

    /// The visible state as a board with grid anchors.
    pub fn board(&self) -> anyhow::Result<Board> {
        let rows = self
            .visible
            .chunks(self.width)
            .enumerate()
            .map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .map(|(x, value)| match value {
                        Some(n) => Cell::revealed(Point { x, y }, *n),
                        None => Cell::unchecked(Point { x, y }),
                    })
                    .collect()
            })
            .collect();
        Board::new(rows)
    }

    /// Reveals the cell at `at`.
    ///
    /// Returns `Ok(false)` when a mine was hit. Revealing a zero cascades to
    /// its neighbours, and revealing the last safe cell wins the game.
    pub fn reveal<R: Rng + ?Sized>(&mut self, at: Point, rng: &mut R) -> anyhow::Result<bool> {
        let Some(index) = self.index_of(at) else {
            anyhow::bail!("out_of_bounds: ({}, {})", at.x, at.y);
        };
        if self.visible[index].is_some() {
            return Ok(true);
        }
        if self.game_state != GameState::Playing {
            anyhow::bail!("game_ended");
        }

        if self.mines.is_empty() {
            self.place_mines(index, rng);
        }

        if self.mines[index] {
            self.game_state = GameState::Lost;
            return Ok(false);
        }

        self.flood_fill_reveal(index);

        if self.check_win_condition() {
            self.game_state = GameState::Won;
        }
        Ok(true)
    }

    /// Places the mines anywhere but the first click and, when there is room,
    /// its neighbours.
    fn place_mines<R: Rng + ?Sized>(&mut self, first_click: usize, rng: &mut R) {
        let mut safe_area: HashSet<usize> = self.neighbors(first_click).collect();
        safe_area.insert(first_click);
        if self.width * self.height - safe_area.len() < self.total_mines {
            safe_area = HashSet::from([first_click]);
        }

        let spots: Vec<usize> = (0..self.width * self.height)
            .filter(|index| !safe_area.contains(index))
            .collect();

        self.mines = vec![false; self.width * self.height];
        for &index in spots.choose_multiple(rng, self.total_mines) {
            self.mines[index] = true;
        }
    }

    fn count_adjacent_mines(&self, index: usize) -> u8 {
        self.neighbors(index).filter(|&n| self.mines[n]).count() as u8
    }

    fn flood_fill_reveal(&mut self, start: usize) {
        let mut queue = VecDeque::from([start]);
        let mut visited = HashSet::from([start]);

        while let Some(index) = queue.pop_front() {
            if self.visible[index].is_some() {
                continue;
            }

            let mine_count = self.count_adjacent_mines(index);
            self.visible[index] = Some(mine_count);

            // Zeros keep the cascade going.
            if mine_count == 0 {
                for neighbor in self.neighbors(index) {
                    if !self.mines[neighbor]
                        && self.visible[neighbor].is_none()
                        && visited.insert(neighbor)
                    {
                        queue.push_back(neighbor);
                    }
                }
            }
        }
    }

    /// The game is won once every cell without a mine is revealed.
    pub fn check_win_condition(&self) -> bool {
        let revealed = self.visible.iter().filter(|value| value.is_some()).count();
        !self.mines.is_empty() && revealed == self.width * self.height - self.total_mines
    }
}

/// What a single tile looks like on a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sprite {
    Covered,
    Open(u8),
    /// Only drawn once the game is lost.
    Mine,
    /// A tile the capture garbled.
    Smudged,
}

/// A simulated screenshot of the game window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Pixel position of the board's top-left corner.
    pub origin: Point,
    /// Edge length of one tile in pixels.
    pub tile_px: usize,
    /// Tiles per row.
    pub columns: usize,
    /// Tiles in row-major order.
    pub sprites: Vec<Sprite>,
    /// The status face above the board.
    pub face: GameState,
}

/// A fake game window backed by a [`Minefield`].
pub struct SimulatedScreen<R> {
    field: Minefield,
    origin: Point,
    tile_px: usize,
    smudge: f64,
    clicks: usize,
    rng: R,
}

impl<R: Rng> SimulatedScreen<R> {
    pub fn new(field: Minefield, rng: R) -> Self {
        SimulatedScreen {
            field,
            origin: Point { x: 12, y: 55 },
            tile_px: 16,
            smudge: 0.0,
            clicks: 0,
            rng,
        }
    }

    /// Places the board at `origin` with square tiles of `tile_px` pixels.
    pub fn with_geometry(mut self, origin: Point, tile_px: usize) -> Self {
        self.origin = origin;
        self.tile_px = tile_px.max(1);
        self
    }

    /// Probability that a revealed tile is captured garbled.
    pub fn with_smudge(mut self, smudge: f64) -> Self {
        self.smudge = smudge.clamp(0.0, 1.0);
        self
    }

    /// Starts a new game on the same window.
    pub fn load(&mut self, field: Minefield) {
        self.field = field;
        self.clicks = 0;
    }

    pub fn field(&self) -> &Minefield {
        &self.field
    }

    pub fn clicks(&self) -> usize {
        self.clicks
    }

    /// Maps a pixel position to the tile under it.
    fn to_grid(&self, position: Point) -> Option<Point> {
        let x = position.x.checked_sub(self.origin.x)? / self.tile_px;
        let y = position.y.checked_sub(self.origin.y)? / self.tile_px;
        (x < self.field.width && y < self.field.height).then_some(Point { x, y })
    }
}

impl<R: Rng> DisplayController for SimulatedScreen<R> {
    type Image = Frame;

    fn capture(&mut self) -> anyhow::Result<Frame> {
        let lost = self.field.game_state == GameState::Lost;
        let mut sprites = Vec::with_capacity(self.field.width * self.field.height);
        for y in 0..self.field.height {
            for x in 0..self.field.width {
                let at = Point { x, y };
                let sprite = match self.field.visible(at) {
                    Some(_) if self.smudge > 0.0 && self.rng.random_bool(self.smudge) => {
                        Sprite::Smudged
                    }
                    Some(n) => Sprite::Open(n),
                    None if lost && self.field.is_mine(at) => Sprite::Mine,
                    None => Sprite::Covered,
                };
                sprites.push(sprite);
            }
        }

        Ok(Frame {
            origin: self.origin,
            tile_px: self.tile_px,
            columns: self.field.width,
            sprites,
            face: self.field.game_state,
        })
    }

    fn click(&mut self, position: Point) -> anyhow::Result<()> {
        let Some(at) = self.to_grid(position) else {
            anyhow::bail!("click_outside_board: ({}, {})", position.x, position.y);
        };
        self.clicks += 1;
        let survived = self.field.reveal(at, &mut self.rng)?;
        tracing::trace!(x = at.x, y = at.y, survived, "simulated click");
        Ok(())
    }
}

/// Reads boards out of simulated frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameExtractor;

impl VisionExtractor<Frame> for FrameExtractor {
    fn get_field_information(&self, frame: &Frame) -> anyhow::Result<Board> {
        if frame.columns == 0 || frame.sprites.is_empty() || frame.sprites.len() % frame.columns != 0
        {
            anyhow::bail!("board_not_found");
        }

        let half = frame.tile_px / 2;
        let rows = frame
            .sprites
            .chunks(frame.columns)
            .enumerate()
            .map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .map(|(x, sprite)| {
                        let anchor = Point {
                            x: frame.origin.x + x * frame.tile_px + half,
                            y: frame.origin.y + y * frame.tile_px + half,
                        };
                        match sprite {
                            Sprite::Open(n) => Cell::revealed(anchor, *n),
                            Sprite::Covered | Sprite::Mine | Sprite::Smudged => {
                                Cell::unchecked(anchor)
                            }
                        }
                    })
                    .collect()
            })
            .collect();
        Board::new(rows)
    }

    /// A won or lost face, or any exposed mine, ends the game. A won board
    /// keeps its mines covered, so the face is the only sign of a win.
    fn is_finished(&self, frame: &Frame) -> bool {
        frame.face != GameState::Playing || frame.sprites.contains(&Sprite::Mine)
    }
}
