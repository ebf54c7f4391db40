use crate::board::Board;
use crate::cell::{Cell, Point};
use crate::inference::analyze;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// The square chosen for one turn, tagged with why it was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// The opening click of a game, picked at random.
    Opening(Cell),
    /// A square proven to hold no mine.
    Safe(Cell),
    /// The least risky square when nothing is proven safe.
    Guess(Cell),
    /// Nothing left worth clicking; the board is solved or stuck.
    NoMoves,
}

impl Decision {
    pub fn cell(&self) -> Option<&Cell> {
        match self {
            Decision::Opening(cell) | Decision::Safe(cell) | Decision::Guess(cell) => Some(cell),
            Decision::NoMoves => None,
        }
    }
}

/// Turn-by-turn click policy for one game.
///
/// Squares proven safe are queued and handed out first, one per turn, before
/// the board is analysed again. Only when an analysis yields nothing new does
/// the engine fall back to the least risky guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionEngine {
    is_first_move: bool,
    pending_safe_squares: VecDeque<Cell>,
    /// Anchors of every square handed out this game.
    returned_squares: BTreeSet<Point>,
    cached_best_guess: Option<Cell>,
    /// Set right after an analysis, cleared once something has been handed out.
    is_field_updated: bool,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionEngine {
    pub fn new() -> Self {
        DecisionEngine {
            is_first_move: true,
            pending_safe_squares: VecDeque::new(),
            returned_squares: BTreeSet::new(),
            cached_best_guess: None,
            is_field_updated: false,
        }
    }

    /// Deserializes an engine from bytes.
    pub fn deserialize(bts: &[u8]) -> anyhow::Result<Self> {
        Ok(bcs::from_bytes(bts)?)
    }

    /// Serializes the engine to bytes.
    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    /// Forgets everything about the previous game.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_first_move(&self) -> bool {
        self.is_first_move
    }

    /// Safe squares still waiting to be handed out, in order.
    pub fn pending(&self) -> impl Iterator<Item = &Cell> {
        self.pending_safe_squares.iter()
    }

    pub fn has_returned(&self, anchor: Point) -> bool {
        self.returned_squares.contains(&anchor)
    }

    /// Picks the square to click this turn.
    ///
    /// In order of preference: a random opening on the first turn, the next
    /// queued safe square, and finally the best guess of a fresh analysis of
    /// `board`. No square is ever returned twice within a game.
    pub fn decide_next_square<R: Rng + ?Sized>(&mut self, board: &Board, rng: &mut R) -> Decision {
        let decision = if self.is_first_move {
            self.is_first_move = false;
            Decision::Opening(self.pick_random_square(board, rng))
        } else if let Some(cell) = self.pick_safe_square() {
            self.is_field_updated = false;
            Decision::Safe(cell)
        } else if self.is_field_updated {
            self.is_field_updated = false;
            self.pick_best_valued_square()
        } else {
            self.update_field(board);
            self.is_field_updated = true;
            return self.decide_next_square(board, rng);
        };

        // Keep track of handed out squares so none is chosen twice.
        if let Some(cell) = decision.cell() {
            self.returned_squares.insert(cell.anchor);
        }
        decision
    }

    /// Analyses `board`, queues its new safe squares and caches its best guess.
    fn update_field(&mut self, board: &Board) {
        let analysis = analyze(board);

        let returned = &self.returned_squares;
        for cell in analysis.safe.iter().filter(|c| !returned.contains(&c.anchor)) {
            self.pending_safe_squares.push_back(*cell);
        }
        self.cached_best_guess = analysis.best_guess_where(|c| !returned.contains(&c.anchor));

        tracing::trace!(
            queued = self.pending_safe_squares.len(),
            mines = analysis.mines.len(),
            has_guess = self.cached_best_guess.is_some(),
            "field updated"
        );
    }

    fn pick_random_square<R: Rng + ?Sized>(&self, board: &Board, rng: &mut R) -> Cell {
        let index = rng.random_range(0..board.len());
        let cell = board.cells()[index];
        tracing::debug!(x = cell.anchor.x, y = cell.anchor.y, "chose random square");
        cell
    }

    fn pick_safe_square(&mut self) -> Option<Cell> {
        let cell = self.pending_safe_squares.pop_front()?;
        tracing::debug!(x = cell.anchor.x, y = cell.anchor.y, "chose safe square");
        Some(cell)
    }

    fn pick_best_valued_square(&self) -> Decision {
        match self.cached_best_guess {
            Some(cell) => {
                tracing::debug!(x = cell.anchor.x, y = cell.anchor.y, "chose best valued square");
                Decision::Guess(cell)
            }
            None => {
                tracing::debug!("no square left to choose");
                Decision::NoMoves
            }
        }
    }
}
