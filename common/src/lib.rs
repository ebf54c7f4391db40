//! Plays Minesweeper from screen captures.
//!
//! Each turn a captured image is read into a [`Board`], the [`DecisionEngine`]
//! picks one square, and the square's anchor is clicked. Deduction is local to
//! each hint (see [`inference`]); when nothing is provably safe the engine
//! guesses the square with the lowest risk score.

pub mod board;
pub mod cell;
pub mod config;
pub mod decision;
pub mod inference;
pub mod player;
pub mod screen;
pub mod simulator;

pub use board::{Board, CellChange};
pub use cell::{Cell, CellState, Point};
pub use config::Config;
pub use decision::{Decision, DecisionEngine};
pub use inference::{Analysis, Candidate, Verdict, analyze};
pub use player::{GameReport, Player, StopReason};
pub use screen::{DisplayController, VisionExtractor};
pub use simulator::{Frame, FrameExtractor, GameState, Minefield, SimulatedScreen, Sprite};
