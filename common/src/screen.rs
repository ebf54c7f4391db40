//! Seams to the world outside the decision core: something that can look at
//! the game and click on it, and something that can read a board out of what
//! was seen.

use crate::board::Board;
use crate::cell::Point;

/// Captures the game window and injects clicks into it.
pub trait DisplayController {
    /// Whatever a capture produces, e.g. a screenshot.
    type Image;

    /// Brings the game to the front and captures it.
    fn capture(&mut self) -> anyhow::Result<Self::Image>;

    /// Clicks at `position`, given in the coordinate space of [`Self::Image`].
    /// Translating that into device input is the controller's job.
    fn click(&mut self, position: Point) -> anyhow::Result<()>;
}

/// Turns captured images into board snapshots.
pub trait VisionExtractor<I> {
    /// Reads the board shown in `image`.
    ///
    /// Tiles that cannot be classified must come back as unchecked cells so
    /// the board stays rectangular. An error means no board could be found at
    /// all, which callers treat as the end of the game.
    fn get_field_information(&self, image: &I) -> anyhow::Result<Board>;

    /// Whether `image` shows a finished game, won or lost.
    fn is_finished(&self, image: &I) -> bool;
}
