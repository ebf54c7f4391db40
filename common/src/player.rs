use crate::board::Board;
use crate::config::PlayerConfig;
use crate::decision::{Decision, DecisionEngine};
use crate::screen::{DisplayController, VisionExtractor};
use rand::Rng;
use std::thread;
use std::time::Duration;

/// Why a game loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The window reported a won or lost game.
    Finished,
    /// The decision engine had nothing left to click.
    NoMoves,
    /// No board could be read from the capture.
    BoardLost,
    /// The configured turn limit was reached.
    TurnLimit,
}

/// Summary of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameReport {
    pub turns: usize,
    pub openings: usize,
    pub safe_clicks: usize,
    pub guesses: usize,
    /// Captures that looked exactly like the one before the last click.
    pub unchanged_frames: usize,
    pub stop: StopReason,
}

/// Drives a game: capture, read the board, decide, click, wait.
pub struct Player<C, V> {
    controller: C,
    vision: V,
    engine: DecisionEngine,
    config: PlayerConfig,
}

impl<C, V> Player<C, V>
where
    C: DisplayController,
    V: VisionExtractor<C::Image>,
{
    pub fn new(controller: C, vision: V, config: PlayerConfig) -> Self {
        Player {
            controller,
            vision,
            engine: DecisionEngine::new(),
            config,
        }
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    /// Plays one game from a fresh board until it finishes or stalls.
    pub fn play_game<R: Rng + ?Sized>(&mut self, rng: &mut R) -> anyhow::Result<GameReport> {
        self.engine.reset();
        let delay = Duration::from_millis(self.config.delay_ms);

        let mut turns = 0;
        let mut openings = 0;
        let mut safe_clicks = 0;
        let mut guesses = 0;
        let mut unchanged_frames = 0;
        let mut previous: Option<Board> = None;

        tracing::info!("game started");
        let stop = loop {
            if turns >= self.config.max_turns {
                break StopReason::TurnLimit;
            }

            let image = self.controller.capture()?;
            if self.vision.is_finished(&image) {
                break StopReason::Finished;
            }
            let board = match self.vision.get_field_information(&image) {
                Ok(board) => board,
                Err(err) => {
                    tracing::warn!(error = %err, "no board on screen, assuming the game is over");
                    break StopReason::BoardLost;
                }
            };

            if let Some(previous) = &previous {
                match previous.diff(&board) {
                    Ok(changes) if changes.is_empty() => {
                        unchanged_frames += 1;
                        tracing::warn!(turn = turns, "board unchanged since the last click");
                    }
                    Ok(changes) => tracing::trace!(turn = turns, changed = changes.len()),
                    Err(err) => tracing::warn!(error = %err, "board layout changed"),
                }
            }

            let decision = self.engine.decide_next_square(&board, rng);
            let cell = match decision {
                Decision::Opening(cell) => {
                    openings += 1;
                    cell
                }
                Decision::Safe(cell) => {
                    safe_clicks += 1;
                    cell
                }
                Decision::Guess(cell) => {
                    guesses += 1;
                    cell
                }
                Decision::NoMoves => break StopReason::NoMoves,
            };

            tracing::debug!(turn = turns, ?decision, "clicking");
            self.controller.click(cell.anchor)?;
            turns += 1;
            previous = Some(board);

            if !delay.is_zero() {
                thread::sleep(delay);
            }
        };

        tracing::info!(turns, openings, safe_clicks, guesses, ?stop, "game over");
        Ok(GameReport {
            turns,
            openings,
            safe_clicks,
            guesses,
            unchanged_frames,
            stop,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Point;
    use crate::simulator::{Frame, FrameExtractor, GameState, Minefield, SimulatedScreen, Sprite};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn player(field: Minefield, max_turns: usize) -> Player<SimulatedScreen<StdRng>, FrameExtractor> {
        let screen = SimulatedScreen::new(field, StdRng::seed_from_u64(0));
        let config = PlayerConfig {
            delay_ms: 0,
            max_turns,
        };
        Player::new(screen, FrameExtractor, config)
    }

    #[test]
    fn test_plays_a_trivial_game_to_the_end() {
        let mut rng = StdRng::seed_from_u64(1);
        let field = Minefield::with_mines(4, 4, &[]).unwrap();
        let mut player = player(field, 100);

        let report = player.play_game(&mut rng).unwrap();
        // A mine free board opens in one click.
        assert_eq!(report.turns, 1);
        assert_eq!(report.openings, 1);
        assert_eq!(report.stop, StopReason::Finished);
        assert_eq!(player.controller().field().game_state, GameState::Won);
    }

    #[test]
    fn test_turn_limit() {
        let mut rng = StdRng::seed_from_u64(1);
        let field = Minefield::new(9, 9, 10).unwrap();
        let mut player = player(field, 1);

        let report = player.play_game(&mut rng).unwrap();
        assert_eq!(report.turns, 1);
        assert_eq!(report.stop, StopReason::TurnLimit);
    }

    #[test]
    fn test_engine_is_reset_between_games() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut player = player(Minefield::with_mines(3, 3, &[]).unwrap(), 10);
        player.play_game(&mut rng).unwrap();

        player
            .controller_mut()
            .load(Minefield::with_mines(3, 3, &[]).unwrap());
        let report = player.play_game(&mut rng).unwrap();
        // Without a reset the second game would not start with an opening.
        assert_eq!(report.openings, 1);
        assert_eq!(report.stop, StopReason::Finished);
    }

    /// A window that always shows the same frame.
    struct StaticScreen {
        frame: Frame,
        clicks: Vec<Point>,
    }

    impl DisplayController for StaticScreen {
        type Image = Frame;

        fn capture(&mut self) -> anyhow::Result<Frame> {
            Ok(self.frame.clone())
        }

        fn click(&mut self, position: Point) -> anyhow::Result<()> {
            self.clicks.push(position);
            Ok(())
        }
    }

    fn static_player(sprites: Vec<Sprite>, columns: usize) -> Player<StaticScreen, FrameExtractor> {
        let frame = Frame {
            origin: Point::new(0, 0),
            tile_px: 2,
            columns,
            sprites,
            face: GameState::Playing,
        };
        let screen = StaticScreen {
            frame,
            clicks: Vec::new(),
        };
        Player::new(screen, FrameExtractor, PlayerConfig::default())
    }

    #[test]
    fn test_stops_when_nothing_is_left() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut player = static_player(vec![Sprite::Open(0); 4], 2);

        let report = player.play_game(&mut rng).unwrap();
        assert_eq!(report.openings, 1);
        assert_eq!(report.turns, 1);
        assert_eq!(report.stop, StopReason::NoMoves);
    }

    #[test]
    fn test_stale_frames_never_cause_repeat_clicks() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut sprites = vec![Sprite::Covered; 9];
        sprites[4] = Sprite::Open(1);
        let mut player = static_player(sprites, 3);

        let report = player.play_game(&mut rng).unwrap();
        assert_eq!(report.stop, StopReason::NoMoves);
        // Every capture after the first click saw the same frame again.
        assert_eq!(report.unchanged_frames, report.turns);

        let clicks = &player.controller().clicks;
        let unique: std::collections::HashSet<_> = clicks.iter().collect();
        assert_eq!(unique.len(), clicks.len());
        assert!(clicks.len() >= 8);
    }

    #[test]
    fn test_stops_when_board_disappears() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut player = static_player(Vec::new(), 0);

        let report = player.play_game(&mut rng).unwrap();
        assert_eq!(report.turns, 0);
        assert_eq!(report.stop, StopReason::BoardLost);
    }
}
