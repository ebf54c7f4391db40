use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::Level;

/// Root configuration, loaded from YAML. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of games to play back to back.
    pub games: usize,
    /// Seed for mine layouts and opening clicks; random when absent.
    pub seed: Option<u64>,
    pub board: BoardConfig,
    pub screen: ScreenConfig,
    pub player: PlayerConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            games: 1,
            seed: None,
            board: BoardConfig::default(),
            screen: ScreenConfig::default(),
            player: PlayerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("opening config file {}", path.display()))?;
        let config: Config = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validating config file {}", path.display()))?;
        Ok(config)
    }

    /// Checks value ranges without performing I/O.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.games == 0 {
            anyhow::bail!("games must be greater than zero");
        }
        self.board.validate()?;
        self.screen.validate()?;
        self.player.validate()?;
        if self.logging.level().is_none() {
            anyhow::bail!("unknown logging level '{}'", self.logging.level);
        }
        Ok(())
    }
}

/// Shape of the simulated game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        // Intermediate difficulty.
        BoardConfig {
            width: 16,
            height: 16,
            mines: 40,
        }
    }
}

impl BoardConfig {
    fn validate(&self) -> anyhow::Result<()> {
        if self.width == 0 || self.height == 0 {
            anyhow::bail!("board dimensions must be greater than zero");
        }
        let Some(cells) = self.width.checked_mul(self.height) else {
            anyhow::bail!("a {}x{} board is too large", self.width, self.height);
        };
        if self.mines >= cells {
            anyhow::bail!(
                "{} mines do not fit on a {}x{} board",
                self.mines,
                self.width,
                self.height
            );
        }
        Ok(())
    }
}

/// Geometry and capture quality of the simulated window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub origin_x: usize,
    pub origin_y: usize,
    pub tile_px: usize,
    /// Probability of a revealed tile being captured unreadable.
    pub smudge: f64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        ScreenConfig {
            origin_x: 12,
            origin_y: 55,
            tile_px: 16,
            smudge: 0.0,
        }
    }
}

impl ScreenConfig {
    fn validate(&self) -> anyhow::Result<()> {
        if self.tile_px == 0 {
            anyhow::bail!("tile size must be greater than zero");
        }
        if !(0.0..=1.0).contains(&self.smudge) {
            anyhow::bail!("smudge must lie within [0, 1], got {}", self.smudge);
        }
        Ok(())
    }
}

/// Pacing of the game loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Pause after each click so the game can settle before the next capture.
    pub delay_ms: u64,
    /// Give up on a game after this many clicks.
    pub max_turns: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            delay_ms: 0,
            max_turns: 10_000,
        }
    }
}

impl PlayerConfig {
    fn validate(&self) -> anyhow::Result<()> {
        if self.max_turns == 0 {
            anyhow::bail!("max_turns must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level(&self) -> Option<Level> {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}
