use clap::Parser;
use minesweeper_player::config::BoardConfig;
use minesweeper_player::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Autonomous Minesweeper player, run against a simulated game window.
#[derive(Debug, Parser)]
#[command(name = "minesweeper-player", version, about)]
struct Cli {
    /// Path to a YAML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of games to play.
    #[arg(long)]
    games: Option<usize>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    #[arg(long)]
    mines: Option<usize>,

    /// Seed for mine layouts and opening clicks.
    #[arg(long)]
    seed: Option<u64>,

    /// Pause after each click, in milliseconds.
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Give up on a game after this many clicks.
    #[arg(long)]
    max_turns: Option<usize>,

    /// Probability of a revealed tile being captured unreadable.
    #[arg(long)]
    smudge: Option<f64>,

    /// Print the final board of every game.
    #[arg(long)]
    show_board: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    if let Some(games) = cli.games {
        config.games = games;
    }
    if let Some(width) = cli.width {
        config.board.width = width;
    }
    if let Some(height) = cli.height {
        config.board.height = height;
    }
    if let Some(mines) = cli.mines {
        config.board.mines = mines;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.player.delay_ms = delay_ms;
    }
    if let Some(max_turns) = cli.max_turns {
        config.player.max_turns = max_turns;
    }
    if let Some(smudge) = cli.smudge {
        config.screen.smudge = smudge;
    }
    config.validate()?;

    init_logging(config.logging.level().unwrap_or(Level::INFO));

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let BoardConfig {
        width,
        height,
        mines,
    } = config.board.clone();
    println!("--- Autonomous Minesweeper Player ---");
    println!(
        "Playing {} game(s) on a {width}x{height} board with {mines} mines.",
        config.games
    );

    let screen = SimulatedScreen::new(
        Minefield::new(width, height, mines)?,
        StdRng::seed_from_u64(rng.random()),
    )
    .with_geometry(
        Point::new(config.screen.origin_x, config.screen.origin_y),
        config.screen.tile_px,
    )
    .with_smudge(config.screen.smudge);
    let mut player = Player::new(screen, FrameExtractor, config.player.clone());

    let mut wins = 0;
    for game in 1..=config.games {
        if game > 1 {
            player
                .controller_mut()
                .load(Minefield::new(width, height, mines)?);
        }

        let report = player.play_game(&mut rng)?;
        let field = player.controller().field();

        let result = match field.game_state {
            GameState::Won => {
                wins += 1;
                "won"
            }
            GameState::Lost => "hit a mine",
            GameState::Playing => "stopped early",
        };
        println!(
            "Game #{game}: {result} after {} clicks ({} safe, {} guesses, stop: {:?})",
            report.turns, report.safe_clicks, report.guesses, report.stop
        );

        if cli.show_board {
            print_board(field);
        }
    }

    println!("\n--- Done ---");
    println!("Won {wins} of {} game(s).", config.games);
    Ok(())
}

fn init_logging(level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    // Ignore the error if a global subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn print_board(field: &Minefield) {
    print!("   ");
    for x in 0..field.width {
        print!("{:^3}", x);
    }
    println!("\n  +{}", "---".repeat(field.width));

    for y in 0..field.height {
        print!("{:^2}|", y);
        for x in 0..field.width {
            let at = Point::new(x, y);
            let display = match field.visible(at) {
                Some(n) => format!(" {} ", n),
                None if field.game_state == GameState::Lost && field.is_mine(at) => {
                    " * ".to_string()
                }
                None => " ■ ".to_string(),
            };
            print!("{}", display);
        }
        println!();
    }
    println!();
}
