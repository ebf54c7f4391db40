use minesweeper_player::config::PlayerConfig;
use minesweeper_player::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn play(
    seed: u64,
    width: usize,
    height: usize,
    mines: usize,
    smudge: f64,
) -> (GameReport, GameState, usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let field = Minefield::new(width, height, mines).unwrap();
    let screen =
        SimulatedScreen::new(field, StdRng::seed_from_u64(seed ^ 0xfeed)).with_smudge(smudge);
    let mut player = Player::new(screen, FrameExtractor, PlayerConfig::default());

    let report = player.play_game(&mut rng).unwrap();
    let screen = player.controller();
    (report, screen.field().game_state, screen.clicks())
}

#[test]
fn test_games_run_to_completion() {
    for seed in 0..20 {
        let (report, state, clicks) = play(seed, 9, 9, 10, 0.0);

        assert_eq!(report.openings, 1, "seed {seed}");
        assert_eq!(clicks, report.turns, "seed {seed}");
        assert!(report.turns <= 81, "seed {seed}");
        match report.stop {
            StopReason::Finished => assert_ne!(state, GameState::Playing, "seed {seed}"),
            StopReason::NoMoves => {}
            other => panic!("seed {seed}: unexpected stop {other:?}"),
        }
    }
}

#[test]
fn test_deductions_match_the_hidden_field() {
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut field = Minefield::new(16, 16, 40).unwrap();
        let mut engine = DecisionEngine::new();

        while field.game_state == GameState::Playing {
            let board = field.board().unwrap();
            // Mines are laid out by the opening click.
            if !engine.is_first_move() {
                let analysis = analyze(&board);
                for cell in &analysis.safe {
                    assert!(!field.is_mine(cell.anchor), "seed {seed}: {cell:?} is a mine");
                }
                for cell in &analysis.mines {
                    assert!(field.is_mine(cell.anchor), "seed {seed}: {cell:?} is empty");
                }
            }

            let decision = engine.decide_next_square(&board, &mut rng);
            let Some(at) = decision.cell().map(|cell| cell.anchor) else {
                break;
            };
            let survived = field.reveal(at, &mut rng).unwrap();
            if !survived {
                assert!(
                    matches!(decision, Decision::Guess(_) | Decision::Opening(_)),
                    "seed {seed}: lost on {decision:?}"
                );
            }
        }
    }
}

#[test]
fn test_garbled_captures_do_not_break_the_loop() {
    for seed in 0..10 {
        let (report, _, clicks) = play(seed, 9, 9, 10, 0.2);

        assert_eq!(clicks, report.turns, "seed {seed}");
        assert!(report.turns <= 81, "seed {seed}");
        assert!(
            matches!(report.stop, StopReason::Finished | StopReason::NoMoves),
            "seed {seed}: {:?}",
            report.stop
        );
    }
}
