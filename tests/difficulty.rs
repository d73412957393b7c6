use pretty_assertions::assert_eq;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tutorbot::difficulty::{blunder_probability, standard_catalog, BLUNDER_THRESHOLD};
use tutorbot::{BotSession, DifficultyController, EngineConfig, EngineError, LevelInfo};

const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[test]
fn depth_and_time_never_decrease_with_level() {
    let c = DifficultyController::default();
    assert_eq!((c.min_level(), c.max_level()), (1, 30));
    for pair in c.profiles().windows(2) {
        assert!(pair[1].depth_cap >= pair[0].depth_cap, "depth drops at level {}", pair[1].level);
        assert!(pair[1].time_budget_ms >= pair[0].time_budget_ms, "time drops at level {}", pair[1].level);
    }
    assert!(c.profile(30).unwrap().depth_cap > c.profile(1).unwrap().depth_cap);
}

#[test]
fn blunder_rate_falls_to_zero() {
    assert!((blunder_probability(1) - 0.5).abs() < 1e-9);
    assert!((blunder_probability(5) - 0.3).abs() < 1e-9);
    for level in 1..BLUNDER_THRESHOLD {
        assert!(blunder_probability(level) > blunder_probability(level + 1));
    }
    for level in BLUNDER_THRESHOLD..=30 {
        assert_eq!(blunder_probability(level), 0.0);
    }
}

#[test]
fn blunder_frequency_tracks_probability() {
    let c = DifficultyController::default();
    let profile = c.profile(1).unwrap();
    let mut rng = SmallRng::seed_from_u64(11);
    let hits = (0..4000).filter(|_| DifficultyController::should_blunder(profile, &mut rng)).count();
    assert!((1700..=2300).contains(&hits), "level 1 blundered {hits}/4000");

    let strong = c.profile(15).unwrap();
    assert!((0..1000).all(|_| !DifficultyController::should_blunder(strong, &mut rng)));
}

#[test]
fn out_of_range_levels_are_rejected() {
    let mut session = BotSession::new(EngineConfig::default().with_seed(1)).unwrap();
    for level in [0, 31, -5] {
        let err = session.get_best_move(START, level).unwrap_err();
        assert_eq!(err, EngineError::InvalidLevel { level, min: 1, max: 30 });
    }
    // the level is checked before the notation
    let err = session.get_best_move("garbage", 99).unwrap_err();
    assert!(matches!(err, EngineError::InvalidLevel { level: 99, .. }));
}

#[test]
fn catalog_lists_every_level() {
    let session = BotSession::new(EngineConfig::default().with_seed(1)).unwrap();
    let catalog = session.level_catalog();
    assert_eq!(catalog.len(), standard_catalog().len());
    assert_eq!(catalog[0], LevelInfo { level: 1, depth: 1, time_budget_ms: 500 });
    assert_eq!(catalog[29], LevelInfo { level: 30, depth: 6, time_budget_ms: 7750 });
    let json = serde_json::to_value(catalog[2]).unwrap();
    assert_eq!(json, serde_json::json!({ "level": 3, "depth": 1, "timeBudgetMs": 1000 }));
}
