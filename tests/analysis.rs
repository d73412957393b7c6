use pretty_assertions::assert_eq;
use tutorbot::{BotSession, EngineConfig, EngineError, MoveQuality, OracleError, Position};

const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const ITALIAN: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";
const MATE_IN_ONE: &str = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";

fn session() -> BotSession {
    BotSession::new(EngineConfig::default().with_seed(31)).unwrap()
}

fn replay(fen: &str, line: &[String]) -> Position {
    let mut pos = Position::from_fen(fen).unwrap();
    for text in line {
        let mv = pos.parse_uci(text).unwrap_or_else(|e| panic!("{text} after {}: {e}", pos.fen()));
        pos = pos.play(&mv).unwrap();
    }
    pos
}

#[test]
fn mate_in_one_analysis() {
    let analysis = session().analyze_position(MATE_IN_ONE).unwrap();
    assert_eq!(analysis.best_move.as_deref(), Some("a1a8"));
    assert_eq!(analysis.principal_variation, vec!["a1a8".to_string()]);
    assert_eq!(analysis.evaluation, 200.0);
    assert_eq!(analysis.depth, 2);
}

#[test]
fn principal_variation_starts_with_best_move_and_is_playable() {
    let s = session();
    let pos = Position::from_fen(ITALIAN).unwrap();
    let analysis = s.analyze(&pos, 3);
    assert_eq!(analysis.depth, 3);
    assert!(analysis.principal_variation.len() >= 2, "{:?}", analysis.principal_variation);
    assert!(analysis.principal_variation.len() <= 3);
    assert_eq!(analysis.principal_variation.first(), analysis.best_move.as_ref());
    replay(ITALIAN, &analysis.principal_variation);
}

#[test]
fn analysis_json_shape() {
    let analysis = session().analyze_position(MATE_IN_ONE).unwrap();
    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["bestMove"], "a1a8");
    assert_eq!(json["principalVariation"][0], "a1a8");
    assert_eq!(json["evaluationCp"], 20_000);
}

#[test]
fn best_move_reviews_as_excellent() {
    let s = session();
    let best = s.analyze_position(ITALIAN).unwrap().best_move.unwrap();
    let review = s.review_move(ITALIAN, &best, 10).unwrap();
    assert_eq!(review.cp_loss, 0);
    assert_eq!(review.played_cp, review.best_cp);
    assert_eq!(review.quality, MoveQuality::Excellent);
    assert_eq!(review.best_move, best);
}

#[test]
fn hanging_a_bishop_is_a_blunder() {
    let review = session().review_move(ITALIAN, "c4f7", 1).unwrap();
    assert!(review.cp_loss >= 150, "lost only {} cp", review.cp_loss);
    assert_eq!(review.quality, MoveQuality::Blunder);
    assert_ne!(review.best_move, "c4f7");
}

#[test]
fn review_rejects_bad_input() {
    let s = session();
    assert!(matches!(s.review_move(ITALIAN, "e1e3", 5), Err(EngineError::Oracle(OracleError::IllegalMove { .. }))));
    assert!(matches!(s.review_move(ITALIAN, "c4f7", 31), Err(EngineError::InvalidLevel { level: 31, .. })));
    assert!(matches!(s.review_move("nonsense", "e2e4", 5), Err(EngineError::InvalidPosition(_))));
}

#[test]
fn game_review_finds_the_costliest_move() {
    let moves = ["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6", "c4f7"];
    let report = session().analyze_game(START, &moves, 1).unwrap();
    assert_eq!(report.level, 1);
    assert_eq!(report.reviews.len(), moves.len());
    for (i, review) in report.reviews.iter().enumerate() {
        assert_eq!(review.ply, i + 1);
        assert_eq!(review.mv, moves[i]);
    }

    assert!(!report.key_moments.is_empty() && report.key_moments.len() <= 3);
    let worst = &report.key_moments[0];
    assert_eq!((worst.ply, worst.mv.as_str(), worst.quality), (7, "c4f7", MoveQuality::Blunder));
    assert!(worst.comment.contains("was stronger"), "{}", worst.comment);
    assert!(worst.evaluation < 0.0, "White should stand worse after c4f7: {}", worst.evaluation);
}

#[test]
fn game_review_stops_at_an_illegal_move() {
    let err = session().analyze_game(START, &["e2e4", "e2e4"], 5).unwrap_err();
    assert!(matches!(err, EngineError::Oracle(OracleError::IllegalMove { .. })), "{err:?}");
}
