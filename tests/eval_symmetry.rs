use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tutorbot::board::mirror_fen;
use tutorbot::search::eval::{evaluate, MATE_SCORE};
use tutorbot::Position;

const FENS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
    "k7/8/8/8/8/8/3qQ3/7K w - - 0 1",
    "r3k2r/pp3ppp/2n1b3/3p4/3P4/2N1B3/PP3PPP/R3K2R b KQkq - 2 12",
    "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2",
    "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
];

fn assert_mirrored(fen: &str) {
    let pos = Position::from_fen(fen).expect("valid fen");
    let mirrored = Position::from_fen(&mirror_fen(fen).expect("mirror")).expect("mirrored fen parses");
    assert_eq!(evaluate(&pos), -evaluate(&mirrored), "asymmetric eval for {fen}");
}

#[test]
fn fixed_positions_are_color_symmetric() {
    for fen in FENS {
        assert_mirrored(fen);
    }
}

#[test]
fn random_walks_are_color_symmetric() {
    let mut rng = SmallRng::seed_from_u64(20240611);
    for _ in 0..12 {
        let mut pos = Position::startpos();
        for _ in 0..40 {
            assert_mirrored(&pos.fen());
            let moves = pos.legal_moves();
            let Some(mv) = moves.choose(&mut rng) else { break };
            pos = pos.play(mv).expect("legal move plays");
        }
    }
}

#[test]
fn startpos_evaluates_to_zero() {
    assert_eq!(evaluate(&Position::startpos()), 0);
}

#[test]
fn centralized_knight_beats_rim_knight() {
    let center = Position::from_fen("4k3/8/8/8/3N4/8/8/4K3 w - - 0 1").unwrap();
    let rim = Position::from_fen("4k3/8/8/8/N7/8/8/4K3 w - - 0 1").unwrap();
    assert!(evaluate(&center) > evaluate(&rim), "{} vs {}", evaluate(&center), evaluate(&rim));
}

#[test]
fn checkmate_scores_are_extremal() {
    let black_mated = Position::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
    assert_eq!(evaluate(&black_mated), MATE_SCORE);
    let white_mated = Position::from_fen("6k1/8/8/8/8/8/5PPP/r5K1 w - - 0 1").unwrap();
    assert_eq!(evaluate(&white_mated), -MATE_SCORE);
    let stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert_eq!(evaluate(&stalemate), 0);
}
