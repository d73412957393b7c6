use cozy_chess::{Board, Color, File, Piece, Rank, Square};

use crate::board::{Outcome, Position};

const PAWN: i32 = 100;
const KNIGHT: i32 = 320;
const BISHOP: i32 = 330;
const ROOK: i32 = 500;
const QUEEN: i32 = 900;
const KING: i32 = 20_000;

// Mate scoring helpers. Every score in the engine is White-positive.
pub const MATE_SCORE: i32 = 20_000;
pub const DRAW_SCORE: i32 = 0;

pub const MOBILITY_WEIGHT: i32 = 10;
pub const PAWN_SHIELD_BONUS: i32 = 30;

pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN,
        Piece::Knight => KNIGHT,
        Piece::Bishop => BISHOP,
        Piece::Rook => ROOK,
        Piece::Queen => QUEEN,
        Piece::King => KING,
    }
}

// Placement tables from White's side, rank 8 first.
#[rustfmt::skip]
const PAWN_TABLE: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_TABLE: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_TABLE: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_TABLE: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_TABLE: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_TABLE: [i32; 64] = [
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
];

const PIECES: [Piece; 6] = [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King];

/// Placement bonus for `piece` of `color` on `sq`; Black reads the tables
/// mirrored vertically.
pub fn placement_value(piece: Piece, color: Color, sq: Square) -> i32 {
    let file = sq.file() as usize;
    let rank = sq.rank() as usize;
    let idx = if color == Color::White { (7 - rank) * 8 + file } else { rank * 8 + file };
    let table = match piece {
        Piece::Pawn => &PAWN_TABLE,
        Piece::Knight => &KNIGHT_TABLE,
        Piece::Bishop => &BISHOP_TABLE,
        Piece::Rook => &ROOK_TABLE,
        Piece::Queen => &QUEEN_TABLE,
        Piece::King => &KING_TABLE,
    };
    table[idx]
}

fn count_piece(board: &Board, color: Color, piece: Piece) -> i32 {
    board.colored_pieces(color, piece).len() as i32
}

// Side-agnostic material in centipawns: positive means White has more material.
pub fn material_eval_cp(board: &Board) -> i32 {
    PIECES
        .iter()
        .filter(|&&p| p != Piece::King)
        .map(|&p| (count_piece(board, Color::White, p) - count_piece(board, Color::Black, p)) * piece_value(p))
        .sum()
}

fn material_and_placement(board: &Board) -> i32 {
    let mut score = 0;
    for &color in &[Color::White, Color::Black] {
        let sign = if color == Color::White { 1 } else { -1 };
        for &piece in &PIECES {
            for sq in board.colored_pieces(color, piece) {
                score += sign * (piece_value(piece) + placement_value(piece, color, sq));
            }
        }
    }
    score
}

/// Pawn shield: friendly pawns on the three files around the king, on the
/// rank directly in front of it.
pub fn king_safety(board: &Board, color: Color) -> i32 {
    let king = board.king(color);
    let kf = king.file() as i32;
    let kr = king.rank() as i32;
    let front = if color == Color::White { kr + 1 } else { kr - 1 };
    if !(0..8).contains(&front) { return 0; }
    let pawns = board.colored_pieces(color, Piece::Pawn);
    let mut safety = 0;
    for f in (kf - 1)..=(kf + 1) {
        if !(0..8).contains(&f) { continue; }
        let sq = Square::new(File::index(f as usize), Rank::index(front as usize));
        if pawns.has(sq) { safety += PAWN_SHIELD_BONUS; }
    }
    safety
}

pub fn mobility_eval_cp(white_moves: usize, black_moves: usize) -> i32 {
    (white_moves as i32 - black_moves as i32) * MOBILITY_WEIGHT
}

/// Static evaluation, White-positive. Terminal positions short-circuit:
/// the mated side gets `MATE_SCORE` against it, draws score zero.
pub fn evaluate(pos: &Position) -> i32 {
    // the mover's count doubles as the has-moves test
    let own = pos.legal_moves_count();
    match pos.outcome_with(own > 0) {
        Outcome::Checkmate => {
            return if pos.side_to_move() == Color::White { -MATE_SCORE } else { MATE_SCORE };
        }
        Outcome::Stalemate | Outcome::Draw(_) => return DRAW_SCORE,
        Outcome::Ongoing => {}
    }
    let stm = pos.side_to_move();
    let theirs = pos.mobility(!stm);
    let (white, black) = if stm == Color::White { (own, theirs) } else { (theirs, own) };
    let board = pos.board();
    material_and_placement(board)
        + mobility_eval_cp(white, black)
        + king_safety(board, Color::White)
        - king_safety(board, Color::Black)
}

/// `score` (White-positive) seen from `color`.
pub fn relative_to(score: i32, color: Color) -> i32 {
    if color == Color::White { score } else { -score }
}

pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_SCORE
}
