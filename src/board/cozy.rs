use cozy_chess::{
    get_bishop_moves, get_knight_moves, get_pawn_attacks, get_rook_moves, Board as CozyBoard, Color, Piece, Square,
};

use crate::board::{DrawReason, Move, Outcome};
use crate::error::OracleError;

/// From this halfmove clock on, the clock is part of the position key: the
/// fifty-move draw is close enough to change search scores.
pub const CLOCK_KEY_FROM: u8 = 80;

/// Full board state. Exploration never mutates a `Position`: `play` returns
/// the successor and leaves `self` untouched.
#[derive(Clone, Debug)]
pub struct Position {
    board: CozyBoard,
}

impl Position {
    pub fn startpos() -> Self {
        Self { board: CozyBoard::default() }
    }

    pub fn from_fen(fen: &str) -> Result<Self, OracleError> {
        CozyBoard::from_fen(fen.trim(), false)
            .map(|b| Self { board: b })
            .map_err(|e| OracleError::InvalidFen { fen: fen.to_string(), reason: format!("{e:?}") })
    }

    pub fn board(&self) -> &CozyBoard { &self.board }

    pub fn fen(&self) -> String { format!("{}", self.board) }

    /// Zobrist key covering placement, side to move, castling and en passant.
    /// Near the fifty-move boundary the halfmove clock is mixed in as well.
    pub fn key(&self) -> u64 {
        let clock = self.board.halfmove_clock();
        if clock < CLOCK_KEY_FROM { return self.board.hash(); }
        let bucket = u64::from(clock.min(100) - CLOCK_KEY_FROM) + 1;
        self.board.hash() ^ bucket.wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    pub fn side_to_move(&self) -> Color { self.board.side_to_move() }

    pub fn in_check(&self) -> bool { !self.board.checkers().is_empty() }

    pub fn piece_at(&self, sq: Square) -> Option<(Color, Piece)> {
        self.board.color_on(sq).zip(self.board.piece_on(sq))
    }

    pub fn has_legal_moves(&self) -> bool {
        let mut any = false;
        self.board.generate_moves(|ml| { if !ml.is_empty() { any = true; } any });
        any
    }

    pub fn legal_moves_count(&self) -> usize {
        count_moves(&self.board)
    }

    /// Legal move count for `color`, counted on the null-move board when it is
    /// not that side's turn. Zero when the null move is illegal (in check).
    pub fn mobility(&self, color: Color) -> usize {
        if color == self.board.side_to_move() { return count_moves(&self.board); }
        self.board.null_move().map_or(0, |b| count_moves(&b))
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        self.board.generate_moves(|ml| {
            for m in ml {
                if let Some(mv) = self.describe(m) { moves.push(mv); }
            }
            false
        });
        moves
    }

    fn describe(&self, m: cozy_chess::Move) -> Option<Move> {
        let stm = self.board.side_to_move();
        let piece = self.board.piece_on(m.from)?;
        let captured = if self.board.color_on(m.to) == Some(!stm) {
            self.board.piece_on(m.to)
        } else if piece == Piece::Pawn && m.from.file() != m.to.file() {
            // en passant
            Some(Piece::Pawn)
        } else {
            None
        };
        let gives_check = self.gives_check(m, piece);
        Some(Move { from: m.from, to: m.to, piece, captured, promotion: m.promotion, gives_check })
    }

    // Attack-table test on the post-move occupancy. Castling and en passant
    // move a second piece, so those few moves are played out instead.
    fn gives_check(&self, m: cozy_chess::Move, piece: Piece) -> bool {
        let b = &self.board;
        let stm = b.side_to_move();
        let castles = piece == Piece::King && b.color_on(m.to) == Some(stm);
        let en_passant = piece == Piece::Pawn && m.from.file() != m.to.file() && b.color_on(m.to).is_none();
        if castles || en_passant {
            let mut child = b.clone();
            child.play_unchecked(m);
            return !child.checkers().is_empty();
        }

        let king = b.king(!stm);
        let moved = m.promotion.unwrap_or(piece);
        let occupied = (b.occupied() ^ m.from.bitboard()) | m.to.bitboard();
        let ours = b.colors(stm) ^ m.from.bitboard();
        let own = |p: Piece| {
            let bb = b.pieces(p) & ours;
            if p == moved { bb | m.to.bitboard() } else { bb }
        };
        let attackers = (get_bishop_moves(king, occupied) & (own(Piece::Bishop) | own(Piece::Queen)))
            | (get_rook_moves(king, occupied) & (own(Piece::Rook) | own(Piece::Queen)))
            | (get_knight_moves(king) & own(Piece::Knight))
            | (get_pawn_attacks(king, !stm) & own(Piece::Pawn));
        !attackers.is_empty()
    }

    pub fn play(&self, mv: &Move) -> Result<Position, OracleError> {
        let mut child = self.board.clone();
        child.try_play(mv.to_cozy()).map_err(|_| OracleError::IllegalMove {
            mv: self.move_to_uci(mv),
            fen: self.fen(),
        })?;
        Ok(Position { board: child })
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome_with(self.has_legal_moves())
    }

    /// Classification for a caller that already generated moves here.
    pub fn outcome_with(&self, has_legal_moves: bool) -> Outcome {
        if !has_legal_moves {
            return if self.in_check() { Outcome::Checkmate } else { Outcome::Stalemate };
        }
        if self.board.halfmove_clock() >= 100 { return Outcome::Draw(DrawReason::FiftyMoveRule); }
        if self.insufficient_material() { return Outcome::Draw(DrawReason::InsufficientMaterial); }
        Outcome::Ongoing
    }

    // Bare kings, or a single minor piece against a bare king.
    fn insufficient_material(&self) -> bool {
        let b = &self.board;
        let heavy = b.pieces(Piece::Pawn) | b.pieces(Piece::Rook) | b.pieces(Piece::Queen);
        if !heavy.is_empty() { return false; }
        let minors = b.pieces(Piece::Knight) | b.pieces(Piece::Bishop);
        minors.len() <= 1
    }

    /// Standard coordinate notation (`e2e4`, `e7e8q`, castling as `e1g1`).
    pub fn move_to_uci(&self, mv: &Move) -> String {
        let mut to = mv.to;
        let stm = self.board.side_to_move();
        if mv.piece == Piece::King && self.board.color_on(mv.to) == Some(stm) {
            let file = if mv.to.file() as usize > mv.from.file() as usize { cozy_chess::File::G } else { cozy_chess::File::C };
            to = Square::new(file, mv.from.rank());
        }
        let mut s = format!("{}{}", mv.from, to);
        if let Some(p) = mv.promotion { s.push(promotion_char(p)); }
        s
    }

    pub fn parse_uci(&self, text: &str) -> Result<Move, OracleError> {
        let wanted = text.trim().to_ascii_lowercase();
        if wanted.len() < 4 || wanted.len() > 5 {
            return Err(OracleError::BadMoveNotation(text.to_string()));
        }
        self.legal_moves()
            .into_iter()
            .find(|m| self.move_to_uci(m) == wanted)
            .ok_or_else(|| OracleError::IllegalMove { mv: text.to_string(), fen: self.fen() })
    }
}

fn count_moves(board: &CozyBoard) -> usize {
    let mut ct = 0usize;
    board.generate_moves(|moves| { ct += moves.len(); false });
    ct
}

fn promotion_char(p: Piece) -> char {
    match p {
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        _ => 'q',
    }
}

/// Color-flipped FEN: ranks reversed, piece colors and side to move swapped,
/// castling rights and en-passant square mirrored. Move counters are kept.
pub fn mirror_fen(fen: &str) -> Result<String, OracleError> {
    let invalid = |reason: &str| OracleError::InvalidFen { fen: fen.to_string(), reason: reason.to_string() };
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() < 4 { return Err(invalid("expected at least 4 fields")); }

    let placement = fields[0]
        .split('/')
        .rev()
        .map(swap_case)
        .collect::<Vec<_>>()
        .join("/");
    let side = match fields[1] {
        "w" => "b",
        "b" => "w",
        _ => return Err(invalid("bad side to move")),
    };
    let castling = if fields[2] == "-" {
        "-".to_string()
    } else {
        let swapped = swap_case(fields[2]);
        let upper: String = swapped.chars().filter(|c| c.is_ascii_uppercase()).collect();
        let lower: String = swapped.chars().filter(|c| c.is_ascii_lowercase()).collect();
        upper + &lower
    };
    let ep = if fields[3] == "-" {
        "-".to_string()
    } else {
        let b = fields[3].as_bytes();
        if b.len() != 2 || !(b'1'..=b'8').contains(&b[1]) { return Err(invalid("bad en passant square")); }
        format!("{}{}", b[0] as char, (b'1' + (b'8' - b[1])) as char)
    };
    let mut out = vec![placement, side.to_string(), castling, ep];
    out.extend(fields[4..].iter().map(|s| s.to_string()));
    Ok(out.join(" "))
}

fn swap_case(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_uppercase() { c.to_ascii_lowercase() } else { c.to_ascii_uppercase() })
        .collect()
}
