//! Board-side collaborators of the engine: the position wrapper around
//! `cozy_chess`, the move value the search works with, and the rules oracle
//! seam through which the search generates, applies and classifies moves.

pub mod cozy;

use cozy_chess::{Piece, Square};
use serde::Serialize;

use crate::error::OracleError;
pub use cozy::{mirror_fen, Position, CLOCK_KEY_FROM};

/// A legal move as seen by the search. Castling keeps the cozy-chess
/// encoding (king takes own rook); standard coordinate notation only appears
/// through [`RulesOracle::encode_move`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub(crate) from: Square,
    pub(crate) to: Square,
    pub(crate) piece: Piece,
    pub(crate) captured: Option<Piece>,
    pub(crate) promotion: Option<Piece>,
    pub(crate) gives_check: bool,
}

impl Move {
    pub fn from(&self) -> Square { self.from }
    pub fn to(&self) -> Square { self.to }
    pub fn piece(&self) -> Piece { self.piece }
    pub fn captured(&self) -> Option<Piece> { self.captured }
    pub fn promotion(&self) -> Option<Piece> { self.promotion }
    pub fn is_capture(&self) -> bool { self.captured.is_some() }
    pub fn gives_check(&self) -> bool { self.gives_check }

    /// Same origin, destination and promotion. Flags depend on the position
    /// a move was generated in, so killer and cache lookups compare by this.
    pub fn same_as(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }

    /// Total order used to break ties deterministically.
    pub fn sort_key(&self) -> (usize, usize, usize) {
        let promo = self.promotion.map_or(0, |p| p as usize + 1);
        (self.from as usize, self.to as usize, promo)
    }

    pub(crate) fn to_cozy(self) -> cozy_chess::Move {
        cozy_chess::Move { from: self.from, to: self.to, promotion: self.promotion }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    FiftyMoveRule,
    InsufficientMaterial,
}

/// Terminal classification of a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ongoing,
    Checkmate,
    Stalemate,
    Draw(DrawReason),
}

impl Outcome {
    pub fn is_terminal(self) -> bool { self != Outcome::Ongoing }
}

/// Move generation, application and classification consumed by the search.
///
/// Implementations must be side-effect free with respect to anything except
/// the position they return: `apply` never mutates its input.
pub trait RulesOracle {
    fn legal_moves(&self, pos: &Position) -> Result<Vec<Move>, OracleError>;

    fn apply(&self, pos: &Position, mv: &Move) -> Result<Position, OracleError>;

    fn classify(&self, pos: &Position) -> Outcome;

    /// `classify` for a caller that has already generated this position's
    /// moves and knows whether any exist.
    fn classify_with(&self, pos: &Position, has_legal_moves: bool) -> Outcome {
        let _ = has_legal_moves;
        self.classify(pos)
    }

    fn parse_fen(&self, fen: &str) -> Result<Position, OracleError> {
        Position::from_fen(fen)
    }

    fn encode_move(&self, pos: &Position, mv: &Move) -> String {
        pos.move_to_uci(mv)
    }

    fn decode_move(&self, pos: &Position, text: &str) -> Result<Move, OracleError> {
        pos.parse_uci(text)
    }
}

/// The production oracle, backed directly by `cozy_chess`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CozyOracle;

impl RulesOracle for CozyOracle {
    fn legal_moves(&self, pos: &Position) -> Result<Vec<Move>, OracleError> {
        Ok(pos.legal_moves())
    }

    fn apply(&self, pos: &Position, mv: &Move) -> Result<Position, OracleError> {
        pos.play(mv)
    }

    fn classify(&self, pos: &Position) -> Outcome {
        pos.outcome()
    }

    fn classify_with(&self, pos: &Position, has_legal_moves: bool) -> Outcome {
        pos.outcome_with(has_legal_moves)
    }
}
