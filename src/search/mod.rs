pub mod alphabeta;
pub mod eval;
pub mod noise;
pub mod ordering;
pub mod tt;

pub use alphabeta::{SearchLimits, SearchResult, SearchStats, Searcher};

use ordering::Heuristics;
use tt::TranspositionTable;

/// Transposition, killer and history state owned by one bot session.
#[derive(Default)]
pub struct SearchCaches {
    pub tt: TranspositionTable,
    pub heuristics: Heuristics,
}

impl SearchCaches {
    pub fn with_capacity_mb(mb: usize) -> Self {
        Self { tt: TranspositionTable::with_capacity_mb(mb), heuristics: Heuristics::default() }
    }

    pub fn with_capacity_entries(entries: usize) -> Self {
        Self { tt: TranspositionTable::with_capacity_entries(entries), heuristics: Heuristics::default() }
    }

    pub fn clear(&mut self) {
        self.tt.clear();
        self.heuristics.clear();
    }
}
