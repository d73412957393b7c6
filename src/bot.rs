//! The bot session: the only surface the rest of the application talks to.
//! Each session owns its caches and random source; sessions share nothing.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::analysis::{
    pick_key_moments, GameAnalysis, KeyMoment, MoveQuality, MoveReview, PositionAnalysis, KEY_MOMENTS, MAX_PV_LEN,
};
use crate::board::{CozyOracle, Move, Outcome, Position, RulesOracle};
use crate::config::EngineConfig;
use crate::difficulty::{DifficultyController, LevelInfo, QualityThresholds, StrengthProfile};
use crate::error::{ConfigError, EngineError, OracleError};
use crate::search::eval::{evaluate, relative_to};
use crate::search::{noise, SearchCaches, SearchLimits, Searcher};

const SCRATCH_MAX_ENTRIES: usize = 1 << 16;

/// Table size for a one-off fixed-depth search: about one slot per interior
/// node it can store.
pub(crate) fn scratch_entries(depth: u32) -> usize {
    32usize
        .saturating_pow(depth.saturating_sub(1).min(4))
        .saturating_mul(16)
        .min(SCRATCH_MAX_ENTRIES)
}

/// Engine-side result of one move request. Evaluation is in centipawns from
/// the mover's side.
#[derive(Clone, Debug)]
pub struct EngineMoveResult {
    pub best: Option<Move>,
    pub evaluation: i32,
    pub depth: u32,
    pub elapsed: Duration,
    /// Set for the no-move sentinel.
    pub outcome: Option<Outcome>,
    pub blunder: bool,
}

/// What callers receive: coordinate notation and pawns.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotMove {
    #[serde(rename = "move")]
    pub mv: Option<String>,
    pub evaluation: f64,
    pub evaluation_cp: i32,
    pub depth: u32,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    pub blunder: bool,
}

pub struct BotSession<O: RulesOracle = CozyOracle> {
    oracle: O,
    difficulty: DifficultyController,
    caches: SearchCaches,
    analysis_depth: u32,
    hard_limit_factor: u32,
    max_nodes: Option<u64>,
    seed: u64,
}

impl BotSession<CozyOracle> {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_oracle(config, CozyOracle)
    }
}

impl<O: RulesOracle> BotSession<O> {
    pub fn with_oracle(config: EngineConfig, oracle: O) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            oracle,
            difficulty: config.difficulty()?,
            caches: SearchCaches::with_capacity_mb(config.hash_mb),
            analysis_depth: config.analysis_depth,
            hard_limit_factor: config.hard_limit_factor,
            max_nodes: config.max_nodes,
            seed: config.seed.unwrap_or_else(rand::random),
        })
    }

    pub fn seed(&self) -> u64 { self.seed }

    pub fn difficulty(&self) -> &DifficultyController { &self.difficulty }

    pub fn caches(&self) -> &SearchCaches { &self.caches }

    pub fn oracle(&self) -> &O { &self.oracle }

    /// Picks a move for `fen` at strength `level`.
    ///
    /// Only an out-of-range level or unreadable notation is an error, and both
    /// are reported before any search. A terminal position yields a result
    /// with no move and its classification. Search failures, including
    /// panics, degrade to a random legal move with evaluation 0 and depth 1.
    pub fn get_best_move(&mut self, fen: &str, level: i32) -> Result<BotMove, EngineError> {
        let profile = self.difficulty.profile(level)?.clone();
        let pos = self.oracle.parse_fen(fen).map_err(EngineError::InvalidPosition)?;
        let result = self.best_move_for(&pos, &profile);
        let reply = self.to_bot_move(&pos, &result);
        info!(
            "level {level}: {} eval {} depth {} in {} ms{}",
            reply.mv.as_deref().unwrap_or("(none)"),
            reply.evaluation_cp,
            reply.depth,
            reply.elapsed_ms,
            if reply.blunder { " [blunder]" } else { "" }
        );
        Ok(reply)
    }

    pub fn best_move_for(&mut self, pos: &Position, profile: &StrengthProfile) -> EngineMoveResult {
        let start = Instant::now();
        let mut rng = self.rng_for(pos, profile.level);
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.think(pos, profile, &mut rng)));
        let mut result = match attempt {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                warn!("search failed ({e}); playing a random legal move");
                self.fallback(pos, &mut rng)
            }
            Err(_) => {
                warn!("search panicked; playing a random legal move");
                self.fallback(pos, &mut rng)
            }
        };
        result.elapsed = start.elapsed();
        result
    }

    fn think(&mut self, pos: &Position, profile: &StrengthProfile, rng: &mut SmallRng) -> Result<EngineMoveResult, EngineError> {
        let limits = SearchLimits {
            max_depth: profile.depth_cap,
            time_budget: Some(profile.time_budget()),
            hard_limit_factor: self.hard_limit_factor,
            max_nodes: self.max_nodes,
        };
        let mut searcher = Searcher::new(&self.oracle, &mut self.caches);
        let result = searcher.search(pos, &limits)?;
        let Some(best) = result.best else {
            return Ok(EngineMoveResult {
                best: None,
                evaluation: result.mover_score(),
                depth: 0,
                elapsed: result.elapsed,
                outcome: Some(self.oracle.classify(pos)),
                blunder: false,
            });
        };

        let mut chosen = (best, result.mover_score());
        let mut blunder = false;
        if DifficultyController::should_blunder(profile, rng) {
            // root scores past the best are only bounds; rank on exact ones
            let others: Vec<Move> =
                result.root_scores.iter().map(|&(m, _)| m).filter(|m| !m.same_as(&best)).collect();
            match searcher.score_exactly(pos, result.depth, &others)? {
                Some(ranked) => {
                    if let Some(alt) = noise::choose_alternative(&ranked, &best, profile.candidate_pool, rng) {
                        debug!(
                            "level {} blunders: {} ({}) instead of {} ({})",
                            profile.level,
                            self.oracle.encode_move(pos, &alt.0),
                            alt.1,
                            self.oracle.encode_move(pos, &best),
                            chosen.1
                        );
                        chosen = alt;
                        blunder = true;
                    }
                }
                None => debug!("level {}: out of time scoring alternatives, keeping best", profile.level),
            }
        }
        Ok(EngineMoveResult {
            best: Some(chosen.0),
            evaluation: chosen.1,
            depth: result.depth,
            elapsed: result.elapsed,
            outcome: None,
            blunder,
        })
    }

    fn fallback(&self, pos: &Position, rng: &mut SmallRng) -> EngineMoveResult {
        let moves = match panic::catch_unwind(AssertUnwindSafe(|| self.oracle.legal_moves(pos))) {
            Ok(Ok(moves)) => moves,
            _ => pos.legal_moves(),
        };
        match moves.choose(rng) {
            Some(&mv) => EngineMoveResult {
                best: Some(mv),
                evaluation: 0,
                depth: 1,
                elapsed: Duration::ZERO,
                outcome: None,
                blunder: false,
            },
            None => EngineMoveResult {
                best: None,
                evaluation: 0,
                depth: 0,
                elapsed: Duration::ZERO,
                outcome: Some(pos.outcome()),
                blunder: false,
            },
        }
    }

    fn to_bot_move(&self, pos: &Position, r: &EngineMoveResult) -> BotMove {
        BotMove {
            mv: r.best.map(|m| self.oracle.encode_move(pos, &m)),
            evaluation: f64::from(r.evaluation) / 100.0,
            evaluation_cp: r.evaluation,
            depth: r.depth,
            elapsed_ms: r.elapsed.as_millis() as u64,
            outcome: r.outcome,
            blunder: r.blunder,
        }
    }

    // Same seed, position and level always give the same random stream.
    fn rng_for(&self, pos: &Position, level: i32) -> SmallRng {
        let mixed = self.seed ^ pos.key().rotate_left(17) ^ (level as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        SmallRng::seed_from_u64(mixed)
    }

    /// White-positive pawns from a fixed shallow search on scratch caches, so
    /// the number does not depend on the level or on this session's history.
    pub fn evaluate_position(&self, fen: &str) -> Result<f64, EngineError> {
        let pos = self.oracle.parse_fen(fen).map_err(EngineError::InvalidPosition)?;
        Ok(f64::from(self.evaluate_position_cp(&pos)) / 100.0)
    }

    pub fn evaluate_position_cp(&self, pos: &Position) -> i32 {
        self.analyze(pos, self.analysis_depth).evaluation_cp
    }

    /// Best move, principal variation and evaluation at the configured
    /// analysis depth.
    pub fn analyze_position(&self, fen: &str) -> Result<PositionAnalysis, EngineError> {
        let pos = self.oracle.parse_fen(fen).map_err(EngineError::InvalidPosition)?;
        Ok(self.analyze(&pos, self.analysis_depth))
    }

    /// Fixed-depth analysis on scratch caches. A failing or panicking search
    /// degrades to the static evaluation with no line.
    pub fn analyze(&self, pos: &Position, depth: u32) -> PositionAnalysis {
        let depth = depth.max(1);
        let mut scratch = SearchCaches::with_capacity_entries(scratch_entries(depth));
        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut searcher = Searcher::new(&self.oracle, &mut scratch);
            let result = searcher.search_depth(pos, depth)?;
            let line = searcher.principal_variation(pos, MAX_PV_LEN.min(depth as usize));
            Ok::<_, EngineError>((result, line))
        }));
        let (best, cp, line, reached) = match run {
            Ok(Ok((r, line))) => (r.best, r.score, line, r.depth),
            Ok(Err(e)) => {
                debug!("analysis failed ({e}); using static evaluation");
                (None, evaluate(pos), Vec::new(), 0)
            }
            Err(_) => {
                warn!("analysis panicked; using static evaluation");
                (None, evaluate(pos), Vec::new(), 0)
            }
        };
        PositionAnalysis {
            best_move: best.map(|m| self.oracle.encode_move(pos, &m)),
            evaluation: f64::from(cp) / 100.0,
            evaluation_cp: cp,
            principal_variation: self.encode_line(pos, &line),
            depth: reached,
        }
    }

    fn encode_line(&self, pos: &Position, line: &[Move]) -> Vec<String> {
        let mut out = Vec::with_capacity(line.len());
        let mut current = pos.clone();
        for mv in line {
            out.push(self.oracle.encode_move(&current, mv));
            match self.oracle.apply(&current, mv) {
                Ok(next) => current = next,
                Err(_) => break,
            }
        }
        out
    }

    /// Grades `played` against the best move in `fen`, using the thresholds
    /// of `level`.
    pub fn review_move(&self, fen: &str, played: &str, level: i32) -> Result<MoveReview, EngineError> {
        let thresholds = self.difficulty.profile(level)?.thresholds;
        let pos = self.oracle.parse_fen(fen).map_err(EngineError::InvalidPosition)?;
        let mv = self.oracle.decode_move(&pos, played)?;
        self.review(&pos, &mv, &thresholds, 1).map(|(review, _)| review)
    }

    /// Reviews every move of a game from `start_fen` and picks its key
    /// moments. Stops at the first move that is not legal.
    pub fn analyze_game<S: AsRef<str>>(
        &self,
        start_fen: &str,
        moves: &[S],
        level: i32,
    ) -> Result<GameAnalysis, EngineError> {
        let thresholds = self.difficulty.profile(level)?.thresholds;
        let mut pos = self.oracle.parse_fen(start_fen).map_err(EngineError::InvalidPosition)?;
        let mut reviews = Vec::with_capacity(moves.len());
        let mut white_cp = Vec::with_capacity(moves.len());
        for (i, text) in moves.iter().enumerate() {
            let mv = self.oracle.decode_move(&pos, text.as_ref())?;
            let (review, after) = self.review(&pos, &mv, &thresholds, i + 1)?;
            reviews.push(review);
            white_cp.push(after);
            pos = self.oracle.apply(&pos, &mv)?;
        }
        let key_moments: Vec<KeyMoment> = pick_key_moments(&reviews, KEY_MOMENTS)
            .into_iter()
            .map(|r| KeyMoment::from_review(r, white_cp[r.ply - 1]))
            .collect();
        info!(
            "reviewed {} moves at level {level}: {} errors, {} key moments",
            reviews.len(),
            reviews.iter().filter(|r| r.quality.is_error()).count(),
            key_moments.len()
        );
        Ok(GameAnalysis { level, reviews, key_moments })
    }

    // The review plus the White-positive score after the move.
    fn review(
        &self,
        pos: &Position,
        mv: &Move,
        thresholds: &QualityThresholds,
        ply: usize,
    ) -> Result<(MoveReview, i32), EngineError> {
        let depth = self.analysis_depth.max(1);
        let mut scratch = SearchCaches::with_capacity_entries(scratch_entries(depth));
        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut searcher = Searcher::new(&self.oracle, &mut scratch);
            let result = searcher.search_depth(pos, depth)?;
            let played = searcher.score_exactly(pos, result.depth, std::slice::from_ref(mv))?;
            Ok::<_, EngineError>((result, played))
        }));
        let (result, played) = match run {
            Ok(r) => r?,
            Err(_) => return Err(OracleError::Internal("search panicked during review".into()).into()),
        };
        let best = result.best.ok_or(EngineError::NoSearchableCandidates)?;
        let played_cp = played
            .and_then(|scores| scores.first().map(|&(_, s)| s))
            .ok_or(EngineError::NoSearchableCandidates)?;
        let best_cp = result.mover_score();
        let cp_loss = (best_cp - played_cp).max(0);
        let review = MoveReview {
            ply,
            mv: self.oracle.encode_move(pos, mv),
            best_move: self.oracle.encode_move(pos, &best),
            played_cp,
            best_cp,
            cp_loss,
            quality: MoveQuality::from_cp_loss(cp_loss, thresholds),
        };
        Ok((review, relative_to(played_cp, pos.side_to_move())))
    }

    pub fn level_catalog(&self) -> Vec<LevelInfo> { self.difficulty.catalog() }

    pub fn clear_caches(&mut self) {
        debug!("clearing {} cached positions", self.caches.tt.len());
        self.caches.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tt::TranspositionTable;

    #[test]
    fn scratch_tables_scale_with_depth() {
        let one_mb = TranspositionTable::with_capacity_mb(1).capacity();
        assert!(scratch_entries(2) * 16 < one_mb, "{} entries for depth 2", scratch_entries(2));
        for depth in 1..8 {
            assert!(scratch_entries(depth) <= scratch_entries(depth + 1));
        }
        assert_eq!(scratch_entries(40), SCRATCH_MAX_ENTRIES);
        assert!(SearchCaches::with_capacity_entries(scratch_entries(2)).tt.capacity() >= scratch_entries(2));
    }
}
