use std::time::{Duration, Instant};

use cozy_chess::Color;
use log::{debug, trace, warn};

use crate::board::{Move, Position, RulesOracle};
use crate::error::EngineError;
use crate::search::eval::{evaluate, is_mate_score, relative_to};
use crate::search::tt::{Bound, Entry};
use crate::search::SearchCaches;

const INFINITY: i32 = 1_000_000;
const NODE_CHECK_INTERVAL: u64 = 1024;

/// Budget for one iterative-deepening search.
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub max_depth: u32,
    /// Checked between completed passes only.
    pub time_budget: Option<Duration>,
    /// A pass still running at `time_budget * hard_limit_factor` is abandoned.
    pub hard_limit_factor: u32,
    pub max_nodes: Option<u64>,
}

impl SearchLimits {
    pub fn depth(max_depth: u32) -> Self {
        Self { max_depth, time_budget: None, hard_limit_factor: 2, max_nodes: None }
    }

    pub fn timed(max_depth: u32, budget: Duration) -> Self {
        Self { time_budget: Some(budget), ..Self::depth(max_depth) }
    }

    fn hard_deadline(&self, start: Instant) -> Option<Instant> {
        self.time_budget.map(|b| start + b * self.hard_limit_factor.max(1))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub tt_hits: u64,
    pub cutoffs: u64,
    pub oracle_failures: u64,
    pub aborted_passes: u32,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    /// `None` only when the root has no legal moves.
    pub best: Option<Move>,
    /// White-positive centipawns.
    pub score: i32,
    /// Deepest fully completed pass.
    pub depth: u32,
    pub elapsed: Duration,
    pub side_to_move: Color,
    /// Root moves scored from the mover's side, best first. The best score
    /// and any score tying it are exact; the rest are alpha-beta bounds. See
    /// [`Searcher::score_exactly`] when alternatives must be compared.
    pub root_scores: Vec<(Move, i32)>,
    pub stats: SearchStats,
}

impl SearchResult {
    pub fn mover_score(&self) -> i32 { relative_to(self.score, self.side_to_move) }
}

struct RootPass {
    best: Move,
    score: i32,
    scored: Vec<(Move, i32)>,
}

/// Iterative-deepening minimax with alpha-beta pruning over borrowed
/// session caches. Scores are White-positive at every node: White nodes
/// maximize, Black nodes minimize.
pub struct Searcher<'a, O: RulesOracle + ?Sized> {
    oracle: &'a O,
    caches: &'a mut SearchCaches,
    stats: SearchStats,
    deadline: Option<Instant>,
    node_limit: u64,
    abortable: bool,
    aborted: bool,
}

impl<'a, O: RulesOracle + ?Sized> Searcher<'a, O> {
    pub fn new(oracle: &'a O, caches: &'a mut SearchCaches) -> Self {
        Self {
            oracle,
            caches,
            stats: SearchStats::default(),
            deadline: None,
            node_limit: u64::MAX,
            abortable: false,
            aborted: false,
        }
    }

    pub fn stats(&self) -> SearchStats { self.stats }

    /// Line of best replies stored in the table, starting at `pos`. Stops at
    /// `max_len`, a missing or illegal entry, or a repeated position.
    pub fn principal_variation(&self, pos: &Position, max_len: usize) -> Vec<Move> {
        let mut line = Vec::new();
        let mut seen = vec![pos.key()];
        let mut current = pos.clone();
        while line.len() < max_len {
            let Some(stored) = self.caches.tt.get(current.key()).and_then(|e| e.best) else { break };
            let legal = match self.oracle.legal_moves(&current) {
                Ok(moves) => moves.into_iter().find(|m| m.same_as(&stored)),
                Err(_) => None,
            };
            let Some(mv) = legal else { break };
            let Ok(next) = self.oracle.apply(&current, &mv) else { break };
            if seen.contains(&next.key()) {
                line.push(mv);
                break;
            }
            seen.push(next.key());
            line.push(mv);
            current = next;
        }
        line
    }

    /// Deepens from 1 up to `limits.max_depth`, stopping when the time budget
    /// is spent between passes, when a mate is found, or when the root has a
    /// single legal move. Returns the last fully completed pass.
    pub fn search(&mut self, pos: &Position, limits: &SearchLimits) -> Result<SearchResult, EngineError> {
        let start = Instant::now();
        self.reset();
        self.deadline = limits.hard_deadline(start);
        self.node_limit = limits.max_nodes.unwrap_or(u64::MAX);
        self.caches.tt.bump_generation();

        let mut moves = self.oracle.legal_moves(pos)?;
        if moves.is_empty() {
            return Ok(self.terminal_result(pos, start));
        }

        let mut completed: Option<(u32, RootPass)> = None;
        for depth in 1..=limits.max_depth.max(1) {
            // the first pass always finishes so there is a move to return
            self.abortable = depth > 1;
            let prev_best = completed.as_ref().map(|(_, p)| p.best);
            let Some(pass) = self.search_root(pos, depth, &mut moves, prev_best.as_ref())? else {
                self.stats.aborted_passes += 1;
                debug!(
                    "depth {depth} abandoned after {} nodes ({:?}); keeping depth {}",
                    self.stats.nodes,
                    start.elapsed(),
                    depth - 1
                );
                break;
            };
            debug!(
                "depth {depth} best {} score {} nodes {} tt_hits {} cutoffs {} ({:?})",
                self.oracle.encode_move(pos, &pass.best),
                pass.score,
                self.stats.nodes,
                self.stats.tt_hits,
                self.stats.cutoffs,
                start.elapsed()
            );
            let mate = is_mate_score(pass.score);
            completed = Some((depth, pass));
            if mate || moves.len() == 1 { break; }
            if limits.time_budget.map_or(false, |b| start.elapsed() >= b) { break; }
        }

        let (depth, pass) = completed.ok_or(EngineError::NoSearchableCandidates)?;
        Ok(self.finish(pos, depth, pass, start))
    }

    /// One full-width pass at exactly `depth`, with no time limit.
    pub fn search_depth(&mut self, pos: &Position, depth: u32) -> Result<SearchResult, EngineError> {
        let start = Instant::now();
        self.reset();
        let mut moves = self.oracle.legal_moves(pos)?;
        if moves.is_empty() {
            return Ok(self.terminal_result(pos, start));
        }
        let depth = depth.max(1);
        let pass = self
            .search_root(pos, depth, &mut moves, None)?
            .ok_or(EngineError::NoSearchableCandidates)?;
        Ok(self.finish(pos, depth, pass, start))
    }

    /// Exact mover-side scores of `moves` at `depth`, each child searched with
    /// a full window, best first. Runs against the deadline left by the last
    /// [`search`](Self::search) and ignores its node cap; `Ok(None)` when the
    /// deadline passes first.
    pub fn score_exactly(
        &mut self,
        pos: &Position,
        depth: u32,
        moves: &[Move],
    ) -> Result<Option<Vec<(Move, i32)>>, EngineError> {
        let depth = depth.max(1);
        let stm = pos.side_to_move();
        let maximizing = stm == Color::White;
        self.abortable = self.deadline.is_some();
        self.node_limit = u64::MAX;
        self.aborted = false;

        let mut scored = Vec::with_capacity(moves.len());
        for &mv in moves {
            let child = match self.oracle.apply(pos, &mv) {
                Ok(c) => c,
                Err(e) => {
                    self.stats.oracle_failures += 1;
                    warn!("skipping candidate while rescoring: {e}");
                    continue;
                }
            };
            let score = self.minimax(&child, depth - 1, -INFINITY, INFINITY, !maximizing, 1);
            if self.aborted { return Ok(None); }
            scored.push((mv, relative_to(score, stm)));
        }
        rank_best_first(&mut scored);
        Ok(Some(scored))
    }

    fn reset(&mut self) {
        self.stats = SearchStats::default();
        self.deadline = None;
        self.node_limit = u64::MAX;
        self.abortable = false;
        self.aborted = false;
    }

    fn terminal_result(&self, pos: &Position, start: Instant) -> SearchResult {
        SearchResult {
            best: None,
            score: evaluate(pos),
            depth: 0,
            elapsed: start.elapsed(),
            side_to_move: pos.side_to_move(),
            root_scores: Vec::new(),
            stats: self.stats,
        }
    }

    fn finish(&self, pos: &Position, depth: u32, pass: RootPass, start: Instant) -> SearchResult {
        let stm = pos.side_to_move();
        let mut root_scores: Vec<(Move, i32)> =
            pass.scored.iter().map(|&(m, s)| (m, relative_to(s, stm))).collect();
        rank_best_first(&mut root_scores);
        SearchResult {
            best: Some(pass.best),
            score: pass.score,
            depth,
            elapsed: start.elapsed(),
            side_to_move: stm,
            root_scores,
            stats: self.stats,
        }
    }

    // Ok(None) when the pass was abandoned.
    fn search_root(
        &mut self,
        pos: &Position,
        depth: u32,
        moves: &mut [Move],
        prev_best: Option<&Move>,
    ) -> Result<Option<RootPass>, EngineError> {
        self.aborted = false;
        let tt_move = prev_best.copied().or_else(|| self.caches.tt.get(pos.key()).and_then(|e| e.best));
        self.caches.heuristics.order(moves, 0, tt_move.as_ref());

        let maximizing = pos.side_to_move() == Color::White;
        let (mut alpha, mut beta) = (-INFINITY, INFINITY);
        let mut best: Option<(Move, i32)> = None;
        let mut scored = Vec::with_capacity(moves.len());
        for &mv in moves.iter() {
            let child = match self.oracle.apply(pos, &mv) {
                Ok(c) => c,
                Err(e) => {
                    self.stats.oracle_failures += 1;
                    warn!("skipping root candidate: {e}");
                    continue;
                }
            };
            // one point wider than the best so far: a move that ties it comes
            // back exact, and ties go to the lower sort key
            let (lo, hi) = if maximizing { (alpha - 1, beta) } else { (alpha, beta + 1) };
            let score = self.minimax(&child, depth - 1, lo, hi, !maximizing, 1);
            if self.aborted { return Ok(None); }
            scored.push((mv, score));
            let improves = best.map_or(true, |(b_mv, b)| {
                let better = if maximizing { score > b } else { score < b };
                better || (score == b && mv.sort_key() < b_mv.sort_key())
            });
            if improves { best = Some((mv, score)); }
            if maximizing { alpha = alpha.max(score); } else { beta = beta.min(score); }
        }

        let (best_move, best_score) = best.ok_or(EngineError::NoSearchableCandidates)?;
        self.caches.tt.put(Entry {
            key: pos.key(),
            depth,
            score: best_score,
            best: Some(best_move),
            bound: Bound::Exact,
            gen: 0,
        });
        Ok(Some(RootPass { best: best_move, score: best_score, scored }))
    }

    fn minimax(&mut self, pos: &Position, depth: u32, mut alpha: i32, mut beta: i32, maximizing: bool, ply: usize) -> i32 {
        self.stats.nodes += 1;
        if self.should_stop() { return 0; }
        if depth == 0 { return evaluate(pos); }

        // terminal positions are never stored, so the table can be read first
        let key = pos.key();
        let cached = self.caches.tt.get(key);
        if let Some(score) = cached.and_then(|e| e.cutoff(depth, alpha, beta)) {
            self.stats.tt_hits += 1;
            return score;
        }

        let mut moves = match self.oracle.legal_moves(pos) {
            Ok(m) => m,
            Err(e) => {
                self.stats.oracle_failures += 1;
                debug!("move generation failed at ply {ply}: {e}");
                return evaluate(pos);
            }
        };
        if self.oracle.classify_with(pos, !moves.is_empty()).is_terminal() { return evaluate(pos); }
        let tt_move = cached.and_then(|e| e.best);
        self.caches.heuristics.order(&mut moves, ply, tt_move.as_ref());

        let (orig_alpha, orig_beta) = (alpha, beta);
        let mut best_score = if maximizing { -INFINITY } else { INFINITY };
        let mut best_move: Option<Move> = None;
        for mv in moves {
            let child = match self.oracle.apply(pos, &mv) {
                Ok(c) => c,
                Err(e) => {
                    self.stats.oracle_failures += 1;
                    trace!("skipping candidate at ply {ply}: {e}");
                    continue;
                }
            };
            let score = self.minimax(&child, depth - 1, alpha, beta, !maximizing, ply + 1);
            if self.aborted { return 0; }
            if maximizing {
                if score > best_score { best_score = score; best_move = Some(mv); }
                alpha = alpha.max(score);
            } else {
                if score < best_score { best_score = score; best_move = Some(mv); }
                beta = beta.min(score);
            }
            if beta <= alpha {
                self.stats.cutoffs += 1;
                self.caches.heuristics.record_cutoff(ply, &mv, depth);
                break;
            }
        }
        // every candidate failed to apply
        if best_move.is_none() { return evaluate(pos); }

        let bound = if best_score <= orig_alpha {
            Bound::Upper
        } else if best_score >= orig_beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.caches.tt.put(Entry { key, depth, score: best_score, best: best_move, bound, gen: 0 });
        best_score
    }

    fn should_stop(&mut self) -> bool {
        if self.aborted { return true; }
        if !self.abortable { return false; }
        if self.stats.nodes >= self.node_limit {
            self.aborted = true;
        } else if self.stats.nodes % NODE_CHECK_INTERVAL == 0 {
            if let Some(dl) = self.deadline {
                if Instant::now() >= dl { self.aborted = true; }
            }
        }
        self.aborted
    }
}

// Descending score, ties broken by a fixed move order.
fn rank_best_first(scored: &mut [(Move, i32)]) {
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.sort_key().cmp(&b.0.sort_key())));
}
