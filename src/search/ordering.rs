use crate::board::Move;
use crate::search::eval::piece_value;

pub const CHECK_BONUS: i32 = 50;
pub const KILLER_PRIMARY_BONUS: i32 = 100;
pub const KILLER_SECONDARY_BONUS: i32 = 80;
pub const HISTORY_CAP: i32 = 500;
const TT_MOVE_SCORE: i32 = 1_000_000;
pub const MAX_PLY: usize = 128;

/// Two cutoff moves per ply; a new killer pushes the primary down.
#[derive(Clone, Debug)]
pub struct KillerTable {
    slots: Vec<[Option<Move>; 2]>,
}

impl Default for KillerTable {
    fn default() -> Self { Self { slots: vec![[None, None]; MAX_PLY] } }
}

impl KillerTable {
    pub fn record(&mut self, ply: usize, m: Move) {
        let Some(slot) = self.slots.get_mut(ply) else { return };
        if slot[0].map_or(false, |k| k.same_as(&m)) { return; }
        slot[1] = slot[0];
        slot[0] = Some(m);
    }

    pub fn bonus(&self, ply: usize, m: &Move) -> i32 {
        let Some(slot) = self.slots.get(ply) else { return 0 };
        if slot[0].map_or(false, |k| k.same_as(m)) {
            KILLER_PRIMARY_BONUS
        } else if slot[1].map_or(false, |k| k.same_as(m)) {
            KILLER_SECONDARY_BONUS
        } else {
            0
        }
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = [None, None]);
    }
}

/// Cutoff success per from/to pair.
#[derive(Clone, Debug)]
pub struct HistoryTable {
    scores: Box<[[i32; 64]; 64]>,
}

impl Default for HistoryTable {
    fn default() -> Self { Self { scores: Box::new([[0; 64]; 64]) } }
}

impl HistoryTable {
    pub fn bump(&mut self, m: &Move, depth: u32) {
        let d = depth.min(64) as i32;
        let cell = &mut self.scores[m.from() as usize][m.to() as usize];
        *cell = cell.saturating_add(d * d);
    }

    pub fn score(&self, m: &Move) -> i32 {
        self.scores[m.from() as usize][m.to() as usize]
    }

    pub fn clear(&mut self) {
        self.scores.iter_mut().for_each(|row| row.fill(0));
    }
}

/// Killer and history state for one session.
#[derive(Clone, Debug, Default)]
pub struct Heuristics {
    pub killers: KillerTable,
    pub history: HistoryTable,
}

impl Heuristics {
    /// Ordering score: MVV-LVA for captures, promotion value, check bonus,
    /// killer bonus for this ply and the (capped) history score.
    pub fn score_move(&self, m: &Move, ply: usize) -> i32 {
        let mut score = 0;
        if let Some(victim) = m.captured() {
            score += piece_value(victim) - piece_value(m.piece());
        }
        if let Some(promo) = m.promotion() {
            score += piece_value(promo);
        }
        if m.gives_check() {
            score += CHECK_BONUS;
        }
        score += self.killers.bonus(ply, m);
        score += self.history.score(m).min(HISTORY_CAP);
        score
    }

    /// Sorts `moves` best-first. The cached best move for the node, when
    /// present, goes to the front. Equal scores keep generation order.
    pub fn order(&self, moves: &mut [Move], ply: usize, tt_move: Option<&Move>) {
        moves.sort_by_cached_key(|m| {
            if tt_move.map_or(false, |t| t.same_as(m)) { return -TT_MOVE_SCORE; }
            -self.score_move(m, ply)
        });
    }

    pub fn record_cutoff(&mut self, ply: usize, m: &Move, depth: u32) {
        self.killers.record(ply, *m);
        self.history.bump(m, depth);
    }

    pub fn clear(&mut self) {
        self.killers.clear();
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;

    #[test]
    fn killer_slots_shift() {
        let pos = Position::startpos();
        let moves = pos.legal_moves();
        let (a, b) = (moves[0], moves[1]);
        let mut k = KillerTable::default();
        k.record(3, a);
        k.record(3, b);
        assert_eq!(k.bonus(3, &b), KILLER_PRIMARY_BONUS);
        assert_eq!(k.bonus(3, &a), KILLER_SECONDARY_BONUS);
        assert_eq!(k.bonus(2, &a), 0);
        k.record(3, b);
        assert_eq!(k.bonus(3, &a), KILLER_SECONDARY_BONUS, "re-recording the primary keeps the secondary");
        k.record(MAX_PLY + 10, a);
    }

    #[test]
    fn history_accumulates_depth_squared() {
        let pos = Position::startpos();
        let m = pos.legal_moves()[0];
        let mut h = HistoryTable::default();
        h.bump(&m, 3);
        h.bump(&m, 2);
        assert_eq!(h.score(&m), 13);
        h.clear();
        assert_eq!(h.score(&m), 0);
    }
}
