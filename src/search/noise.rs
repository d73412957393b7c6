use rand::Rng;

use crate::board::Move;

/// Choose uniformly among the `pool` highest-ranked alternatives to `best`.
/// `ranked` is best-first. Returns `None` when there is no alternative.
pub fn choose_alternative<R: Rng + ?Sized>(
    ranked: &[(Move, i32)],
    best: &Move,
    pool: usize,
    rng: &mut R,
) -> Option<(Move, i32)> {
    let candidates: Vec<(Move, i32)> = ranked
        .iter()
        .filter(|(m, _)| !m.same_as(best))
        .take(pool.max(1))
        .copied()
        .collect();
    if candidates.is_empty() { return None; }
    let idx = rng.gen_range(0..candidates.len());
    Some(candidates[idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn never_returns_best_and_stays_in_pool() {
        let pos = Position::startpos();
        let ranked: Vec<(Move, i32)> = pos.legal_moves().into_iter().zip((0..).map(|i| 100 - i)).collect();
        let best = ranked[0].0;
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let (m, score) = choose_alternative(&ranked, &best, 3, &mut rng).unwrap();
            assert!(!m.same_as(&best));
            assert!(score == 99 || score == 98 || score == 97, "picked outside top-3 alternatives: {score}");
        }
    }

    #[test]
    fn single_move_has_no_alternative() {
        let pos = Position::startpos();
        let only = pos.legal_moves()[0];
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(choose_alternative(&[(only, 0)], &only, 3, &mut rng).is_none());
    }
}
