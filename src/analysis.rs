//! Coaching output: position analysis, graded moves and the key moments of
//! a finished game. Produced by [`BotSession`](crate::BotSession).

use std::fmt;

use serde::Serialize;

use crate::difficulty::QualityThresholds;

/// Key moments kept per game.
pub const KEY_MOMENTS: usize = 3;
/// Longest principal variation reported.
pub const MAX_PV_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveQuality {
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl MoveQuality {
    /// Grade a move by how many centipawns it gave up against the best one.
    pub fn from_cp_loss(cp_loss: i32, t: &QualityThresholds) -> Self {
        if cp_loss < 10 { return MoveQuality::Excellent; }
        if cp_loss < 25 || cp_loss < t.inaccuracy { return MoveQuality::Good; }
        if cp_loss < t.mistake { return MoveQuality::Inaccuracy; }
        if cp_loss < t.blunder { return MoveQuality::Mistake; }
        MoveQuality::Blunder
    }

    pub fn is_error(self) -> bool { self >= MoveQuality::Inaccuracy }
}

impl fmt::Display for MoveQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MoveQuality::Excellent => "excellent",
            MoveQuality::Good => "good",
            MoveQuality::Inaccuracy => "inaccuracy",
            MoveQuality::Mistake => "mistake",
            MoveQuality::Blunder => "blunder",
        };
        f.write_str(s)
    }
}

/// Best move, expected line and White-positive evaluation of a position.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionAnalysis {
    pub best_move: Option<String>,
    pub evaluation: f64,
    pub evaluation_cp: i32,
    pub principal_variation: Vec<String>,
    pub depth: u32,
}

/// One graded move. Scores are centipawns from the mover's side.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveReview {
    pub ply: usize,
    #[serde(rename = "move")]
    pub mv: String,
    pub best_move: String,
    pub played_cp: i32,
    pub best_cp: i32,
    pub cp_loss: i32,
    pub quality: MoveQuality,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMoment {
    pub ply: usize,
    #[serde(rename = "move")]
    pub mv: String,
    /// White-positive pawns after the move.
    pub evaluation: f64,
    pub quality: MoveQuality,
    pub comment: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAnalysis {
    pub level: i32,
    pub reviews: Vec<MoveReview>,
    pub key_moments: Vec<KeyMoment>,
}

impl KeyMoment {
    pub(crate) fn from_review(r: &MoveReview, white_cp: i32) -> Self {
        let comment = if r.quality.is_error() {
            format!("{} ({} cp): {} was stronger", r.quality, r.cp_loss, r.best_move)
        } else {
            format!("{}: kept the balance", r.quality)
        };
        Self { ply: r.ply, mv: r.mv.clone(), evaluation: f64::from(white_cp) / 100.0, quality: r.quality, comment }
    }
}

/// The `limit` costliest errors, most costly first, earlier plies first on ties.
pub fn pick_key_moments(reviews: &[MoveReview], limit: usize) -> Vec<&MoveReview> {
    let mut errors: Vec<&MoveReview> = reviews.iter().filter(|r| r.quality.is_error()).collect();
    errors.sort_by(|a, b| b.cp_loss.cmp(&a.cp_loss).then_with(|| a.ply.cmp(&b.ply)));
    errors.truncate(limit);
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::quality_thresholds;

    fn review(ply: usize, cp_loss: i32, quality: MoveQuality) -> MoveReview {
        MoveReview {
            ply,
            mv: format!("m{ply}"),
            best_move: "e2e4".into(),
            played_cp: -cp_loss,
            best_cp: 0,
            cp_loss,
            quality,
        }
    }

    #[test]
    fn grades_follow_level_thresholds() {
        let beginner = quality_thresholds(1);
        let cases = [
            (0, MoveQuality::Excellent),
            (9, MoveQuality::Excellent),
            (24, MoveQuality::Good),
            (39, MoveQuality::Good),
            (40, MoveQuality::Inaccuracy),
            (80, MoveQuality::Mistake),
            (149, MoveQuality::Mistake),
            (150, MoveQuality::Blunder),
        ];
        for (loss, want) in cases {
            assert_eq!(MoveQuality::from_cp_loss(loss, &beginner), want, "loss {loss}");
        }
        // the top level calls a 45 cp slip a blunder
        assert_eq!(MoveQuality::from_cp_loss(45, &quality_thresholds(30)), MoveQuality::Blunder);
        assert_eq!(MoveQuality::from_cp_loss(45, &beginner), MoveQuality::Inaccuracy);
    }

    #[test]
    fn key_moments_are_the_costliest_errors() {
        let reviews = vec![
            review(1, 0, MoveQuality::Excellent),
            review(2, 90, MoveQuality::Mistake),
            review(3, 300, MoveQuality::Blunder),
            review(4, 90, MoveQuality::Mistake),
            review(5, 45, MoveQuality::Inaccuracy),
        ];
        let picked: Vec<usize> = pick_key_moments(&reviews, 3).iter().map(|r| r.ply).collect();
        assert_eq!(picked, vec![3, 2, 4]);
        assert!(pick_key_moments(&reviews[..1], 3).is_empty());
    }
}
