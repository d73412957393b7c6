//! Strength levels: how deep and how long each bot thinks, and how often it
//! throws away its best move on purpose.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, EngineError};

pub const MIN_LEVEL: i32 = 1;
pub const STANDARD_LEVELS: i32 = 30;
/// Levels at or above this never blunder.
pub const BLUNDER_THRESHOLD: i32 = 11;
pub const BLUNDER_POOL: usize = 3;

// Each cap is a depth the level completes from the opening within its budget.
const DEPTH_CAPS: [u32; STANDARD_LEVELS as usize] =
    [1, 1, 1, 2, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4, 4, 5, 5, 5, 5, 5, 5, 6, 6, 6, 6];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrengthProfile {
    pub level: i32,
    pub depth_cap: u32,
    pub time_budget_ms: u64,
    #[serde(default)]
    pub blunder_probability: f64,
    #[serde(default = "default_pool")]
    pub candidate_pool: usize,
    /// Centipawn-loss boundaries used to grade a player's moves at this level.
    #[serde(default)]
    pub thresholds: QualityThresholds,
}

fn default_pool() -> usize { BLUNDER_POOL }

impl StrengthProfile {
    pub fn time_budget(&self) -> Duration { Duration::from_millis(self.time_budget_ms) }
}

/// A move losing less than `inaccuracy` centipawns is still good; from
/// `mistake` it is a mistake, from `blunder` a blunder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub inaccuracy: i32,
    pub mistake: i32,
    pub blunder: i32,
}

impl Default for QualityThresholds {
    fn default() -> Self { Self { inaccuracy: 40, mistake: 80, blunder: 150 } }
}

impl QualityThresholds {
    fn is_increasing(&self) -> bool { self.inaccuracy < self.mistake && self.mistake < self.blunder }
}

/// Stronger levels grade more strictly.
pub fn quality_thresholds(level: i32) -> QualityThresholds {
    let (inaccuracy, mistake, blunder) = match level {
        i32::MIN..=10 => (40, 80, 150),
        11..=15 => (35, 70, 130),
        16..=20 => (30, 60, 120),
        21..=24 => (25, 50, 100),
        25..=27 => (20, 40, 80),
        28..=29 => (15, 30, 60),
        _ => (10, 20, 40),
    };
    QualityThresholds { inaccuracy, mistake, blunder }
}

/// Row of the public level catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelInfo {
    pub level: i32,
    pub depth: u32,
    pub time_budget_ms: u64,
}

pub fn blunder_probability(level: i32) -> f64 {
    if level >= BLUNDER_THRESHOLD { return 0.0; }
    f64::from(BLUNDER_THRESHOLD - level.max(MIN_LEVEL)) * 0.05
}

/// The product's 30-level ladder.
pub fn standard_catalog() -> Vec<StrengthProfile> {
    DEPTH_CAPS
        .iter()
        .enumerate()
        .map(|(i, &depth_cap)| {
            let level = i as i32 + 1;
            StrengthProfile {
                level,
                depth_cap,
                time_budget_ms: 500 + 250 * i as u64,
                blunder_probability: blunder_probability(level),
                candidate_pool: BLUNDER_POOL,
                thresholds: quality_thresholds(level),
            }
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct DifficultyController {
    profiles: Vec<StrengthProfile>,
}

impl Default for DifficultyController {
    fn default() -> Self { Self { profiles: standard_catalog() } }
}

impl DifficultyController {
    /// Levels must run 1..=N without gaps; depth caps and budgets must not
    /// decrease as the level rises.
    pub fn new(profiles: Vec<StrengthProfile>) -> Result<Self, ConfigError> {
        if profiles.is_empty() { return Err(ConfigError::EmptyCatalog); }
        for (index, p) in profiles.iter().enumerate() {
            if p.level != index as i32 + MIN_LEVEL {
                return Err(ConfigError::NonContiguousLevels { index, found: p.level });
            }
            if p.depth_cap == 0 { return Err(ConfigError::ZeroDepth { level: p.level }); }
            if !(0.0..=1.0).contains(&p.blunder_probability) {
                return Err(ConfigError::BadProbability { level: p.level, probability: p.blunder_probability });
            }
            if !p.thresholds.is_increasing() { return Err(ConfigError::BadThresholds { level: p.level }); }
        }
        for pair in profiles.windows(2) {
            if pair[1].depth_cap < pair[0].depth_cap || pair[1].time_budget_ms < pair[0].time_budget_ms {
                return Err(ConfigError::NotMonotonic { level: pair[1].level });
            }
        }
        Ok(Self { profiles })
    }

    pub fn min_level(&self) -> i32 { MIN_LEVEL }

    pub fn max_level(&self) -> i32 { self.profiles.len() as i32 }

    pub fn profile(&self, level: i32) -> Result<&StrengthProfile, EngineError> {
        if level < self.min_level() || level > self.max_level() {
            return Err(EngineError::InvalidLevel { level, min: self.min_level(), max: self.max_level() });
        }
        Ok(&self.profiles[(level - MIN_LEVEL) as usize])
    }

    pub fn profiles(&self) -> &[StrengthProfile] { &self.profiles }

    pub fn catalog(&self) -> Vec<LevelInfo> {
        self.profiles
            .iter()
            .map(|p| LevelInfo { level: p.level, depth: p.depth_cap, time_budget_ms: p.time_budget_ms })
            .collect()
    }

    pub fn should_blunder<R: Rng + ?Sized>(profile: &StrengthProfile, rng: &mut R) -> bool {
        profile.blunder_probability > 0.0 && rng.gen_bool(profile.blunder_probability.min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_budgets_match_product_ladder() {
        let c = standard_catalog();
        assert_eq!(c.len(), 30);
        assert_eq!((c[0].depth_cap, c[0].time_budget_ms), (1, 500));
        assert_eq!((c[29].depth_cap, c[29].time_budget_ms), (6, 7750));
        assert!((c[0].blunder_probability - 0.5).abs() < 1e-9);
        assert!((c[9].blunder_probability - 0.05).abs() < 1e-9);
        assert_eq!(c[10].blunder_probability, 0.0);
    }

    #[test]
    fn rejects_gaps_and_zero_depth() {
        let mut c = standard_catalog();
        c.remove(4);
        assert!(matches!(DifficultyController::new(c), Err(ConfigError::NonContiguousLevels { index: 4, found: 6 })));
        let mut c = standard_catalog();
        c[0].depth_cap = 0;
        assert!(matches!(DifficultyController::new(c), Err(ConfigError::ZeroDepth { level: 1 })));
        assert!(matches!(DifficultyController::new(Vec::new()), Err(ConfigError::EmptyCatalog)));
        let mut c = standard_catalog();
        c[2].thresholds.mistake = c[2].thresholds.blunder;
        assert!(matches!(DifficultyController::new(c), Err(ConfigError::BadThresholds { level: 3 })));
    }

    #[test]
    fn grading_tightens_with_level() {
        let c = standard_catalog();
        assert_eq!(c[0].thresholds, QualityThresholds::default());
        assert_eq!(c[29].thresholds, QualityThresholds { inaccuracy: 10, mistake: 20, blunder: 40 });
        for pair in c.windows(2) {
            assert!(pair[1].thresholds.blunder <= pair[0].thresholds.blunder, "level {}", pair[1].level);
        }
    }
}
