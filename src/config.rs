use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::difficulty::{standard_catalog, DifficultyController, StrengthProfile};
use crate::error::ConfigError;
use crate::search::tt::DEFAULT_TT_MB;

pub const DEFAULT_ANALYSIS_DEPTH: u32 = 2;
pub const DEFAULT_HARD_LIMIT_FACTOR: u32 = 2;

/// Engine settings; every field has a default so partial JSON files work.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub levels: Vec<StrengthProfile>,
    /// Fixed lookahead for position-evaluation displays.
    pub analysis_depth: u32,
    pub hash_mb: usize,
    pub hard_limit_factor: u32,
    pub max_nodes: Option<u64>,
    /// Seed for blunder and fallback randomness; drawn once per session if unset.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            levels: standard_catalog(),
            analysis_depth: DEFAULT_ANALYSIS_DEPTH,
            hash_mb: DEFAULT_TT_MB,
            hard_limit_factor: DEFAULT_HARD_LIMIT_FACTOR,
            max_nodes: None,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis_depth == 0 { return Err(ConfigError::ZeroAnalysisDepth); }
        if self.hard_limit_factor == 0 { return Err(ConfigError::ZeroHardLimit); }
        self.difficulty().map(|_| ())
    }

    pub fn difficulty(&self) -> Result<DifficultyController, ConfigError> {
        DifficultyController::new(self.levels.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{ "seed": 9, "hash_mb": 4 }"#).unwrap();
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.hash_mb, 4);
        assert_eq!(cfg.levels.len(), 30);
        assert_eq!(cfg.analysis_depth, DEFAULT_ANALYSIS_DEPTH);
    }

    #[test]
    fn custom_catalog_is_validated() {
        let json = r#"{ "levels": [
            { "level": 1, "depth_cap": 3, "time_budget_ms": 900 },
            { "level": 2, "depth_cap": 2, "time_budget_ms": 1000 }
        ] }"#;
        assert!(matches!(EngineConfig::from_json_str(json), Err(ConfigError::NotMonotonic { level: 2 })));
        assert!(matches!(EngineConfig::from_json_str("{ \"analysis_depth\": 0 }"), Err(ConfigError::ZeroAnalysisDepth)));
        assert!(matches!(EngineConfig::from_json_str("not json"), Err(ConfigError::Json(_))));
    }
}
