use thiserror::Error;

/// Failures reported by the rules oracle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },
    #[error("illegal move {mv} in position {fen}")]
    IllegalMove { mv: String, fen: String },
    #[error("unrecognized move notation '{0}'")]
    BadMoveNotation(String),
    #[error("rules oracle failure: {0}")]
    Internal(String),
}

/// Problems with a level catalog or engine configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("level catalog is empty")]
    EmptyCatalog,
    #[error("level catalog must start at 1 and be contiguous (found level {found} at index {index})")]
    NonContiguousLevels { index: usize, found: i32 },
    #[error("level {level}: depth cap and time budget must not decrease with level")]
    NotMonotonic { level: i32 },
    #[error("level {level}: depth cap must be at least 1")]
    ZeroDepth { level: i32 },
    #[error("level {level}: blunder probability {probability} outside [0, 1]")]
    BadProbability { level: i32, probability: f64 },
    #[error("level {level}: move-quality thresholds must strictly increase")]
    BadThresholds { level: i32 },
    #[error("analysis depth must be at least 1")]
    ZeroAnalysisDepth,
    #[error("hard limit factor must be at least 1")]
    ZeroHardLimit,
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Conditions surfaced by the bot session and the search engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("strength level {level} outside supported range {min}..={max}")]
    InvalidLevel { level: i32, min: i32, max: i32 },
    #[error("invalid position: {0}")]
    InvalidPosition(#[source] OracleError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("every root candidate failed to apply")]
    NoSearchableCandidates,
}
