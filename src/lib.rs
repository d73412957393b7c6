// Graded-strength chess bots: alpha-beta search over cozy-chess positions
pub mod analysis;
pub mod board;
pub mod bot;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod search;

pub use analysis::{GameAnalysis, KeyMoment, MoveQuality, MoveReview, PositionAnalysis};
pub use bot::{BotMove, BotSession, EngineMoveResult};
pub use config::EngineConfig;
pub use difficulty::{DifficultyController, LevelInfo, QualityThresholds, StrengthProfile};
pub use error::{ConfigError, EngineError, OracleError};
pub use board::{CozyOracle, Move, Outcome, Position, RulesOracle};
