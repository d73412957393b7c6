use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use tutorbot::{BotSession, EngineConfig, RulesOracle};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Parser, Debug)]
#[command(author, version, about = "Graded-strength chess bot", long_about = None)]
struct Args {
    /// JSON engine config (levels, hash size, analysis depth, seed)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for blunder and fallback randomness
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pick a move for a position at a strength level
    Move {
        #[arg(long, default_value = START_FEN)]
        fen: String,
        #[arg(long, default_value_t = 10)]
        level: i32,
    },
    /// Evaluate a position in pawns, White-positive
    Eval {
        #[arg(long, default_value = START_FEN)]
        fen: String,
    },
    /// Best move, principal variation and evaluation of a position
    Analyze {
        #[arg(long, default_value = START_FEN)]
        fen: String,
        /// Search depth (defaults to the configured analysis depth)
        #[arg(long)]
        depth: Option<u32>,
    },
    /// Grade every move of a game and list its key moments
    Review {
        #[arg(long, default_value = START_FEN)]
        fen: String,
        /// Level whose thresholds grade the moves
        #[arg(long, default_value_t = 10)]
        level: i32,
        /// Moves in coordinate notation, e.g. e2e4 e7e5
        moves: Vec<String>,
    },
    /// List the available strength levels
    Levels,
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty { serde_json::to_string_pretty(value)? } else { serde_json::to_string(value)? };
    println!("{text}");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let mut session = BotSession::new(config).context("invalid engine config")?;
    info!("session seed {}", session.seed());

    match &args.command {
        Command::Move { fen, level } => {
            let reply = session.get_best_move(fen, *level)?;
            print_json(&reply, args.pretty)?;
        }
        Command::Eval { fen } => {
            let pawns = session.evaluate_position(fen)?;
            print_json(&serde_json::json!({ "fen": fen, "evaluation": pawns }), args.pretty)?;
        }
        Command::Analyze { fen, depth } => {
            let analysis = match depth {
                Some(d) => {
                    let pos = session.oracle().parse_fen(fen).context("invalid FEN")?;
                    session.analyze(&pos, *d)
                }
                None => session.analyze_position(fen)?,
            };
            print_json(&analysis, args.pretty)?;
        }
        Command::Review { fen, level, moves } => {
            let report = session.analyze_game(fen, moves, *level)?;
            print_json(&report, args.pretty)?;
        }
        Command::Levels => {
            print_json(&session.level_catalog(), args.pretty)?;
        }
    }
    Ok(())
}
