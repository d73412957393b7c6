use anyhow::Result;
use clap::Parser;
use cozy_chess::Color;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use tutorbot::search::eval::material_eval_cp;
use tutorbot::{BotSession, EngineConfig, Outcome, Position};

#[derive(Parser, Debug)]
#[command(name = "ladder", about = "Play games between adjacent strength levels")]
struct Args {
    /// Lowest level of the first pairing
    #[arg(long, default_value_t = 1)]
    from: i32,

    /// Highest level to include
    #[arg(long, default_value_t = 10)]
    to: i32,

    /// Games per adjacent pair (colors alternate)
    #[arg(long, default_value_t = 8)]
    games: usize,

    /// Cap on every level's time budget in milliseconds
    #[arg(long, default_value_t = 200)]
    movetime_cap: u64,

    /// Random plies played before the bots take over
    #[arg(long, default_value_t = 4)]
    open_plies: usize,

    /// Max plies before adjudicating on material
    #[arg(long, default_value_t = 160)]
    max_plies: usize,

    /// Material margin (centipawns) needed to win on adjudication
    #[arg(long, default_value_t = 300)]
    adjudicate_cp: i32,

    /// Worker threads (0 = rayon default)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    #[arg(long, default_value_t = 1u64)]
    seed: u64,

    /// Optional JSON engine config to start from
    #[arg(long)]
    config: Option<String>,

    /// Optional: write summary JSON to this path
    #[arg(long)]
    json_out: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct Job {
    low: i32,
    game: usize,
    high_is_white: bool,
    seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Verdict {
    HighWins,
    LowWins,
    Draw,
}

#[derive(Debug, Clone, Copy)]
struct GameRecord {
    low: i32,
    verdict: Verdict,
    plies: usize,
    adjudicated: bool,
}

#[derive(Debug, Default, Serialize)]
struct PairSummary {
    low: i32,
    high: i32,
    games: usize,
    high_wins: usize,
    low_wins: usize,
    draws: usize,
    adjudicated: usize,
    avg_plies: f64,
    high_score: f64,
}

fn capped_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match args.config.as_deref() {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    for p in &mut config.levels {
        p.time_budget_ms = p.time_budget_ms.min(args.movetime_cap);
    }
    config.validate()?;
    Ok(config)
}

fn play_game(job: &Job, base: &EngineConfig, args: &Args) -> Result<GameRecord> {
    let mut rng = SmallRng::seed_from_u64(job.seed);
    let mut low = BotSession::new(base.clone().with_seed(job.seed))?;
    let mut high = BotSession::new(base.clone().with_seed(job.seed.rotate_left(32)))?;

    let mut pos = Position::startpos();
    for _ in 0..args.open_plies {
        let moves = pos.legal_moves();
        let Some(mv) = moves.choose(&mut rng) else { break };
        pos = pos.play(mv)?;
    }

    let mut plies = 0;
    while plies < args.max_plies && !pos.outcome().is_terminal() {
        let high_to_move = (pos.side_to_move() == Color::White) == job.high_is_white;
        let reply = if high_to_move {
            high.get_best_move(&pos.fen(), job.low + 1)?
        } else {
            low.get_best_move(&pos.fen(), job.low)?
        };
        let Some(text) = reply.mv else { break };
        let mv = pos.parse_uci(&text)?;
        pos = pos.play(&mv)?;
        plies += 1;
    }

    let white_verdict = |white_won: bool| {
        if white_won == job.high_is_white { Verdict::HighWins } else { Verdict::LowWins }
    };
    let (verdict, adjudicated) = match pos.outcome() {
        Outcome::Checkmate => (white_verdict(pos.side_to_move() == Color::Black), false),
        Outcome::Stalemate | Outcome::Draw(_) => (Verdict::Draw, false),
        Outcome::Ongoing => {
            let material = material_eval_cp(pos.board());
            if material.abs() >= args.adjudicate_cp {
                (white_verdict(material > 0), true)
            } else {
                (Verdict::Draw, true)
            }
        }
    };
    Ok(GameRecord { low: job.low, verdict, plies, adjudicated })
}

fn summarize(low: i32, records: &[GameRecord]) -> PairSummary {
    let mut s = PairSummary { low, high: low + 1, ..Default::default() };
    let mut total_plies = 0;
    for r in records.iter().filter(|r| r.low == low) {
        s.games += 1;
        total_plies += r.plies;
        if r.adjudicated { s.adjudicated += 1; }
        match r.verdict {
            Verdict::HighWins => s.high_wins += 1,
            Verdict::LowWins => s.low_wins += 1,
            Verdict::Draw => s.draws += 1,
        }
    }
    if s.games > 0 {
        s.avg_plies = total_plies as f64 / s.games as f64;
        s.high_score = (s.high_wins as f64 + 0.5 * s.draws as f64) / s.games as f64;
    }
    s
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new().num_threads(args.threads).build_global()?;
    }

    let base = capped_config(&args)?;
    let max_level = base.levels.len() as i32;
    let from = args.from.max(1);
    let to = args.to.min(max_level);
    anyhow::ensure!(from < to, "need at least two levels (got {from}..={to})");

    let (games, seed) = (args.games, args.seed);
    let jobs: Vec<Job> = (from..to)
        .flat_map(|low| {
            (0..games).map(move |game| Job {
                low,
                game,
                high_is_white: game % 2 == 0,
                seed: seed ^ ((low as u64) << 32) ^ (game as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
            })
        })
        .collect();

    let bar = ProgressBar::new(jobs.len() as u64).with_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("=> "),
    );

    let records: Vec<GameRecord> = jobs
        .par_iter()
        .map(|job| {
            let r = play_game(job, &base, &args);
            bar.set_message(format!("L{} g{}", job.low, job.game));
            bar.inc(1);
            r
        })
        .collect::<Result<_>>()?;
    bar.finish_and_clear();

    let summaries: Vec<PairSummary> = (from..to).map(|low| summarize(low, &records)).collect();
    for s in &summaries {
        println!(
            "L{:>2} vs L{:>2}: games={} high={} low={} draws={} adjudicated={} avg_plies={:.1} high_score={:.3}",
            s.low, s.high, s.games, s.high_wins, s.low_wins, s.draws, s.adjudicated, s.avg_plies, s.high_score
        );
    }

    if let Some(path) = args.json_out.as_deref() {
        let payload = serde_json::json!({
            "seed": args.seed,
            "games_per_pair": args.games,
            "movetime_cap_ms": args.movetime_cap,
            "open_plies": args.open_plies,
            "max_plies": args.max_plies,
            "pairs": summaries,
        });
        if let Err(e) = std::fs::write(path, serde_json::to_string_pretty(&payload)?) {
            eprintln!("warn: failed to write json_out: {}", e);
        }
    }
    Ok(())
}
