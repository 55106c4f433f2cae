use chrono::{SecondsFormat, Utc};
use clap::Parser;
use pacman_level::board::Board;
use pacman_level::constants::{DEFAULT_MAP, PELLET_POINTS};
use pacman_level::log::{emit_log, StructuredLogLine};
use pacman_level::occupant::Player;
use pacman_level::types::{Direction, LevelSnapshot};
use pacman_level::{Game, Level, MapError, MapParser};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run seeded headless matches")]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 5)]
    runs: usize,
    #[arg(long, default_value_t = 2_000)]
    max_moves: usize,
    #[arg(long)]
    map: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum RunOutcome {
    Completed,
    Died,
    OutOfMoves,
}

impl RunOutcome {
    fn key(self) -> String {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Died => "died",
            RunOutcome::OutOfMoves => "out_of_moves",
        }
        .to_string()
    }
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    run: usize,
    seed: u64,
    outcome: RunOutcome,
    moves: usize,
    score: u32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: usize,
    #[serde(rename = "remainingPellets")]
    remaining_pellets: usize,
    ghosts: usize,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "runCount")]
    run_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: u32,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    runs: Vec<RunResultLine>,
}

fn main() {
    let cli = Cli::parse();
    let started_at = Utc::now();
    let base_seed = cli
        .seed
        .unwrap_or_else(|| started_at.timestamp_millis().unsigned_abs());
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(base_seed, started_at.timestamp_millis()));

    let board = match load_board(cli.map.as_deref()) {
        Ok(board) => board,
        Err(error) => {
            log_for_match(
                "error",
                "map_load_failed",
                &match_id,
                json!({
                    "path": cli.map.as_ref().map(|path| path.to_string_lossy().to_string()),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    };

    let mut results = Vec::with_capacity(cli.runs);
    for run in 0..cli.runs {
        let seed = base_seed.wrapping_add(run as u64);
        log_for_match(
            "info",
            "run_started",
            &match_id,
            json!({ "run": run, "seed": seed, "maxMoves": cli.max_moves }),
        );
        let result = run_match(&board, run, seed, cli.max_moves);
        for anomaly in &result.anomalies {
            log_for_match(
                "warn",
                "anomaly_detected",
                &match_id,
                json!({ "run": run, "message": anomaly }),
            );
        }
        log_for_match(
            "info",
            "run_finished",
            &match_id,
            json!({
                "run": run,
                "outcome": result.outcome,
                "moves": result.moves,
                "score": result.score,
            }),
        );
        match serde_json::to_string(&result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                "error",
                "result_serialize_failed",
                json!({ "error": error.to_string() }),
            ),
        }
        results.push(result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        results,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            log_for_match(
                "error",
                "summary_write_failed",
                &match_id,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    log_for_match(
        "info",
        "simulation_finished",
        &match_id,
        json!({
            "runCount": summary.run_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if summary.anomaly_count > 0 {
        std::process::exit(1);
    }
}

fn load_board(path: Option<&Path>) -> Result<Board, MapError> {
    let parser = MapParser::new();
    match path {
        Some(path) => parser.load_map(path),
        None => parser.parse_str(DEFAULT_MAP),
    }
}

/// One headless match: the player wanders at random, ghosts take a step
/// after every player move.
fn run_match(board: &Board, run: usize, seed: u64, max_moves: usize) -> RunResultLine {
    let mut rng = StdRng::seed_from_u64(seed);
    let level = Arc::new(Level::new(board.clone()));
    let ghosts = level.spawn_ghosts().len();
    let initial_pellets = level.remaining_pellets();

    let mut anomalies = Vec::new();
    let mut seen = HashSet::new();
    let mut moves = 0usize;
    let outcome = match Game::new(Arc::clone(&level), Player::default()) {
        Ok(game) => {
            game.start();
            let mut previous_pellets = initial_pellets;
            while game.is_in_progress() && moves < max_moves {
                let direction = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
                if let Err(error) = game.step(direction) {
                    push_anomaly(&mut anomalies, &mut seen, error.to_string());
                    break;
                }
                level.step_ghosts(&mut rng);
                moves += 1;

                let snapshot = level.snapshot();
                let messages =
                    collect_snapshot_anomalies(&snapshot, initial_pellets, previous_pellets);
                for message in messages {
                    push_anomaly(&mut anomalies, &mut seen, message);
                }
                previous_pellets = snapshot.remaining_pellets;
            }
            if level.is_completed() {
                RunOutcome::Completed
            } else if game.player_view().is_some_and(|view| !view.alive) {
                RunOutcome::Died
            } else {
                RunOutcome::OutOfMoves
            }
        }
        Err(error) => {
            push_anomaly(&mut anomalies, &mut seen, error.to_string());
            RunOutcome::OutOfMoves
        }
    };

    let remaining_pellets = level.remaining_pellets();
    let score = level
        .players()
        .first()
        .and_then(|id| level.player_view(*id))
        .map(|view| view.score)
        .unwrap_or(0);
    RunResultLine {
        run,
        seed,
        outcome,
        moves,
        score,
        pellets_eaten: initial_pellets.saturating_sub(remaining_pellets),
        remaining_pellets,
        ghosts,
        anomalies,
    }
}

/// Cross-checks a snapshot against what a single-player match allows.
fn collect_snapshot_anomalies(
    snapshot: &LevelSnapshot,
    initial_pellets: usize,
    previous_pellets: usize,
) -> Vec<String> {
    let mut messages = Vec::new();
    if snapshot.remaining_pellets > previous_pellets {
        messages.push(format!(
            "pellet count grew from {previous_pellets} to {}",
            snapshot.remaining_pellets
        ));
    }
    let eaten = initial_pellets.saturating_sub(snapshot.remaining_pellets);
    let expected = eaten as u32 * PELLET_POINTS;
    for player in &snapshot.players {
        if player.score != expected {
            messages.push(format!(
                "player {} scored {} but {eaten} pellets are gone",
                player.id.0, player.score
            ));
        }
    }
    if snapshot.completed && snapshot.remaining_pellets != 0 {
        messages.push("completed with pellets left".to_string());
    }
    if snapshot.completed && snapshot.players.iter().all(|player| !player.alive) {
        messages.push("completed with nobody alive".to_string());
    }
    messages
}

fn push_anomaly(anomalies: &mut Vec<String>, seen: &mut HashSet<String>, message: String) {
    if seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u64, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at: String,
    finished_at: String,
    runs: Vec<RunResultLine>,
) -> RunSummary {
    let run_count = runs.len();
    let anomaly_count = runs.iter().map(|run| run.anomalies.len()).sum();
    let total_score: u64 = runs.iter().map(|run| u64::from(run.score)).sum();
    let average_score = if run_count == 0 {
        0
    } else {
        (total_score / run_count as u64) as u32
    };
    let mut outcome_counts = BTreeMap::new();
    for run in &runs {
        *outcome_counts.entry(run.outcome.key()).or_insert(0) += 1;
    }
    RunSummary {
        match_id,
        started_at,
        finished_at,
        run_count,
        anomaly_count,
        average_score,
        outcome_counts,
        runs,
    }
}

fn log_for_match(level: &str, event: &str, match_id: &str, details: serde_json::Value) {
    StructuredLogLine::new(level, event, details)
        .with_source(match_id)
        .emit();
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
