use clap::Parser;
use pacman_level::board::Board;
use pacman_level::constants::{DEFAULT_GHOST_TICK_MS, DEFAULT_MAP};
use pacman_level::log::{emit_log, EventLogger};
use pacman_level::occupant::Player;
use pacman_level::render::render_frame;
use pacman_level::types::{Direction, MoveOutcome};
use pacman_level::{Game, Level, LevelError, MapError, MapParser};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about = "Play a level in the terminal")]
struct Cli {
    /// Map file; falls back to PACMAN_MAP, then the built-in map.
    #[arg(long)]
    map: Option<PathBuf>,
    /// Milliseconds between ghost steps; falls back to PACMAN_GHOST_TICK_MS.
    #[arg(long)]
    ghost_tick_ms: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Move(Direction),
    Start,
    Stop,
    Revive,
    Show,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let word = line.trim().to_ascii_lowercase();
    if let Some(direction) = Direction::parse_move(&word) {
        return Some(Command::Move(direction));
    }
    match word.as_str() {
        "start" => Some(Command::Start),
        "stop" => Some(Command::Stop),
        "revive" => Some(Command::Revive),
        "show" | "" => Some(Command::Show),
        "quit" | "exit" | "q" => Some(Command::Quit),
        _ => None,
    }
}

fn resolve_map_path(cli: &Cli) -> Option<PathBuf> {
    cli.map
        .clone()
        .or_else(|| std::env::var("PACMAN_MAP").ok().map(PathBuf::from))
}

fn resolve_ghost_tick_ms(cli: &Cli) -> u64 {
    cli.ghost_tick_ms
        .or_else(|| {
            std::env::var("PACMAN_GHOST_TICK_MS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
        })
        .unwrap_or(DEFAULT_GHOST_TICK_MS)
        .max(1)
}

fn load_board(path: Option<&Path>) -> Result<Board, MapError> {
    let parser = MapParser::new();
    match path {
        Some(path) => parser.load_map(path),
        None => parser.parse_str(DEFAULT_MAP),
    }
}

fn start_ghost_ticker(game: Arc<Game>, tick_ms: u64, seed: u64) {
    tokio::spawn(async move {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
        loop {
            interval.tick().await;
            game.level().tick_animations();
            if game.is_in_progress() {
                game.level().step_ghosts(&mut rng);
            }
        }
    });
}

/// Applies one command. Returns false when the session should end.
fn apply_command(game: &Game, command: Command) -> Result<bool, LevelError> {
    match command {
        Command::Move(direction) => match game.step(direction)? {
            None => println!("[play] game is not running; type `start`"),
            Some(MoveOutcome::Frozen) => println!("[play] level already completed"),
            Some(MoveOutcome::Blocked | MoveOutcome::Moved) => {}
        },
        Command::Start => {
            if game.level().is_completed() {
                println!("[play] level already completed");
            } else {
                game.start();
            }
        }
        Command::Stop => game.stop(),
        Command::Revive => {
            if !game.revive()? {
                println!("[play] nowhere to revive to");
            }
        }
        Command::Show => {}
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let map_path = resolve_map_path(&cli);
    let tick_ms = resolve_ghost_tick_ms(&cli);
    let seed = cli.seed.unwrap_or_else(rand::random);

    let board = match load_board(map_path.as_deref()) {
        Ok(board) => board,
        Err(error) => {
            emit_log(
                "error",
                "map_load_failed",
                json!({
                    "path": map_path.as_ref().map(|path| path.to_string_lossy().to_string()),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    };

    let level = Arc::new(Level::new(board));
    level.add_observer(Arc::new(EventLogger::new("play")));
    let ghosts = level.spawn_ghosts();
    let game = match Game::new(Arc::clone(&level), Player::default()) {
        Ok(game) => Arc::new(game),
        Err(error) => {
            emit_log(
                "error",
                "player_register_failed",
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };
    emit_log(
        "info",
        "level_loaded",
        json!({
            "map": map_path.as_ref().map(|path| path.to_string_lossy().to_string()),
            "ghosts": ghosts.len(),
            "pellets": level.remaining_pellets(),
            "ghostTickMs": tick_ms,
            "seed": seed,
        }),
    );

    start_ghost_ticker(Arc::clone(&game), tick_ms, seed);
    println!("[play] commands: w/a/s/d, up/down/left/right, start, stop, revive, show, quit");
    print!("{}", render_frame(&level.snapshot()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(error) => {
                emit_log("error", "stdin_failed", json!({ "error": error.to_string() }));
                break;
            }
        };
        let Some(command) = parse_command(&line) else {
            println!("[play] unknown command: {}", line.trim());
            continue;
        };
        match apply_command(&game, command) {
            Ok(true) => {}
            Ok(false) => break,
            Err(error) => {
                emit_log("warn", "command_failed", json!({ "error": error.to_string() }));
            }
        }
        print!("{}", render_frame(&level.snapshot()));
        if let Some(view) = game.player_view() {
            if !view.alive {
                println!("[play] you died; `revive` then `start` to keep going");
            }
        }
    }

    let score = game.player_view().map(|view| view.score).unwrap_or(0);
    emit_log(
        "info",
        "session_finished",
        json!({ "score": score, "completed": level.is_completed() }),
    );
}
