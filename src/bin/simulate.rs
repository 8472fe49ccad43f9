use std::collections::BTreeMap;

use clap::Parser;
use match3_arena_server::constants::{BOARD_HEIGHT, BOARD_WIDTH};
use match3_arena_server::registry::SessionRegistry;
use match3_arena_server::types::{Coord, GameError, GameOutcome, SoloMode};
use serde::Serialize;
use serde_json::json;

/// Drives complete games through the registry without a network, printing
/// one JSON result line per game plus a closing summary.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Game mode: multiplayer, endless or level.
    #[arg(long, default_value = "multiplayer")]
    mode: String,
    /// Base seed; game N runs with seed + N.
    #[arg(long, default_value_t = 1)]
    seed: u32,
    /// Number of games to play.
    #[arg(long, default_value_t = 20)]
    games: u32,
    /// Roster size for multiplayer games (2-4).
    #[arg(long, default_value_t = 2)]
    players: usize,
    /// Endless games stop after this many accepted moves.
    #[arg(long, default_value_t = 60)]
    max_moves: u32,
}

#[derive(Clone, Debug, Serialize)]
struct GameResultLine {
    game: u32,
    seed: u32,
    mode: String,
    #[serde(rename = "acceptedMoves")]
    accepted_moves: u32,
    #[serde(rename = "rejectedSwaps")]
    rejected_swaps: u32,
    #[serde(rename = "topScore")]
    top_score: i32,
    outcome: Option<GameOutcome>,
    stuck: bool,
}

fn main() {
    let cli = Cli::parse();
    let players = cli.players.clamp(2, 4);

    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_moves = 0u64;

    for game in 0..cli.games {
        let seed = cli.seed.wrapping_add(game);
        let line = match cli.mode.as_str() {
            "multiplayer" => run_multiplayer(game, seed, players),
            "endless" => run_solo(game, seed, SoloMode::Endless, cli.max_moves),
            "level" => run_solo(game, seed, SoloMode::Level, cli.max_moves),
            other => {
                eprintln!("[simulate] unknown mode: {other}");
                std::process::exit(2);
            }
        };

        let key = match &line.outcome {
            Some(GameOutcome::Winner { .. }) => "winner",
            Some(GameOutcome::Draw) => "draw",
            Some(GameOutcome::LevelCompleted) => "level_completed",
            Some(GameOutcome::LevelFailed) => "level_failed",
            None if line.stuck => "stuck",
            None => "move_cap",
        };
        *outcome_counts.entry(key.to_string()).or_default() += 1;
        total_moves += line.accepted_moves as u64;

        println!("{}", json!({ "event": "game_result", "result": line }));
    }

    let average_moves = if cli.games > 0 {
        total_moves / cli.games as u64
    } else {
        0
    };
    println!(
        "{}",
        json!({
            "event": "summary",
            "mode": cli.mode,
            "games": cli.games,
            "averageMoves": average_moves,
            "outcomes": outcome_counts,
        })
    );
}

fn run_multiplayer(game: u32, seed: u32, players: usize) -> GameResultLine {
    let mut registry = SessionRegistry::new();
    let mut first_turn = None;
    for idx in 0..players {
        let conn = format!("p{idx}");
        let name = format!("P{idx}");
        let outcome = registry
            .join_room("sim", &name, &conn, seed)
            .expect("simulated roster fits the room");
        if let Some(current) = outcome.snapshot.current_player {
            first_turn = Some(current);
        }
    }
    let first_turn = first_turn.expect("two joins start the game");
    play_out(&mut registry, game, seed, "multiplayer", first_turn, u32::MAX)
}

fn run_solo(game: u32, seed: u32, mode: SoloMode, max_moves: u32) -> GameResultLine {
    let mut registry = SessionRegistry::new();
    registry.start_single_player("Sim", mode, "p0", seed);
    let mode_name = match mode {
        SoloMode::Endless => "endless",
        SoloMode::Level => "level",
    };
    play_out(&mut registry, game, seed, mode_name, "p0".to_string(), max_moves)
}

fn play_out(
    registry: &mut SessionRegistry,
    game: u32,
    seed: u32,
    mode: &str,
    first_turn: String,
    max_moves: u32,
) -> GameResultLine {
    let mut accepted = 0u32;
    let mut rejected = 0u32;
    let mut outcome = None;
    let mut top_score = 0;
    let mut stuck = false;
    let mut current = first_turn;

    while accepted < max_moves {
        let Some(applied) = find_accepted_move(registry, &current) else {
            stuck = true;
            break;
        };
        accepted += 1;
        rejected += applied.rejected;
        top_score = top_score.max(
            applied
                .snapshot_top_score
                .unwrap_or(top_score),
        );
        if let Some(finished) = applied.outcome {
            outcome = Some(finished);
            break;
        }
        if let Some(next) = applied.next_player {
            current = next;
        }
    }

    GameResultLine {
        game,
        seed,
        mode: mode.to_string(),
        accepted_moves: accepted,
        rejected_swaps: rejected,
        top_score,
        outcome,
        stuck,
    }
}

struct AttemptResult {
    rejected: u32,
    outcome: Option<GameOutcome>,
    next_player: Option<String>,
    snapshot_top_score: Option<i32>,
}

fn find_accepted_move(registry: &mut SessionRegistry, actor: &str) -> Option<AttemptResult> {
    let mut rejected = 0u32;
    for row in 0..BOARD_HEIGHT as i32 {
        for col in 0..BOARD_WIDTH as i32 {
            for (to_row, to_col) in [(row, col + 1), (row + 1, col)] {
                match registry.apply_move(actor, Coord::new(row, col), Coord::new(to_row, to_col))
                {
                    Ok(applied) => {
                        return Some(AttemptResult {
                            rejected,
                            outcome: applied.outcome,
                            next_player: applied.snapshot.current_player,
                            snapshot_top_score: applied
                                .snapshot
                                .players
                                .iter()
                                .map(|player| player.score)
                                .max(),
                        });
                    }
                    Err(GameError::NoMatch) | Err(GameError::InvalidMove) => {
                        rejected += 1;
                        continue;
                    }
                    Err(other) => {
                        eprintln!("[simulate] unexpected rejection: {other:?}");
                        return None;
                    }
                }
            }
        }
    }
    None
}
