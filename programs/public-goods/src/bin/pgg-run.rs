//! Run complete Public Goods Games from the command line.
//!
//! Seats play dev-mode random moves unless `--strategies` names a scripted
//! strategy per seat. Prints the final rankings and a round summary per game,
//! or one JSON document with every game.
//!
//! Usage: pgg-run [--games N] [--seed S] [--strategies a,b,c,d] [--config FILE] [--json]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use settlement_logic::{describe_strategy, DecisionSource, GameResult, Strategy};

use public_goods::instructions::{automated_sources, play_to_completion};
use public_goods::logging;
use public_goods::{GameRegistry, GameSession, PlatformConfig, PlayerKind};

const USAGE: &str =
    "Usage: pgg-run [--games N] [--seed S] [--strategies a,b,c,d] [--config FILE] [--json]";

struct Args {
    games: u32,
    seed: Option<u64>,
    strategies: Option<Vec<Strategy>>,
    config: Option<PathBuf>,
    json: bool,
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        games: 1,
        seed: None,
        strategies: None,
        config: None,
        json: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--games" => {
                i += 1;
                let raw = args.get(i).context("--games needs a value")?;
                parsed.games = raw.parse().with_context(|| format!("Invalid --games value: {}", raw))?;
            }
            "--seed" => {
                i += 1;
                let raw = args.get(i).context("--seed needs a value")?;
                parsed.seed = Some(raw.parse().with_context(|| format!("Invalid --seed value: {}", raw))?);
            }
            "--strategies" => {
                i += 1;
                let raw = args.get(i).context("--strategies needs a value")?;
                let strategies = raw
                    .split(',')
                    .map(|name| {
                        Strategy::from_name(name.trim())
                            .with_context(|| format!("Unknown strategy: {}", name))
                    })
                    .collect::<Result<Vec<_>>>()?;
                parsed.strategies = Some(strategies);
            }
            "--config" => {
                i += 1;
                let raw = args.get(i).context("--config needs a file")?;
                parsed.config = Some(PathBuf::from(raw));
            }
            "--json" => parsed.json = true,
            "--help" | "-h" => {
                println!("{}", USAGE);
                println!("Strategies: full, free, conditional, decay, fixed:N");
                std::process::exit(0);
            }
            other => bail!("Unknown argument: {}", other),
        }
        i += 1;
    }

    Ok(parsed)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[derive(Serialize)]
struct GameReport {
    game_id: String,
    seats: Vec<String>,
    result: GameResult,
    rounds: Vec<RoundRow>,
}

#[derive(Serialize)]
struct RoundRow {
    round: u32,
    total_invested: u32,
    average_investment: f64,
    investments: Vec<u32>,
}

fn round_rows(session: &GameSession) -> Vec<RoundRow> {
    session
        .rounds
        .iter()
        .map(|r| RoundRow {
            round: r.settlement.round_number,
            total_invested: r.settlement.pool_total,
            average_investment: r.settlement.average_investment(),
            investments: r.moves.iter().map(|m| m.invested).collect(),
        })
        .collect()
}

fn print_game(report: &GameReport) {
    println!("\nGame Results (ID: {})", report.game_id);
    println!("{}", "=".repeat(60));

    println!("\nFinal Results:");
    for standing in &report.result.rankings {
        let seat = standing
            .player_id
            .as_str()
            .trim_start_matches('p')
            .parse::<usize>()
            .ok()
            .and_then(|n| report.seats.get(n.wrapping_sub(1)))
            .map(String::as_str)
            .unwrap_or("?");
        println!(
            "{}. {} ({}): ${:.2}  invested {} tokens, cooperation {:.1}%",
            standing.rank,
            standing.player_id,
            seat,
            standing.total_earnings,
            standing.total_investment,
            standing.cooperation_rate,
        );
    }

    println!("\nRound Summary:");
    println!("Round | Total Invested | Avg Investment | Player Investments");
    println!("{}", "-".repeat(65));
    for row in &report.rounds {
        let investments: Vec<String> = row.investments.iter().map(|v| v.to_string()).collect();
        println!(
            "{:5} | {:14} | {:14.1} | {}",
            row.round,
            row.total_invested,
            row.average_investment,
            investments.join(" | "),
        );
    }
}

fn main() -> Result<()> {
    logging::init(logging::level_from_env()?);
    let args = parse_args()?;

    let mut config = match &args.config {
        Some(path) => PlatformConfig::from_json_file(path)?,
        None => PlatformConfig::from_env()?,
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let seats: Vec<PlayerKind> = match &args.strategies {
        Some(strategies) => {
            if strategies.len() != config.game.num_players as usize {
                bail!(
                    "Exactly {} strategies required, got {}",
                    config.game.num_players,
                    strategies.len()
                );
            }
            strategies.iter().map(|s| PlayerKind::Scripted { strategy: *s }).collect()
        }
        None => (0..config.game.num_players).map(|_| PlayerKind::DevRandom).collect(),
    };

    if !args.json {
        println!("Running {} game(s), seed {}", args.games, config.seed);
        if let Some(strategies) = &args.strategies {
            for (i, s) in strategies.iter().enumerate() {
                println!("  seat {}: {}", i + 1, describe_strategy(s));
            }
        }
    }

    let registry = GameRegistry::new();
    let mut reports = Vec::with_capacity(args.games as usize);

    for _ in 0..args.games {
        let now = unix_now();
        let game_id = registry.create_game(&config, now)?;
        for (i, kind) in seats.iter().enumerate() {
            registry.join_game(&game_id, &format!("Player_{}", i + 1), kind.clone(), now)?;
        }

        let report = registry.with_game(&game_id, |session| {
            // Only dev-random and scripted seats are seated, so no agent is ever built
            let mut sources = automated_sources(session, &config, |_| -> Box<dyn DecisionSource> {
                Box::new(Strategy::FreeRider)
            });
            let rng = session.rng(config.seed);
            let result = play_to_completion(session, &mut sources, config.fallback, &rng, now)?;
            Ok(GameReport {
                game_id: session.id.clone(),
                seats: session.players.iter().map(|p| p.kind.label()).collect(),
                result,
                rounds: round_rows(session),
            })
        })?;

        if !args.json {
            print_game(&report);
        }
        reports.push(report);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        let stats = registry.stats();
        println!(
            "\n{} game(s) completed, average cooperation {:.1}%",
            stats.completed_games,
            stats.average_cooperation_rate.unwrap_or(0.0),
        );
    }

    Ok(())
}
