//! Settlement Logic for the Public Goods Game
//!
//! Core round accounting for the Public Goods Game: each round every player
//! splits an endowment of tokens between keeping and investing in a shared
//! pool, and the pool is paid back out to the group.
//! This crate is compiled to:
//! - Native (for the game platform and command-line runner)
//! - WASM (for dashboard-side settlement checks)

mod agent;
mod config;
mod error;
mod finalize;
mod game;
mod ledger;
mod progression;
mod prompt;
mod random;
mod settlement;
mod strategy;

#[cfg(feature = "wasm")]
mod wasm;

pub use agent::{ModelAgent, ModelClient, Speaker, TranscriptEntry};
pub use config::{GameConfig, PoolSharing};
pub use error::{ConfigError, DecisionError, SettlementError};
pub use finalize::{finalize_game, GameResult, PlayerStanding};
pub use game::{run_game, GameRecord, PlayedRound, Seat};
pub use ledger::{MoveRecord, RoundLedger};
pub use progression::{advance_round, GamePhase, RoundAdvance};
pub use prompt::{
    build_investment_prompt, history_table, parse_investment, round_report, rules_summary,
    system_prompt,
};
pub use random::SeededRng;
pub use settlement::{
    check_seating, conserved_total, is_round_complete, settle_round, validate_investment, MoveInput, PlayerId,
    PlayerPayoff, RoundInput, RoundSettlement,
};
pub use strategy::{
    describe_strategy, resolve_decision, DecisionContext, DecisionSource, Fallback, HumanInput,
    RandomSource, ResolvedDecision, Strategy,
};

/// One player's payoff for a round, in dollars.
///
/// `kept * keep_rate` plus the player's share of the pool's return, as set by
/// the config's [`PoolSharing`].
pub fn payoff(kept: u32, pool: u32, num_players: u32, config: &GameConfig) -> f64 {
    kept as f64 * config.keep_rate + config.pool_sharing.share(pool, config.invest_rate, num_players)
}
