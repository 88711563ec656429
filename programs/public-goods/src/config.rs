//! Platform configuration
//!
//! Game parameters plus the platform knobs around them: dev mode, the move
//! deadline, the fallback for missed moves, the seed for generated moves and
//! the default agent model. Read from `PGG_*` environment variables (and the
//! platform's historical `DEV_MODE`) or from a JSON file.

use std::path::Path;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use settlement_logic::{Fallback, GameConfig, PoolSharing};
use crate::error::PlatformError;

pub const DEFAULT_MOVE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MODEL: &str = "gpt-4o-2024-08-06";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub game: GameConfig,
    /// Agents play random moves instead of calling a model
    pub dev_mode: bool,
    /// Seconds a round stays open before missing moves are filled in
    pub move_timeout_secs: u64,
    pub fallback: Fallback,
    pub seed: u64,
    pub model: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::standard(),
            dev_mode: false,
            move_timeout_secs: DEFAULT_MOVE_TIMEOUT_SECS,
            fallback: Fallback::Zero,
            seed: DEFAULT_SEED,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl PlatformConfig {
    pub fn validate(&self) -> Result<(), PlatformError> {
        self.game.validate()?;
        require!(
            self.move_timeout_secs > 0,
            PlatformError::Config("move_timeout_secs must be positive".to_string())
        );
        require!(
            !self.model.trim().is_empty(),
            PlatformError::Config("model must not be empty".to_string())
        );
        Ok(())
    }

    /// Defaults overridden by whatever is set in the process environment
    pub fn from_env() -> Result<Self, PlatformError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PlatformError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "PGG_ROUNDS")? {
            config.game.rounds_per_game = v;
        }
        if let Some(v) = parse_var(&lookup, "PGG_TOKENS")? {
            config.game.tokens_per_round = v;
        }
        if let Some(v) = parse_var(&lookup, "PGG_KEEP_RATE")? {
            config.game.keep_rate = v;
        }
        if let Some(v) = parse_var(&lookup, "PGG_INVEST_RATE")? {
            config.game.invest_rate = v;
        }
        if let Some(v) = parse_var(&lookup, "PGG_PLAYERS")? {
            config.game.num_players = v;
        }
        if let Some(raw) = lookup("PGG_POOL_SHARING") {
            config.game.pool_sharing = parse_pool_sharing(&raw)?;
        }
        if let Some(v) = parse_var(&lookup, "PGG_MOVE_TIMEOUT_SECS")? {
            config.move_timeout_secs = v;
        }
        if let Some(raw) = lookup("PGG_FALLBACK") {
            config.fallback = parse_fallback(&raw)?;
        }
        if let Some(v) = parse_var(&lookup, "PGG_SEED")? {
            config.seed = v;
        }
        if let Some(model) = lookup("PGG_MODEL") {
            config.model = model;
        }
        if let Some(raw) = lookup("DEV_MODE") {
            config.dev_mode = parse_flag("DEV_MODE", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, PlatformError> {
        let config: PlatformConfig = serde_json::from_str(json)
            .map_err(|e| PlatformError::Config(format!("invalid JSON config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, PlatformError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| PlatformError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, PlatformError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| PlatformError::Config(format!("{}={:?}: {}", key, raw, e))),
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, PlatformError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(PlatformError::Config(format!("{}={:?}: expected true or false", key, raw))),
    }
}

fn parse_pool_sharing(raw: &str) -> Result<PoolSharing, PlatformError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "equal" | "equal_split" | "equalsplit" => Ok(PoolSharing::EqualSplit),
        "per_token" | "pertoken" => Ok(PoolSharing::PerToken),
        _ => Err(PlatformError::Config(format!(
            "PGG_POOL_SHARING={:?}: expected equal_split or per_token",
            raw
        ))),
    }
}

fn parse_fallback(raw: &str) -> Result<Fallback, PlatformError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "zero" => Ok(Fallback::Zero),
        "random" => Ok(Fallback::Random),
        _ => Err(PlatformError::Config(format!("PGG_FALLBACK={:?}: expected zero or random", raw))),
    }
}
