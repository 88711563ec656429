//! Game configuration

use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

/// How the invested pool is paid back out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PoolSharing {
    /// `pool * invest_rate` is split evenly across all players,
    /// investor included.
    #[default]
    EqualSplit,
    /// Every invested token pays `invest_rate` to every player,
    /// investor included.
    PerToken,
}

impl PoolSharing {
    /// Each player's return from a pool of `pool` tokens.
    pub fn share(&self, pool: u32, invest_rate: f64, num_players: u32) -> f64 {
        match self {
            PoolSharing::EqualSplit => pool as f64 * invest_rate / num_players as f64,
            PoolSharing::PerToken => pool as f64 * invest_rate,
        }
    }
}

/// Parameters for one Public Goods Game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rounds_per_game: u32,
    /// Endowment each player receives at the start of every round
    pub tokens_per_round: u32,
    /// Dollars per token kept
    pub keep_rate: f64,
    /// Dollars per token invested (see [`PoolSharing`])
    pub invest_rate: f64,
    pub num_players: u32,
    pub pool_sharing: PoolSharing,
}

impl GameConfig {
    /// The lab setup: 4 players, 15 rounds of 5 tokens, $0.20 kept / $0.10 invested.
    pub fn standard() -> Self {
        Self {
            rounds_per_game: 15,
            tokens_per_round: 5,
            keep_rate: 0.20,
            invest_rate: 0.10,
            num_players: 4,
            pool_sharing: PoolSharing::EqualSplit,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rounds_per_game == 0 {
            return Err(ConfigError::NotPositive { field: "rounds_per_game" });
        }
        if self.tokens_per_round == 0 {
            return Err(ConfigError::NotPositive { field: "tokens_per_round" });
        }
        if self.keep_rate.is_nan() || self.keep_rate <= 0.0 {
            return Err(ConfigError::NotPositive { field: "keep_rate" });
        }
        if self.invest_rate.is_nan() || self.invest_rate <= 0.0 {
            return Err(ConfigError::NotPositive { field: "invest_rate" });
        }
        if self.num_players < 2 {
            return Err(ConfigError::TooFewPlayers { num_players: self.num_players });
        }
        if self.num_players.checked_mul(self.tokens_per_round).is_none() {
            return Err(ConfigError::TokenOverflow {
                num_players: self.num_players,
                endowment: self.tokens_per_round,
            });
        }
        Ok(())
    }

    /// Payoff change per extra token a player invests, others held fixed.
    ///
    /// Negative means keeping beats investing (the free-rider incentive).
    pub fn marginal_return(&self) -> f64 {
        self.pool_sharing.share(1, self.invest_rate, self.num_players) - self.keep_rate
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::standard()
    }
}
