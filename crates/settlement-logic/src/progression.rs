//! Round progression state machine
//!
//! `InProgress(k)` → `InProgress(k + 1)` while `k < max_rounds`,
//! `InProgress(max_rounds)` → `Finalized`. `Finalized` is terminal.

use serde::{Deserialize, Serialize};
use crate::error::SettlementError;

/// Where a game stands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    InProgress { round: u32 },
    Finalized,
}

/// What happens after a round closes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundAdvance {
    Next(u32),
    Finalize,
}

/// Decide what follows round `current` (1-based).
pub fn advance_round(current: u32, max_rounds: u32) -> Result<RoundAdvance, SettlementError> {
    if current == 0 || current > max_rounds {
        return Err(SettlementError::InvalidRound { round: current, max_rounds });
    }
    if current == max_rounds {
        Ok(RoundAdvance::Finalize)
    } else {
        Ok(RoundAdvance::Next(current + 1))
    }
}

impl GamePhase {
    pub fn start() -> Self {
        GamePhase::InProgress { round: 1 }
    }

    /// Step past the current round. Fails with `GameFinalized` once terminal.
    pub fn advance(self, max_rounds: u32) -> Result<GamePhase, SettlementError> {
        match self {
            GamePhase::Finalized => Err(SettlementError::GameFinalized),
            GamePhase::InProgress { round } => match advance_round(round, max_rounds)? {
                RoundAdvance::Next(next) => Ok(GamePhase::InProgress { round: next }),
                RoundAdvance::Finalize => Ok(GamePhase::Finalized),
            },
        }
    }

    pub fn current_round(&self) -> Option<u32> {
        match self {
            GamePhase::InProgress { round } => Some(*round),
            GamePhase::Finalized => None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, GamePhase::Finalized)
    }
}
