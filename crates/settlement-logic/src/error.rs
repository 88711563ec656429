//! Settlement and decision-source errors

use crate::settlement::PlayerId;

/// Errors raised while recording or settling a round.
///
/// Every variant is recoverable within a single round: the offending move is
/// rejected and the round's recorded state is left untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum SettlementError {
    /// Investment outside `[0, endowment]`.
    InvalidMove { player: PlayerId, invested: i64, endowment: u32 },
    /// The player already has a move recorded for this round.
    DuplicateMove { player: PlayerId, round: u32 },
    /// Settlement was requested before every active player moved.
    IncompleteRound { round: u32, missing: Vec<PlayerId> },
    /// A move names a player who is not active in this game.
    UnknownPlayer { player: PlayerId },
    /// Round number outside `1..=rounds_per_game`, or nothing to finalize.
    InvalidRound { round: u32, max_rounds: u32 },
    /// The game is finalized; no further moves are accepted.
    GameFinalized,
    /// A configuration value failed validation.
    InvalidConfig(ConfigError),
}

impl core::fmt::Display for SettlementError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SettlementError::InvalidMove { player, invested, endowment } =>
                write!(f, "invalid move by {}: invested {} not in [0, {}]", player, invested, endowment),
            SettlementError::DuplicateMove { player, round } =>
                write!(f, "player {} already moved in round {}", player, round),
            SettlementError::IncompleteRound { round, missing } => {
                write!(f, "round {} incomplete, waiting on", round)?;
                for (i, player) in missing.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{}{}", sep, player)?;
                }
                Ok(())
            }
            SettlementError::UnknownPlayer { player } =>
                write!(f, "player {} is not active in this game", player),
            SettlementError::InvalidRound { round, max_rounds } =>
                write!(f, "round {} outside 1..={}", round, max_rounds),
            SettlementError::GameFinalized => write!(f, "game is finalized"),
            SettlementError::InvalidConfig(e) => write!(f, "invalid config: {}", e),
        }
    }
}

impl std::error::Error for SettlementError {}

impl From<ConfigError> for SettlementError {
    fn from(e: ConfigError) -> Self {
        SettlementError::InvalidConfig(e)
    }
}

/// Configuration validation failures.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A count or rate that must be strictly positive was not.
    NotPositive { field: &'static str },
    /// The pool mechanic needs at least two players.
    TooFewPlayers { num_players: u32 },
    /// The number of seats does not match `num_players`.
    SeatCount { expected: u32, got: u32 },
    /// The same player id holds more than one seat.
    DuplicateSeat { player: PlayerId },
    /// `num_players * endowment` does not fit in a token count.
    TokenOverflow { num_players: u32, endowment: u32 },
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::NotPositive { field } => write!(f, "{} must be positive", field),
            ConfigError::TooFewPlayers { num_players } =>
                write!(f, "num_players must be >= 2, got {}", num_players),
            ConfigError::SeatCount { expected, got } =>
                write!(f, "expected {} seats, got {}", expected, got),
            ConfigError::DuplicateSeat { player } =>
                write!(f, "player {} is seated more than once", player),
            ConfigError::TokenOverflow { num_players, endowment } =>
                write!(f, "{} players x {} tokens overflows the pool", num_players, endowment),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Why a decision source could not produce a usable investment.
///
/// These never reach settlement: the caller resolves them to a fallback.
#[derive(Clone, Debug, PartialEq)]
pub enum DecisionError {
    /// No decision is available yet (e.g. a human has not submitted).
    Pending,
    /// The source produced a value outside `[0, endowment]`.
    InvalidMove { invested: i64, endowment: u32 },
    /// A model answer that did not contain `{"tokens": <int>}`.
    Unparseable(String),
    /// The model client failed.
    Model(String),
}

impl core::fmt::Display for DecisionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecisionError::Pending => write!(f, "no decision submitted"),
            DecisionError::InvalidMove { invested, endowment } =>
                write!(f, "decision {} not in [0, {}]", invested, endowment),
            DecisionError::Unparseable(answer) => write!(f, "unparseable answer: {:?}", answer),
            DecisionError::Model(msg) => write!(f, "model call failed: {}", msg),
        }
    }
}

impl std::error::Error for DecisionError {}
