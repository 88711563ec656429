//! Platform error codes

use settlement_logic::{ConfigError, PlayerId, SettlementError};
use crate::state::GameStatus;

#[derive(Clone, Debug, PartialEq)]
pub enum PlatformError {
    /// Action not allowed in the game's current status
    InvalidState { status: GameStatus },
    GameNotFound { game_id: String },
    GameExists { game_id: String },
    /// Every seat is taken
    GameFull { capacity: u32 },
    /// The round deadline has not passed yet
    RoundStillOpen { round: u32, deadline: i64 },
    /// The game has not filled its seats
    NotEnoughPlayers { joined: u32, required: u32 },
    /// An automated seat has nothing to decide for it
    NoDecisionSource { player: PlayerId },
    /// Bad platform configuration value
    Config(String),
    Settlement(SettlementError),
}

impl PlatformError {
    /// Stable numeric code for clients
    pub fn code(&self) -> u32 {
        match self {
            PlatformError::InvalidState { .. } => 6000,
            PlatformError::GameNotFound { .. } => 6001,
            PlatformError::GameExists { .. } => 6002,
            PlatformError::GameFull { .. } => 6003,
            PlatformError::RoundStillOpen { .. } => 6004,
            PlatformError::NotEnoughPlayers { .. } => 6005,
            PlatformError::NoDecisionSource { .. } => 6006,
            PlatformError::Config(_) => 6007,
            PlatformError::Settlement(e) => match e {
                SettlementError::InvalidMove { .. } => 6010,
                SettlementError::DuplicateMove { .. } => 6011,
                SettlementError::IncompleteRound { .. } => 6012,
                SettlementError::UnknownPlayer { .. } => 6013,
                SettlementError::InvalidRound { .. } => 6014,
                SettlementError::GameFinalized => 6015,
                SettlementError::InvalidConfig(_) => 6016,
            },
        }
    }
}

impl core::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PlatformError::InvalidState { status } =>
                write!(f, "Invalid game state for this action: {}", status),
            PlatformError::GameNotFound { game_id } => write!(f, "Game {} not found", game_id),
            PlatformError::GameExists { game_id } => write!(f, "Game {} already exists", game_id),
            PlatformError::GameFull { capacity } =>
                write!(f, "Game is full ({} players)", capacity),
            PlatformError::RoundStillOpen { round, deadline } =>
                write!(f, "Round {} is open until {}", round, deadline),
            PlatformError::NotEnoughPlayers { joined, required } =>
                write!(f, "Game has {} of {} players", joined, required),
            PlatformError::NoDecisionSource { player } =>
                write!(f, "No decision source for player {}", player),
            PlatformError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PlatformError::Settlement(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlatformError::Settlement(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SettlementError> for PlatformError {
    fn from(e: SettlementError) -> Self {
        PlatformError::Settlement(e)
    }
}

impl From<ConfigError> for PlatformError {
    fn from(e: ConfigError) -> Self {
        PlatformError::Settlement(SettlementError::InvalidConfig(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_start_at_6000() {
        assert_eq!(PlatformError::InvalidState { status: GameStatus::Completed }.code(), 6000);
        assert_eq!(
            PlatformError::from(SettlementError::DuplicateMove { player: PlayerId::from("a"), round: 2 })
                .code(),
            6011
        );
    }

    #[test]
    fn test_config_error_wraps_as_settlement() {
        let e = PlatformError::from(ConfigError::TooFewPlayers { num_players: 1 });
        assert_eq!(e.code(), 6016);
        assert_eq!(e.to_string(), "invalid config: num_players must be >= 2, got 1");
    }
}
