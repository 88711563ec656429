//! Append-only move collection for a single round

use serde::{Deserialize, Serialize};
use crate::config::GameConfig;
use crate::error::SettlementError;
use crate::settlement::{
    check_seating, settle_round, validate_investment, MoveInput, PlayerId, RoundInput, RoundSettlement,
};

/// A move accepted into the ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub player_id: PlayerId,
    pub invested: u32,
    pub kept: u32,
    /// Set when the move was substituted rather than submitted
    pub fallback: bool,
}

/// Moves for one round over a fixed set of active players.
///
/// At most one move per player is ever accepted. A rejected submission leaves
/// the ledger exactly as it was.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundLedger {
    round_number: u32,
    endowment: u32,
    active_players: Vec<PlayerId>,
    moves: Vec<MoveRecord>,
}

impl RoundLedger {
    /// Fails if a player is seated twice or the round's tokens overflow.
    pub fn new(
        round_number: u32,
        endowment: u32,
        active_players: Vec<PlayerId>,
    ) -> Result<Self, SettlementError> {
        check_seating(&active_players, endowment)?;
        let capacity = active_players.len();
        Ok(Self {
            round_number,
            endowment,
            active_players,
            moves: Vec::with_capacity(capacity),
        })
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn endowment(&self) -> u32 {
        self.endowment
    }

    pub fn active_players(&self) -> &[PlayerId] {
        &self.active_players
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn has_moved(&self, player: &PlayerId) -> bool {
        self.moves.iter().any(|m| &m.player_id == player)
    }

    /// Record a submitted move.
    pub fn record(&mut self, player: &PlayerId, invested: i64) -> Result<&MoveRecord, SettlementError> {
        self.push(player, invested, false)
    }

    /// Record a move substituted on the player's behalf.
    pub fn record_fallback(
        &mut self,
        player: &PlayerId,
        invested: u32,
    ) -> Result<&MoveRecord, SettlementError> {
        self.push(player, invested as i64, true)
    }

    fn push(
        &mut self,
        player: &PlayerId,
        invested: i64,
        fallback: bool,
    ) -> Result<&MoveRecord, SettlementError> {
        if !self.active_players.contains(player) {
            return Err(SettlementError::UnknownPlayer { player: player.clone() });
        }
        if self.has_moved(player) {
            return Err(SettlementError::DuplicateMove {
                player: player.clone(),
                round: self.round_number,
            });
        }
        let invested = validate_investment(player, invested, self.endowment)?;
        self.moves.push(MoveRecord {
            player_id: player.clone(),
            invested,
            kept: self.endowment - invested,
            fallback,
        });
        Ok(&self.moves[self.moves.len() - 1])
    }

    /// Active players without a move, in seating order
    pub fn missing_players(&self) -> Vec<PlayerId> {
        self.active_players
            .iter()
            .filter(|p| !self.has_moved(p))
            .cloned()
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.moves.len() == self.active_players.len() && self.missing_players().is_empty()
    }

    pub fn to_input(&self) -> RoundInput {
        RoundInput {
            round_number: self.round_number,
            endowment_per_player: self.endowment,
            moves: self.moves
                .iter()
                .map(|m| MoveInput { player_id: m.player_id.clone(), invested: m.invested as i64 })
                .collect(),
        }
    }

    /// Settle the round; fails with `IncompleteRound` until every active player moved.
    pub fn settle(&self, config: &GameConfig) -> Result<RoundSettlement, SettlementError> {
        settle_round(&self.to_input(), &self.active_players, config)
    }
}
