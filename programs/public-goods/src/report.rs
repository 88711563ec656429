//! Status and dashboard reports

use serde::{Deserialize, Serialize};
use settlement_logic::PlayerId;
use crate::state::{GameSession, GameStatus, PlayerKind};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatus {
    pub id: PlayerId,
    pub name: String,
    pub kind: PlayerKind,
    pub position: u32,
    /// Over settled rounds
    pub earnings: f64,
    pub total_investment: u64,
    /// Has a move in the open round
    pub moved_this_round: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundStatus {
    pub round: u32,
    pub completed: bool,
    pub moves_received: u32,
    /// Set once settled
    pub pool_total: Option<u32>,
}

/// Where a game stands
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameStatusReport {
    pub game_id: String,
    pub status: GameStatus,
    pub current_round: u32,
    pub max_rounds: u32,
    pub players: Vec<PlayerStatus>,
    /// Settled rounds then the open one, oldest first
    pub rounds: Vec<RoundStatus>,
    pub round_deadline: Option<i64>,
}

impl GameStatusReport {
    pub fn from_session(session: &GameSession) -> Self {
        let open = session.open_round.as_ref();

        let players = session
            .players
            .iter()
            .map(|p| PlayerStatus {
                id: p.id.clone(),
                name: p.name.clone(),
                kind: p.kind.clone(),
                position: p.position,
                earnings: session.earnings(&p.id),
                total_investment: session.total_investment(&p.id),
                moved_this_round: open.map(|r| r.ledger.has_moved(&p.id)).unwrap_or(false),
            })
            .collect();

        let mut rounds: Vec<RoundStatus> = session
            .rounds
            .iter()
            .map(|r| RoundStatus {
                round: r.settlement.round_number,
                completed: true,
                moves_received: r.moves.len() as u32,
                pool_total: Some(r.settlement.pool_total),
            })
            .collect();
        if let Some(open) = open {
            rounds.push(RoundStatus {
                round: open.round_number(),
                completed: false,
                moves_received: open.ledger.moves().len() as u32,
                pool_total: None,
            });
        }

        Self {
            game_id: session.id.clone(),
            status: session.status,
            current_round: session.current_round,
            max_rounds: session.config.rounds_per_game,
            players,
            rounds,
            round_deadline: open.map(|r| r.deadline),
        }
    }
}

/// Admin dashboard counters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub total_games: u32,
    pub waiting_games: u32,
    pub active_games: u32,
    pub completed_games: u32,
    pub cancelled_games: u32,
    pub rounds_settled: u32,
    /// Mean percent of endowed tokens invested, over completed games
    pub average_cooperation_rate: Option<f64>,
}

impl PlatformStats {
    pub fn from_sessions<'a>(sessions: impl IntoIterator<Item = &'a GameSession>) -> Self {
        let mut stats = PlatformStats::default();
        let mut rate_sum = 0.0;
        let mut rate_count = 0u32;

        for session in sessions {
            stats.total_games += 1;
            stats.rounds_settled += session.rounds.len() as u32;
            match session.status {
                GameStatus::Waiting => stats.waiting_games += 1,
                GameStatus::Active => stats.active_games += 1,
                GameStatus::Completed => stats.completed_games += 1,
                GameStatus::Cancelled => stats.cancelled_games += 1,
            }
            if let Some(result) = &session.result {
                for standing in &result.rankings {
                    rate_sum += standing.cooperation_rate;
                    rate_count += 1;
                }
            }
        }

        if rate_count > 0 {
            stats.average_cooperation_rate = Some(rate_sum / rate_count as f64);
        }
        stats
    }
}
