//! Player instructions

use serde::{Deserialize, Serialize};
use settlement_logic::PlayerId;
use crate::error::PlatformError;
use crate::instructions::game::{open_round, settle_if_complete};
use crate::state::{GameEvent, GameSession, GameStatus, Player, PlayerKind};

/// What a recorded move led to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// Recorded; the round is still waiting on other players
    Accepted,
    /// The round settled and `next_round` is open
    RoundComplete { next_round: u32 },
    /// The last round settled and the game is finalized
    GameComplete,
}

/// Take the next free seat. Filling the last seat starts round 1.
pub fn join_game(
    session: &mut GameSession,
    name: impl Into<String>,
    kind: PlayerKind,
    now: i64,
) -> Result<PlayerId, PlatformError> {
    require!(
        session.seats_remaining() > 0,
        PlatformError::GameFull { capacity: session.config.num_players }
    );
    require!(
        session.status == GameStatus::Waiting,
        PlatformError::InvalidState { status: session.status }
    );

    let position = session.players.len() as u32;
    let id = PlayerId(format!("p{}", position + 1));
    let mut name = name.into();
    if name.trim().is_empty() {
        name = format!("Player {}", position + 1);
    }

    log::info!(
        "Player {} ({}) joined game {} at seat {}",
        id,
        kind.label(),
        session.id,
        position,
    );

    session.players.push(Player {
        id: id.clone(),
        name,
        kind,
        position,
        joined_at: now,
    });
    session.log(GameEvent::PlayerJoined { player: id.clone(), position, at: now });

    if session.seats_remaining() == 0 {
        open_round(session, 1, now)?;
        session.status = GameStatus::Active;
        session.started_at = Some(now);
        log::info!("Game {} started with {} players", session.id, session.players.len());
    }

    Ok(id)
}

/// Record a player's investment for the open round.
///
/// Out-of-range values, second submissions and unknown players are rejected
/// without touching the round. The move that completes the round settles it.
pub fn submit_move(
    session: &mut GameSession,
    player: &PlayerId,
    invested: i64,
    now: i64,
) -> Result<MoveOutcome, PlatformError> {
    require!(
        session.status == GameStatus::Active,
        PlatformError::InvalidState { status: session.status }
    );
    let status = session.status;
    let open = session
        .open_round
        .as_mut()
        .ok_or(PlatformError::InvalidState { status })?;

    let round = open.round_number();
    let record = open.ledger.record(player, invested)?.clone();
    session.log(GameEvent::MoveRecorded {
        round,
        player: record.player_id.clone(),
        invested: record.invested,
        fallback: false,
        at: now,
    });

    log::info!(
        "Game {} round {}: {} invested {} of {}",
        session.id,
        round,
        record.player_id,
        record.invested,
        record.invested + record.kept,
    );

    settle_if_complete(session, now)
}
