//! Admin instructions

use crate::config::PlatformConfig;
use crate::error::PlatformError;
use crate::state::{GameEvent, GameSession, GameStatus};

/// Create a game in `Waiting`, seats empty.
pub fn create_game(
    id: impl Into<String>,
    config: &PlatformConfig,
    now: i64,
) -> Result<GameSession, PlatformError> {
    config.validate()?;
    let id = id.into();
    require!(!id.trim().is_empty(), PlatformError::Config("game id must not be empty".to_string()));

    let session = GameSession::new(id, config.game.clone(), config.move_timeout_secs, now);

    log::info!(
        "Game {} created: {} players, {} rounds of {} tokens",
        session.id,
        session.config.num_players,
        session.config.rounds_per_game,
        session.config.tokens_per_round,
    );

    Ok(session)
}

/// Cancel a waiting or active game. Settled rounds are kept; the open round is dropped.
pub fn cancel_game(session: &mut GameSession, now: i64) -> Result<(), PlatformError> {
    require!(
        !session.status.is_terminal(),
        PlatformError::InvalidState { status: session.status }
    );

    let round = session.current_round;
    session.status = GameStatus::Cancelled;
    session.open_round = None;
    session.finished_at = Some(now);
    session.log(GameEvent::GameCancelled { round, at: now });

    log::info!("Game {} cancelled in round {}", session.id, round);

    Ok(())
}
