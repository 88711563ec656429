//! Shared store of game sessions
//!
//! Every operation on a game runs with the registry lock held, so moves for
//! the same game are applied one at a time and a (player, round) pair is only
//! ever accepted once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use settlement_logic::PlayerId;
use crate::config::PlatformConfig;
use crate::error::PlatformError;
use crate::instructions::{admin, player, MoveOutcome};
use crate::report::{GameStatusReport, PlatformStats};
use crate::state::{GameSession, PlayerKind};

#[derive(Clone, Default)]
pub struct GameRegistry {
    games: Arc<Mutex<HashMap<String, GameSession>>>,
    next_id: Arc<AtomicU64>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, GameSession>> {
        // Handlers validate before mutating, so a poisoned map is still consistent
        self.games.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a game under a fresh id and return the id.
    pub fn create_game(&self, config: &PlatformConfig, now: i64) -> Result<String, PlatformError> {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("game-{:04}", n);
        self.create_game_with_id(id.clone(), config, now)?;
        Ok(id)
    }

    pub fn create_game_with_id(
        &self,
        id: impl Into<String>,
        config: &PlatformConfig,
        now: i64,
    ) -> Result<(), PlatformError> {
        let session = admin::create_game(id, config, now)?;
        let mut games = self.lock();
        require!(
            !games.contains_key(&session.id),
            PlatformError::GameExists { game_id: session.id.clone() }
        );
        games.insert(session.id.clone(), session);
        Ok(())
    }

    /// Run `f` against one game with the registry locked.
    pub fn with_game<R, F>(&self, id: &str, f: F) -> Result<R, PlatformError>
    where
        F: FnOnce(&mut GameSession) -> Result<R, PlatformError>,
    {
        let mut games = self.lock();
        let session = games
            .get_mut(id)
            .ok_or_else(|| PlatformError::GameNotFound { game_id: id.to_string() })?;
        f(session)
    }

    pub fn join_game(
        &self,
        id: &str,
        name: &str,
        kind: PlayerKind,
        now: i64,
    ) -> Result<PlayerId, PlatformError> {
        self.with_game(id, |session| player::join_game(session, name, kind, now))
    }

    pub fn submit_move(
        &self,
        id: &str,
        player_id: &PlayerId,
        invested: i64,
        now: i64,
    ) -> Result<MoveOutcome, PlatformError> {
        self.with_game(id, |session| player::submit_move(session, player_id, invested, now))
    }

    pub fn cancel_game(&self, id: &str, now: i64) -> Result<(), PlatformError> {
        self.with_game(id, |session| admin::cancel_game(session, now))
    }

    /// Copy of a game as it stands
    pub fn snapshot(&self, id: &str) -> Result<GameSession, PlatformError> {
        self.with_game(id, |session| Ok(session.clone()))
    }

    pub fn status_report(&self, id: &str) -> Result<GameStatusReport, PlatformError> {
        self.with_game(id, |session| Ok(GameStatusReport::from_session(session)))
    }

    pub fn stats(&self) -> PlatformStats {
        PlatformStats::from_sessions(self.lock().values())
    }

    /// Game ids, sorted
    pub fn game_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}
