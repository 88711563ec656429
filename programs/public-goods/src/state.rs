//! Game session state

use serde::{Deserialize, Serialize};
use settlement_logic::{
    GameConfig, GameResult, MoveRecord, PlayedRound, PlayerId, RoundLedger, RoundSettlement,
    SeededRng, Strategy,
};

/// Game lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Seats still open
    #[default]
    Waiting,
    Active,
    Completed,
    Cancelled,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::Completed | GameStatus::Cancelled)
    }
}

impl core::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Active => "active",
            GameStatus::Completed => "completed",
            GameStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Who decides for a seat
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlayerKind {
    /// Moves arrive through `submit_move`
    Human,
    /// A language-model agent
    Agent { model: String },
    /// Random moves (dev mode)
    DevRandom,
    /// A scripted strategy, for simulations
    Scripted { strategy: Strategy },
}

impl PlayerKind {
    pub fn is_automated(&self) -> bool {
        !matches!(self, PlayerKind::Human)
    }

    pub fn label(&self) -> String {
        match self {
            PlayerKind::Human => "human".to_string(),
            PlayerKind::Agent { model } => model.clone(),
            PlayerKind::DevRandom => "dev-random".to_string(),
            PlayerKind::Scripted { strategy } => format!("{:?}", strategy),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub kind: PlayerKind,
    /// 0-based seat
    pub position: u32,
    pub joined_at: i64,
}

/// One entry in a session's append-only log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    GameCreated { at: i64 },
    PlayerJoined { player: PlayerId, position: u32, at: i64 },
    RoundOpened { round: u32, deadline: i64, at: i64 },
    MoveRecorded { round: u32, player: PlayerId, invested: u32, fallback: bool, at: i64 },
    RoundSettled { settlement: RoundSettlement, at: i64 },
    GameFinalized { result: GameResult, at: i64 },
    GameCancelled { round: u32, at: i64 },
}

/// The round currently collecting moves
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenRound {
    pub ledger: RoundLedger,
    pub opened_at: i64,
    /// Missing moves may be filled in from this time on
    pub deadline: i64,
}

impl OpenRound {
    pub fn round_number(&self) -> u32 {
        self.ledger.round_number()
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.deadline
    }
}

/// A game from creation to completion or cancellation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameSession {
    pub id: String,
    pub config: GameConfig,
    pub move_timeout_secs: u64,
    pub status: GameStatus,
    /// Seating order
    pub players: Vec<Player>,
    /// 1-based; 0 until the game starts
    pub current_round: u32,
    pub open_round: Option<OpenRound>,
    /// Settled rounds, oldest first
    pub rounds: Vec<PlayedRound>,
    pub result: Option<GameResult>,
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    events: Vec<GameEvent>,
}

impl GameSession {
    pub(crate) fn new(id: String, config: GameConfig, move_timeout_secs: u64, now: i64) -> Self {
        Self {
            id,
            config,
            move_timeout_secs,
            status: GameStatus::Waiting,
            players: Vec::new(),
            current_round: 0,
            open_round: None,
            rounds: Vec::new(),
            result: None,
            created_at: now,
            started_at: None,
            finished_at: None,
            events: vec![GameEvent::GameCreated { at: now }],
        }
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub(crate) fn log(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn seats_remaining(&self) -> u32 {
        self.config.num_players.saturating_sub(self.players.len() as u32)
    }

    pub fn settlements(&self) -> Vec<RoundSettlement> {
        self.rounds.iter().map(|r| r.settlement.clone()).collect()
    }

    /// Moves recorded so far in the open round
    pub fn pending_moves(&self) -> &[MoveRecord] {
        self.open_round.as_ref().map(|r| r.ledger.moves()).unwrap_or(&[])
    }

    /// Earnings over settled rounds
    pub fn earnings(&self, player: &PlayerId) -> f64 {
        self.rounds
            .iter()
            .filter_map(|r| r.settlement.payoff_for(player))
            .map(|p| p.payoff)
            .sum()
    }

    pub fn total_investment(&self, player: &PlayerId) -> u64 {
        self.rounds
            .iter()
            .filter_map(|r| r.settlement.payoff_for(player))
            .map(|p| p.invested as u64)
            .sum()
    }

    /// Generator for this game's dev-mode moves and fallbacks
    pub fn rng(&self, seed: u64) -> SeededRng {
        SeededRng::new(seed, game_index(&self.id))
    }
}

/// FNV-1a over the game id, so each game gets its own stream from one seed
fn game_index(id: &str) -> u64 {
    id.bytes().fold(0xcbf29ce484222325u64, |hash, b| {
        (hash ^ b as u64).wrapping_mul(0x100000001b3)
    })
}
