//! Full-game runner

use serde::{Deserialize, Serialize};
use crate::config::GameConfig;
use crate::error::{ConfigError, SettlementError};
use crate::finalize::{finalize_game, GameResult};
use crate::ledger::{MoveRecord, RoundLedger};
use crate::progression::GamePhase;
use crate::random::SeededRng;
use crate::settlement::{PlayerId, RoundSettlement};
use crate::strategy::{resolve_decision, DecisionContext, DecisionSource, Fallback};

/// A player and whatever makes their decisions
pub struct Seat {
    pub player_id: PlayerId,
    pub source: Box<dyn DecisionSource>,
}

impl Seat {
    pub fn new(player_id: impl Into<PlayerId>, source: Box<dyn DecisionSource>) -> Self {
        Self { player_id: player_id.into(), source }
    }
}

/// A settled round together with the moves that produced it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayedRound {
    pub settlement: RoundSettlement,
    /// In seating order
    pub moves: Vec<MoveRecord>,
}

/// Result of a complete game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub rounds: Vec<PlayedRound>,
    pub result: GameResult,
    /// Moves substituted because a source failed
    pub fallback_count: u32,
}

impl GameRecord {
    pub fn settlements(&self) -> Vec<RoundSettlement> {
        self.rounds.iter().map(|r| r.settlement.clone()).collect()
    }
}

/// Play every round for `seats` and finalize.
///
/// # Arguments
/// * `config` - Game parameters; `seats.len()` must equal `num_players`
/// * `seats` - Decision source per player, in seating order
/// * `fallback` - Substitute for a failed decision
/// * `seed` - Platform seed
/// * `game_index` - Distinguishes games played from the same seed
pub fn run_game(
    config: &GameConfig,
    seats: &mut [Seat],
    fallback: Fallback,
    seed: u64,
    game_index: u64,
) -> Result<GameRecord, SettlementError> {
    config.validate()?;
    if seats.len() as u32 != config.num_players {
        return Err(ConfigError::SeatCount { expected: config.num_players, got: seats.len() as u32 }.into());
    }

    let rng = SeededRng::new(seed, game_index);
    let players: Vec<PlayerId> = seats.iter().map(|s| s.player_id.clone()).collect();
    let mut history: Vec<RoundSettlement> = Vec::with_capacity(config.rounds_per_game as usize);
    let mut rounds: Vec<PlayedRound> = Vec::with_capacity(config.rounds_per_game as usize);
    let mut fallback_count = 0u32;
    let mut phase = GamePhase::start();

    while let Some(round_number) = phase.current_round() {
        let mut ledger = RoundLedger::new(round_number, config.tokens_per_round, players.clone())?;

        // Sources decide independently: nobody sees this round's moves
        for (seat_index, seat) in seats.iter_mut().enumerate() {
            let ctx = DecisionContext {
                player: &seat.player_id,
                seat: seat_index as u32,
                round_number,
                endowment: config.tokens_per_round,
                config,
                history: &history,
            };
            let decision = seat.source.decide(&ctx);
            let mut fallback_rng = rng.for_seat(u32::MAX - seat_index as u32, round_number);
            let resolved = resolve_decision(decision, config.tokens_per_round, fallback, &mut fallback_rng);

            if resolved.fallback {
                fallback_count += 1;
                ledger.record_fallback(&seat.player_id, resolved.invested)?;
            } else {
                ledger.record(&seat.player_id, resolved.invested as i64)?;
            }
        }

        let settlement = ledger.settle(config)?;
        rounds.push(PlayedRound {
            settlement: settlement.clone(),
            moves: ledger.moves().to_vec(),
        });
        history.push(settlement);

        phase = phase.advance(config.rounds_per_game)?;
    }

    let result = finalize_game(&history)?;

    Ok(GameRecord {
        rounds,
        result,
        fallback_count,
    })
}
