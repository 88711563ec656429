//! Round settlement: moves in, payoffs out

use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use crate::config::GameConfig;
use crate::error::{ConfigError, SettlementError};
use crate::payoff;

/// Opaque player identifier
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        PlayerId(s.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        PlayerId(s)
    }
}

/// One submitted decision. `invested` is signed so that bad input can be
/// carried to validation instead of being truncated on the way in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveInput {
    pub player_id: PlayerId,
    pub invested: i64,
}

/// Everything settlement needs for one round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundInput {
    pub round_number: u32,
    pub endowment_per_player: u32,
    pub moves: Vec<MoveInput>,
}

/// One player's outcome for a settled round
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerPayoff {
    pub player_id: PlayerId,
    pub invested: u32,
    pub kept: u32,
    pub payoff: f64,
}

/// Result of a settled round. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSettlement {
    pub round_number: u32,
    pub endowment_per_player: u32,
    pub pool_total: u32,
    /// In seating order
    pub payoffs: Vec<PlayerPayoff>,
}

impl RoundSettlement {
    pub fn total_payoff(&self) -> f64 {
        self.payoffs.iter().map(|p| p.payoff).sum()
    }

    pub fn payoff_for(&self, player: &PlayerId) -> Option<&PlayerPayoff> {
        self.payoffs.iter().find(|p| &p.player_id == player)
    }

    /// Mean tokens invested per player
    pub fn average_investment(&self) -> f64 {
        if self.payoffs.is_empty() {
            return 0.0;
        }
        self.pool_total as f64 / self.payoffs.len() as f64
    }
}

/// Check a single investment against the round endowment.
pub fn validate_investment(player: &PlayerId, invested: i64, endowment: u32) -> Result<u32, SettlementError> {
    if invested < 0 || invested > endowment as i64 {
        return Err(SettlementError::InvalidMove {
            player: player.clone(),
            invested,
            endowment,
        });
    }
    Ok(invested as u32)
}

/// Check a round's seating: each player seated once, and the largest
/// possible pool (`n * endowment`) representable as a token count.
pub fn check_seating(active_players: &[PlayerId], endowment: u32) -> Result<(), ConfigError> {
    let mut seated: HashSet<&PlayerId> = HashSet::with_capacity(active_players.len());
    for player in active_players {
        if !seated.insert(player) {
            return Err(ConfigError::DuplicateSeat { player: player.clone() });
        }
    }
    let num_players = active_players.len() as u32;
    if num_players.checked_mul(endowment).is_none() {
        return Err(ConfigError::TokenOverflow { num_players, endowment });
    }
    Ok(())
}

/// True iff every active player has exactly one move and nobody else moved.
///
/// A seating that names a player twice is never complete.
pub fn is_round_complete(moves: &[MoveInput], active_players: &[PlayerId]) -> bool {
    let distinct: HashSet<&PlayerId> = active_players.iter().collect();
    distinct.len() == active_players.len() && active_players.iter().all(|player| {
        moves.iter().filter(|m| &m.player_id == player).count() == 1
    }) && moves.iter().all(|m| active_players.contains(&m.player_id))
}

/// Settle a complete round.
///
/// Fails without producing anything if a move is out of range, duplicated,
/// from an inactive player, or if any active player has not moved. The
/// seating itself must pass [`check_seating`].
pub fn settle_round(
    input: &RoundInput,
    active_players: &[PlayerId],
    config: &GameConfig,
) -> Result<RoundSettlement, SettlementError> {
    let num_players = active_players.len() as u32;
    if num_players < 2 {
        return Err(ConfigError::TooFewPlayers { num_players }.into());
    }
    check_seating(active_players, input.endowment_per_player)?;
    if input.round_number == 0 || input.round_number > config.rounds_per_game {
        return Err(SettlementError::InvalidRound {
            round: input.round_number,
            max_rounds: config.rounds_per_game,
        });
    }

    let endowment = input.endowment_per_player;
    let active: HashSet<&PlayerId> = active_players.iter().collect();
    let mut seen: HashSet<&PlayerId> = HashSet::with_capacity(input.moves.len());

    for m in &input.moves {
        if !active.contains(&m.player_id) {
            return Err(SettlementError::UnknownPlayer { player: m.player_id.clone() });
        }
        validate_investment(&m.player_id, m.invested, endowment)?;
        if !seen.insert(&m.player_id) {
            return Err(SettlementError::DuplicateMove {
                player: m.player_id.clone(),
                round: input.round_number,
            });
        }
    }

    let missing: Vec<PlayerId> = active_players
        .iter()
        .filter(|p| !seen.contains(p))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(SettlementError::IncompleteRound { round: input.round_number, missing });
    }

    // Validated above: every value fits in [0, endowment], so the pool is at
    // most n * endowment and cannot overflow
    let invested_by = |player: &PlayerId| -> u32 {
        input.moves
            .iter()
            .find(|m| &m.player_id == player)
            .map(|m| m.invested as u32)
            .unwrap_or(0)
    };

    let pool_total: u32 = active_players.iter().map(invested_by).sum();

    let payoffs = active_players
        .iter()
        .map(|player| {
            let invested = invested_by(player);
            let kept = endowment - invested;
            PlayerPayoff {
                player_id: player.clone(),
                invested,
                kept,
                payoff: payoff(kept, pool_total, num_players, config),
            }
        })
        .collect();

    Ok(RoundSettlement {
        round_number: input.round_number,
        endowment_per_player: endowment,
        pool_total,
        payoffs,
    })
}

/// The total a correctly settled round must pay out.
///
/// `(n * endowment - pool) * keep_rate` for the tokens kept, plus the pool's
/// return: `pool * invest_rate` once under equal split, once per player under
/// per-token sharing.
pub fn conserved_total(config: &GameConfig, num_players: u32, endowment: u32, pool: u32) -> f64 {
    let kept_tokens = (num_players as u64 * endowment as u64).saturating_sub(pool as u64) as f64;
    kept_tokens * config.keep_rate
        + config.pool_sharing.share(pool, config.invest_rate, num_players) * num_players as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolSharing;

    fn players(n: usize) -> Vec<PlayerId> {
        (1..=n).map(|i| PlayerId(format!("p{}", i))).collect()
    }

    fn input(round: u32, invested: &[i64]) -> RoundInput {
        RoundInput {
            round_number: round,
            endowment_per_player: 5,
            moves: invested
                .iter()
                .enumerate()
                .map(|(i, &v)| MoveInput {
                    player_id: PlayerId(format!("p{}", i + 1)),
                    invested: v,
                })
                .collect(),
        }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_one_investor_three_free_riders() {
        let config = GameConfig::standard();
        let result = settle_round(&input(1, &[5, 0, 0, 0]), &players(4), &config).unwrap();

        assert_eq!(result.pool_total, 5);
        let values: Vec<f64> = result.payoffs.iter().map(|p| p.payoff).collect();
        assert_close(values[0], 0.125);
        assert_close(values[1], 1.125);
        assert_close(values[2], 1.125);
        assert_close(values[3], 1.125);
        assert_close(result.total_payoff(), 3.5);
        assert_close(result.total_payoff(), conserved_total(&config, 4, 5, 5));
    }

    #[test]
    fn test_nobody_invests() {
        let config = GameConfig::standard();
        let result = settle_round(&input(1, &[0, 0, 0, 0]), &players(4), &config).unwrap();
        assert_eq!(result.pool_total, 0);
        for p in &result.payoffs {
            assert_close(p.payoff, 5.0 * 0.20);
            assert_eq!(p.kept, 5);
        }
    }

    #[test]
    fn test_everybody_invests() {
        let config = GameConfig::standard();
        let result = settle_round(&input(1, &[5, 5, 5, 5]), &players(4), &config).unwrap();
        assert_eq!(result.pool_total, 20);
        for p in &result.payoffs {
            assert_close(p.payoff, 5.0 * 0.10);
            assert_eq!(p.kept, 0);
        }
    }

    #[test]
    fn test_per_token_sharing() {
        let config = GameConfig { pool_sharing: PoolSharing::PerToken, ..GameConfig::standard() };
        let result = settle_round(&input(1, &[5, 0, 0, 0]), &players(4), &config).unwrap();
        // Everyone gets 5 * 0.10 = 0.50 from the pool
        assert_close(result.payoffs[0].payoff, 0.50);
        assert_close(result.payoffs[1].payoff, 1.50);
        assert_close(result.total_payoff(), 5.0);
        assert_close(result.total_payoff(), conserved_total(&config, 4, 5, 5));
    }

    #[test]
    fn test_payoffs_follow_seating_order() {
        let config = GameConfig::standard();
        let mut round = input(1, &[1, 2, 3, 4]);
        round.moves.reverse();
        let result = settle_round(&round, &players(4), &config).unwrap();
        let order: Vec<&str> = result.payoffs.iter().map(|p| p.player_id.as_str()).collect();
        assert_eq!(order, vec!["p1", "p2", "p3", "p4"]);
        assert_eq!(result.payoffs[2].invested, 3);
    }

    #[test]
    fn test_rejects_negative_investment() {
        let config = GameConfig::standard();
        let err = settle_round(&input(1, &[-1, 0, 0, 0]), &players(4), &config).unwrap_err();
        assert_eq!(
            err,
            SettlementError::InvalidMove { player: PlayerId::from("p1"), invested: -1, endowment: 5 }
        );
    }

    #[test]
    fn test_rejects_investment_above_endowment() {
        let config = GameConfig::standard();
        let err = settle_round(&input(1, &[0, 0, 6, 0]), &players(4), &config).unwrap_err();
        assert!(matches!(err, SettlementError::InvalidMove { invested: 6, .. }));
    }

    #[test]
    fn test_incomplete_round() {
        let config = GameConfig::standard();
        let err = settle_round(&input(2, &[1, 2, 3]), &players(4), &config).unwrap_err();
        assert_eq!(err, SettlementError::IncompleteRound { round: 2, missing: vec![PlayerId::from("p4")] });
    }

    #[test]
    fn test_duplicate_move() {
        let config = GameConfig::standard();
        let mut round = input(1, &[1, 2, 3, 4]);
        round.moves.push(MoveInput { player_id: PlayerId::from("p2"), invested: 0 });
        let err = settle_round(&round, &players(4), &config).unwrap_err();
        assert_eq!(err, SettlementError::DuplicateMove { player: PlayerId::from("p2"), round: 1 });
    }

    #[test]
    fn test_unknown_player() {
        let config = GameConfig::standard();
        let mut round = input(1, &[1, 2, 3, 4]);
        round.moves[0].player_id = PlayerId::from("intruder");
        let err = settle_round(&round, &players(4), &config).unwrap_err();
        assert_eq!(err, SettlementError::UnknownPlayer { player: PlayerId::from("intruder") });
    }

    #[test]
    fn test_round_out_of_range() {
        let config = GameConfig::standard();
        assert!(matches!(
            settle_round(&input(0, &[0, 0, 0, 0]), &players(4), &config),
            Err(SettlementError::InvalidRound { round: 0, max_rounds: 15 })
        ));
        assert!(matches!(
            settle_round(&input(16, &[0, 0, 0, 0]), &players(4), &config),
            Err(SettlementError::InvalidRound { round: 16, .. })
        ));
    }

    #[test]
    fn test_is_round_complete() {
        let active = players(3);
        let round = input(1, &[1, 2, 3]);
        assert!(is_round_complete(&round.moves, &active));
        assert!(!is_round_complete(&round.moves[..2], &active));

        let mut doubled = round.moves.clone();
        doubled.push(round.moves[0].clone());
        assert!(!is_round_complete(&doubled, &active));

        let seated_twice = vec![PlayerId::from("p1"), PlayerId::from("p1"), PlayerId::from("p2")];
        assert!(!is_round_complete(&round.moves[..2], &seated_twice));
    }

    #[test]
    fn test_player_seated_twice_is_rejected() {
        let config = GameConfig::standard();
        let seated = vec![PlayerId::from("a"), PlayerId::from("a"), PlayerId::from("b")];
        let round = RoundInput {
            round_number: 1,
            endowment_per_player: 5,
            moves: vec![
                MoveInput { player_id: PlayerId::from("a"), invested: 5 },
                MoveInput { player_id: PlayerId::from("b"), invested: 0 },
            ],
        };
        let err = settle_round(&round, &seated, &config).unwrap_err();
        assert_eq!(
            err,
            SettlementError::InvalidConfig(ConfigError::DuplicateSeat { player: PlayerId::from("a") })
        );
    }

    fn all_in(endowment: u32) -> RoundInput {
        RoundInput {
            round_number: 1,
            endowment_per_player: endowment,
            moves: players(2)
                .into_iter()
                .map(|player_id| MoveInput { player_id, invested: endowment as i64 })
                .collect(),
        }
    }

    #[test]
    fn test_huge_endowment_does_not_overflow() {
        let config = GameConfig { num_players: 2, ..GameConfig::standard() };
        let err = settle_round(&all_in(3_000_000_000), &players(2), &config).unwrap_err();
        assert_eq!(
            err,
            SettlementError::InvalidConfig(ConfigError::TokenOverflow {
                num_players: 2,
                endowment: 3_000_000_000,
            })
        );

        // The largest endowment whose pool still fits settles normally
        let endowment = u32::MAX / 2;
        let result = settle_round(&all_in(endowment), &players(2), &config).unwrap();
        assert_eq!(result.pool_total, endowment * 2);
        let expected = conserved_total(&config, 2, endowment, endowment * 2);
        assert!((result.total_payoff() - expected).abs() <= expected * 1e-12);
    }
}
