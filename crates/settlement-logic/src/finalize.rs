//! End-of-game aggregation

use serde::{Deserialize, Serialize};
use crate::error::SettlementError;
use crate::settlement::{PlayerId, RoundSettlement};

/// Final standing of one player
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerStanding {
    pub player_id: PlayerId,
    pub total_earnings: f64,
    pub total_investment: u64,
    pub average_investment: f64,
    /// Percent of all endowed tokens the player invested
    pub cooperation_rate: f64,
    /// 1-based
    pub rank: u32,
}

/// Aggregate outcome of a finished game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    /// Sorted by rank
    pub rankings: Vec<PlayerStanding>,
    /// Average investment per player, one entry per round
    pub cooperation_trend: Vec<f64>,
    /// Mean pool size per round
    pub average_group_investment: f64,
    pub total_rounds: u32,
}

impl GameResult {
    pub fn standing(&self, player: &PlayerId) -> Option<&PlayerStanding> {
        self.rankings.iter().find(|s| &s.player_id == player)
    }

    pub fn winner(&self) -> Option<&PlayerStanding> {
        self.rankings.first()
    }
}

#[derive(Default)]
struct Tally {
    earnings: f64,
    invested: u64,
    endowed: u64,
    rounds: u32,
}

/// Aggregate a finished sequence of settled rounds.
///
/// Rounds must be numbered `1..=n` in order. Ranking is by total earnings,
/// descending, ties broken by player id. Pure: the same rounds always give
/// the same result.
pub fn finalize_game(rounds: &[RoundSettlement]) -> Result<GameResult, SettlementError> {
    if rounds.is_empty() {
        return Err(SettlementError::InvalidRound { round: 0, max_rounds: 0 });
    }
    for (i, round) in rounds.iter().enumerate() {
        let expected = i as u32 + 1;
        if round.round_number != expected {
            return Err(SettlementError::InvalidRound {
                round: round.round_number,
                max_rounds: rounds.len() as u32,
            });
        }
    }

    // First-seen order keeps the tally deterministic
    let mut tallies: Vec<(PlayerId, Tally)> = Vec::new();
    for round in rounds {
        for p in &round.payoffs {
            let idx = match tallies.iter().position(|(id, _)| id == &p.player_id) {
                Some(idx) => idx,
                None => {
                    tallies.push((p.player_id.clone(), Tally::default()));
                    tallies.len() - 1
                }
            };
            let tally = &mut tallies[idx].1;
            tally.earnings += p.payoff;
            tally.invested += p.invested as u64;
            tally.endowed += round.endowment_per_player as u64;
            tally.rounds += 1;
        }
    }

    let mut rankings: Vec<PlayerStanding> = tallies
        .into_iter()
        .map(|(player_id, t)| PlayerStanding {
            player_id,
            total_earnings: t.earnings,
            total_investment: t.invested,
            average_investment: if t.rounds == 0 { 0.0 } else { t.invested as f64 / t.rounds as f64 },
            cooperation_rate: if t.endowed == 0 { 0.0 } else { t.invested as f64 * 100.0 / t.endowed as f64 },
            rank: 0,
        })
        .collect();

    rankings.sort_by(|a, b| {
        b.total_earnings
            .total_cmp(&a.total_earnings)
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    for (i, standing) in rankings.iter_mut().enumerate() {
        standing.rank = i as u32 + 1;
    }

    let cooperation_trend: Vec<f64> = rounds.iter().map(|r| r.average_investment()).collect();
    let pool_sum: u64 = rounds.iter().map(|r| r.pool_total as u64).sum();

    Ok(GameResult {
        rankings,
        cooperation_trend,
        average_group_investment: pool_sum as f64 / rounds.len() as f64,
        total_rounds: rounds.len() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::settlement::{settle_round, MoveInput, RoundInput};

    fn settle(round: u32, invested: &[i64]) -> RoundSettlement {
        let players: Vec<PlayerId> = (0..invested.len()).map(|i| PlayerId(format!("p{}", i + 1))).collect();
        let input = RoundInput {
            round_number: round,
            endowment_per_player: 5,
            moves: players
                .iter()
                .zip(invested)
                .map(|(p, &v)| MoveInput { player_id: p.clone(), invested: v })
                .collect(),
        };
        settle_round(&input, &players, &GameConfig::standard()).unwrap()
    }

    #[test]
    fn test_totals_and_ranking() {
        let rounds = vec![settle(1, &[5, 0, 0, 0]), settle(2, &[5, 0, 5, 0])];
        let result = finalize_game(&rounds).unwrap();

        assert_eq!(result.total_rounds, 2);
        // p2 and p4 free-ride both rounds and tie; the id breaks the tie
        assert_eq!(result.rankings[0].player_id, PlayerId::from("p2"));
        assert_eq!(result.rankings[1].player_id, PlayerId::from("p4"));
        assert_eq!(result.rankings[0].rank, 1);
        assert_eq!(result.rankings[1].rank, 2);

        let p1 = result.standing(&PlayerId::from("p1")).unwrap();
        assert_eq!(p1.total_investment, 10);
        assert!((p1.average_investment - 5.0).abs() < 1e-12);
        assert!((p1.cooperation_rate - 100.0).abs() < 1e-12);
        // round 1: 0.125, round 2: 0.25
        assert!((p1.total_earnings - 0.375).abs() < 1e-9);
        assert_eq!(p1.rank, 4);
    }

    #[test]
    fn test_cooperation_trend() {
        let rounds = vec![settle(1, &[4, 0, 0, 0]), settle(2, &[4, 4, 4, 4])];
        let result = finalize_game(&rounds).unwrap();
        assert_eq!(result.cooperation_trend, vec![1.0, 4.0]);
        assert!((result.average_group_investment - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let rounds = vec![
            settle(1, &[1, 2, 3, 4]),
            settle(2, &[3, 3, 0, 5]),
            settle(3, &[0, 0, 0, 0]),
        ];
        assert_eq!(finalize_game(&rounds).unwrap(), finalize_game(&rounds).unwrap());
    }

    #[test]
    fn test_totals_past_u32_range() {
        let endowment = u32::MAX / 2;
        let players = vec![PlayerId::from("p1"), PlayerId::from("p2")];
        let rounds: Vec<RoundSettlement> = (1..=3)
            .map(|round| {
                let input = RoundInput {
                    round_number: round,
                    endowment_per_player: endowment,
                    moves: players
                        .iter()
                        .map(|p| MoveInput { player_id: p.clone(), invested: endowment as i64 })
                        .collect(),
                };
                settle_round(&input, &players, &GameConfig::standard()).unwrap()
            })
            .collect();

        let result = finalize_game(&rounds).unwrap();
        let p1 = result.standing(&PlayerId::from("p1")).unwrap();
        assert_eq!(p1.total_investment, 3 * endowment as u64);
        assert!((p1.cooperation_rate - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_or_misnumbered_rounds() {
        assert!(matches!(finalize_game(&[]), Err(SettlementError::InvalidRound { .. })));
        let rounds = vec![settle(1, &[0, 0]), settle(3, &[0, 0])];
        assert_eq!(
            finalize_game(&rounds),
            Err(SettlementError::InvalidRound { round: 3, max_rounds: 2 })
        );
    }
}
