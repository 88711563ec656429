//! Decision sources
//!
//! Every seat's investment comes from something implementing
//! [`DecisionSource`]: a human's submissions, a language-model agent, the
//! dev-mode random generator, or a scripted [`Strategy`]. Settlement never
//! sees which one produced a move.

use std::collections::VecDeque;
use serde::{Deserialize, Serialize};
use crate::config::GameConfig;
use crate::error::DecisionError;
use crate::random::SeededRng;
use crate::settlement::{PlayerId, RoundSettlement};

/// What a source gets to look at before deciding
#[derive(Clone, Copy, Debug)]
pub struct DecisionContext<'a> {
    pub player: &'a PlayerId,
    /// 0-based seat index
    pub seat: u32,
    /// 1-based
    pub round_number: u32,
    pub endowment: u32,
    pub config: &'a GameConfig,
    /// Settled rounds so far, oldest first
    pub history: &'a [RoundSettlement],
}

impl<'a> DecisionContext<'a> {
    /// Tokens the other players invested in the previous round
    pub fn others_last_invested(&self) -> Option<u32> {
        let last = self.history.last()?;
        let mine = last.payoff_for(self.player).map(|p| p.invested).unwrap_or(0);
        Some(last.pool_total - mine)
    }

    fn check(&self, invested: i64) -> Result<u32, DecisionError> {
        if invested < 0 || invested > self.endowment as i64 {
            return Err(DecisionError::InvalidMove { invested, endowment: self.endowment });
        }
        Ok(invested as u32)
    }
}

/// Supplies one seat's investment for a round
pub trait DecisionSource {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<u32, DecisionError>;

    /// Short label for logs and reports
    fn label(&self) -> String;
}

/// Decisions typed in by a person, consumed one per round
#[derive(Clone, Debug, Default)]
pub struct HumanInput {
    pending: VecDeque<i64>,
}

impl HumanInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, raw: i64) {
        self.pending.push_back(raw);
    }
}

impl DecisionSource for HumanInput {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<u32, DecisionError> {
        let raw = self.pending.pop_front().ok_or(DecisionError::Pending)?;
        ctx.check(raw)
    }

    fn label(&self) -> String {
        "human".to_string()
    }
}

/// Dev mode: uniform token count in [0, endowment]
#[derive(Clone, Debug)]
pub struct RandomSource {
    rng: SeededRng,
}

impl RandomSource {
    pub fn new(rng: SeededRng) -> Self {
        Self { rng }
    }
}

impl DecisionSource for RandomSource {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<u32, DecisionError> {
        let mut rng = self.rng.for_seat(ctx.seat, ctx.round_number);
        Ok(rng.next_inclusive(ctx.endowment))
    }

    fn label(&self) -> String {
        "dev-random".to_string()
    }
}

/// Scripted behaviours for simulations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Invest the whole endowment every round.
    FullContributor,
    /// Never invest.
    FreeRider,
    /// Invest the same amount every round.
    Fixed(u32),
    /// Match the others' average from last round. Start at half.
    ConditionalCooperator,
    /// Start at the full endowment, one token less each round.
    Decay,
}

impl Strategy {
    /// Parse the names accepted on the command line
    pub fn from_name(name: &str) -> Option<Strategy> {
        match name {
            "full" | "FullContributor" => Some(Strategy::FullContributor),
            "free" | "FreeRider" => Some(Strategy::FreeRider),
            "conditional" | "ConditionalCooperator" => Some(Strategy::ConditionalCooperator),
            "decay" | "Decay" => Some(Strategy::Decay),
            other => other.strip_prefix("fixed:")?.parse().ok().map(Strategy::Fixed),
        }
    }
}

impl DecisionSource for Strategy {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<u32, DecisionError> {
        match *self {
            Strategy::FullContributor => Ok(ctx.endowment),
            Strategy::FreeRider => Ok(0),
            Strategy::Fixed(n) => ctx.check(n as i64),
            Strategy::ConditionalCooperator => {
                let others = ctx.config.num_players.saturating_sub(1).max(1);
                match ctx.others_last_invested() {
                    None => Ok(ctx.endowment / 2),
                    Some(total) => {
                        let avg = (total as f64 / others as f64).round() as u32;
                        Ok(avg.min(ctx.endowment))
                    }
                }
            }
            Strategy::Decay => Ok(ctx.endowment.saturating_sub(ctx.round_number.saturating_sub(1))),
        }
    }

    fn label(&self) -> String {
        match self {
            Strategy::Fixed(n) => format!("fixed:{}", n),
            other => format!("{:?}", other),
        }
    }
}

/// Human-readable description of a strategy
pub fn describe_strategy(strategy: &Strategy) -> String {
    match strategy {
        Strategy::FullContributor => "Invests every token, every round.".to_string(),
        Strategy::FreeRider => "Keeps every token and lives off the pool.".to_string(),
        Strategy::Fixed(n) => format!("Invests {} tokens every round.", n),
        Strategy::ConditionalCooperator =>
            "Matches what the others invested on average last round. Starts at half.".to_string(),
        Strategy::Decay => "Starts fully invested and gives one token less each round.".to_string(),
    }
}

/// What to substitute when a source fails or times out
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Fallback {
    #[default]
    Zero,
    Random,
}

impl Fallback {
    pub fn pick(&self, endowment: u32, rng: &mut SeededRng) -> u32 {
        match self {
            Fallback::Zero => 0,
            Fallback::Random => rng.next_inclusive(endowment),
        }
    }
}

/// A decision ready for the ledger
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedDecision {
    pub invested: u32,
    pub fallback: bool,
    /// Why the fallback was used
    pub error: Option<DecisionError>,
}

/// Turn a source's answer into something settlement will accept.
pub fn resolve_decision(
    decision: Result<u32, DecisionError>,
    endowment: u32,
    fallback: Fallback,
    rng: &mut SeededRng,
) -> ResolvedDecision {
    let error = match decision {
        Ok(invested) if invested <= endowment => {
            return ResolvedDecision { invested, fallback: false, error: None };
        }
        Ok(invested) => DecisionError::InvalidMove { invested: invested as i64, endowment },
        Err(e) => e,
    };
    ResolvedDecision {
        invested: fallback.pick(endowment, rng),
        fallback: true,
        error: Some(error),
    }
}
