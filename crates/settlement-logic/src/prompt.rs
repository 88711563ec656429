//! Prompt text for language-model agents, and parsing of their answers

use serde::Deserialize;
use crate::config::{GameConfig, PoolSharing};
use crate::error::DecisionError;
use crate::settlement::{PlayerId, RoundSettlement};
use crate::strategy::DecisionContext;

fn dollars(x: f64) -> String {
    format!("${:.2}", x)
}

/// How pool earnings are worded to the participant
fn pool_clause(config: &GameConfig) -> String {
    let others = config.num_players.saturating_sub(1);
    match config.pool_sharing {
        PoolSharing::PerToken => format!(
            "{} for each token you invest, and {} for each token invested by the {} other people",
            dollars(config.invest_rate), dollars(config.invest_rate), others,
        ),
        PoolSharing::EqualSplit => format!(
            "an equal 1/{} share of {} for every token invested by anyone in the group, you included",
            config.num_players, dollars(config.invest_rate),
        ),
    }
}

/// Instruction sent as the system message with every request
pub fn system_prompt(config: &GameConfig) -> String {
    format!(
        "Act like you are a player in a game. Respond ONLY with a JSON object of the form: \
         {{\"tokens\": <integer between 0 and {}>}}",
        config.tokens_per_round,
    )
}

/// Standing rules, restated at the top of every prompt
pub fn rules_summary(config: &GameConfig) -> String {
    let others = config.num_players.saturating_sub(1);
    format!(
        "Rules for our game:\n\n\
         - You will be matched with the same group of {others} other people in each round. \
         There will be a total of {rounds} rounds.\n\n\
         - All people begin each round with {tokens} tokens which they may keep (and earn {keep} each) \
         or invest. You earn {pool}.\n\n\
         - You begin each round with a new endowment of {tokens} tokens, irrespective of how many \
         tokens you kept or invested in previous rounds.\n\n\
         - Your earnings for each round are added to your previous earnings.",
        others = others,
        rounds = config.rounds_per_game,
        tokens = config.tokens_per_round,
        keep = dollars(config.keep_rate),
        pool = pool_clause(config),
    )
}

/// Natural-language report of `player`'s outcome in a settled round
pub fn round_report(round: &RoundSettlement, player: &PlayerId, cumulative: f64) -> Option<String> {
    let mine = round.payoff_for(player)?;
    let others = round.pool_total - mine.invested;
    Some(format!(
        "Your Results for Round {round}\n\n\
         Your Decision: {kept} kept, {invested} invested\n\
         {others} tokens invested by the other people in your group.\n\
         Your round {round} earnings = {earned}\n\
         Your Cumulative Earnings = {total}",
        round = round.round_number,
        kept = mine.kept,
        invested = mine.invested,
        others = others,
        earned = dollars(mine.payoff),
        total = dollars(cumulative),
    ))
}

/// Markdown table of group totals per round
pub fn history_table(history: &[RoundSettlement]) -> String {
    if history.is_empty() {
        return "No previous rounds".to_string();
    }
    let mut table = String::from("| Round | Total_Invested | Average_Investment |\n|---:|---:|---:|\n");
    for round in history {
        table.push_str(&format!(
            "| {} | {} | {:.2} |\n",
            round.round_number,
            round.pool_total,
            round.average_investment(),
        ));
    }
    table
}

/// Full user message asking for this round's investment
pub fn build_investment_prompt(ctx: &DecisionContext<'_>) -> String {
    let config = ctx.config;
    let mut prompt = rules_summary(config);

    if let Some(last) = ctx.history.last() {
        let cumulative: f64 = ctx.history
            .iter()
            .filter_map(|r| r.payoff_for(ctx.player))
            .map(|p| p.payoff)
            .sum();
        if let Some(report) = round_report(last, ctx.player, cumulative) {
            prompt.push_str("\n\n");
            prompt.push_str(&report);
        }
    }

    prompt.push_str(&format!(
        "\n\nWe are starting round {}\n\nResults so far:\n```markdown\n{}```\n\n\
         Choose a number of tokens to invest (between and including 0 and {}). \
         Respond ONLY with a JSON object of the form: {{\"tokens\": <integer between 0 and {}>}}.",
        ctx.round_number,
        history_table(ctx.history),
        ctx.endowment,
        ctx.endowment,
    ));
    prompt
}

#[derive(Deserialize)]
struct TokensAnswer {
    tokens: i64,
}

/// Pull `{"tokens": N}` out of a model answer.
///
/// The first embedded JSON object with an integer `tokens` field wins; any
/// surrounding prose is ignored. A value outside `[0, endowment]` is an
/// `InvalidMove`.
pub fn parse_investment(answer: &str, endowment: u32) -> Result<u32, DecisionError> {
    let found = answer
        .match_indices('{')
        .find_map(|(start, _)| {
            serde_json::Deserializer::from_str(&answer[start..])
                .into_iter::<TokensAnswer>()
                .next()
                .and_then(|r| r.ok())
        })
        .ok_or_else(|| DecisionError::Unparseable(answer.to_string()))?;

    if found.tokens < 0 || found.tokens > endowment as i64 {
        return Err(DecisionError::InvalidMove { invested: found.tokens, endowment });
    }
    Ok(found.tokens as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::{settle_round, MoveInput, RoundInput};

    #[test]
    fn test_parse_plain_json() {
        assert_eq!(parse_investment(r#"{"tokens": 3}"#, 5), Ok(3));
    }

    #[test]
    fn test_parse_with_prose_and_fences() {
        let answer = "Sure! Here is my choice:\n```json\n{ \"tokens\" : 5 }\n```\nGood luck.";
        assert_eq!(parse_investment(answer, 5), Ok(5));
    }

    #[test]
    fn test_parse_skips_unrelated_objects() {
        let answer = r#"{"thinking": "keep most"} {"tokens": 1}"#;
        assert_eq!(parse_investment(answer, 5), Ok(1));
    }

    #[test]
    fn test_parse_out_of_range() {
        assert_eq!(
            parse_investment(r#"{"tokens": 7}"#, 5),
            Err(DecisionError::InvalidMove { invested: 7, endowment: 5 })
        );
        assert_eq!(
            parse_investment(r#"{"tokens": -1}"#, 5),
            Err(DecisionError::InvalidMove { invested: -1, endowment: 5 })
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_investment("I'll invest three.", 5), Err(DecisionError::Unparseable(_))));
        assert!(matches!(parse_investment(r#"{"tokens": "three"}"#, 5), Err(DecisionError::Unparseable(_))));
    }

    #[test]
    fn test_prompt_mentions_round_and_history() {
        let config = GameConfig::standard();
        let players: Vec<PlayerId> = ["a", "b", "c", "d"].iter().map(|s| PlayerId::from(*s)).collect();
        let input = RoundInput {
            round_number: 1,
            endowment_per_player: 5,
            moves: players
                .iter()
                .zip([2i64, 0, 5, 1])
                .map(|(p, v)| MoveInput { player_id: p.clone(), invested: v })
                .collect(),
        };
        let history = vec![settle_round(&input, &players, &config).unwrap()];
        let ctx = DecisionContext {
            player: &players[0],
            seat: 0,
            round_number: 2,
            endowment: 5,
            config: &config,
            history: &history,
        };

        let prompt = build_investment_prompt(&ctx);
        assert!(prompt.contains("We are starting round 2"));
        assert!(prompt.contains("| 1 | 8 | 2.00 |"));
        assert!(prompt.contains("Your Decision: 3 kept, 2 invested"));
        assert!(prompt.contains("6 tokens invested by the other people"));
        assert!(prompt.contains("$0.20"));
    }

    #[test]
    fn test_first_round_has_no_report() {
        let config = GameConfig::standard();
        let me = PlayerId::from("a");
        let ctx = DecisionContext {
            player: &me,
            seat: 0,
            round_number: 1,
            endowment: 5,
            config: &config,
            history: &[],
        };
        let prompt = build_investment_prompt(&ctx);
        assert!(prompt.contains("No previous rounds"));
        assert!(!prompt.contains("Your Results"));
    }
}
