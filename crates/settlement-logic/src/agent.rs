//! Language-model agent seat
//!
//! The network client lives outside this crate; anything implementing
//! [`ModelClient`] can back an agent.

use serde::{Deserialize, Serialize};
use crate::error::DecisionError;
use crate::prompt::{build_investment_prompt, parse_investment, system_prompt};
use crate::strategy::{DecisionContext, DecisionSource};

/// A chat-completion backend
pub trait ModelClient {
    /// Send one system + user exchange to `model` and return the reply text.
    fn complete(&mut self, model: &str, system: &str, user: &str) -> Result<String, String>;
}

/// Who said a transcript line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    Researcher,
    Model,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// Seat played by a language model
pub struct ModelAgent<C: ModelClient> {
    client: C,
    model: String,
    transcript: Vec<TranscriptEntry>,
}

impl<C: ModelClient> ModelAgent<C> {
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            transcript: Vec::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Every prompt and reply so far, in order
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: ModelClient> DecisionSource for ModelAgent<C> {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<u32, DecisionError> {
        let prompt = build_investment_prompt(ctx);
        let system = system_prompt(ctx.config);
        self.transcript.push(TranscriptEntry { speaker: Speaker::Researcher, text: prompt.clone() });

        let reply = self.client
            .complete(&self.model, &system, &prompt)
            .map_err(DecisionError::Model)?;
        self.transcript.push(TranscriptEntry { speaker: Speaker::Model, text: reply.clone() });

        parse_investment(&reply, ctx.endowment)
    }

    fn label(&self) -> String {
        format!("agent:{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::settlement::PlayerId;

    /// Replies from a fixed script, then errors
    struct Scripted(Vec<Result<String, String>>);

    impl ModelClient for Scripted {
        fn complete(&mut self, _model: &str, _system: &str, _user: &str) -> Result<String, String> {
            if self.0.is_empty() {
                return Err("script exhausted".to_string());
            }
            self.0.remove(0)
        }
    }

    fn decide(agent: &mut ModelAgent<Scripted>) -> Result<u32, DecisionError> {
        let config = GameConfig::standard();
        let me = PlayerId::from("agent-1");
        let ctx = DecisionContext {
            player: &me,
            seat: 0,
            round_number: 1,
            endowment: 5,
            config: &config,
            history: &[],
        };
        agent.decide(&ctx)
    }

    #[test]
    fn test_agent_parses_reply_and_records_transcript() {
        let mut agent = ModelAgent::new(Scripted(vec![Ok(r#"{"tokens": 2}"#.to_string())]), "test-model");
        assert_eq!(decide(&mut agent), Ok(2));
        assert_eq!(agent.transcript().len(), 2);
        assert_eq!(agent.transcript()[0].speaker, Speaker::Researcher);
        assert_eq!(agent.transcript()[1].text, r#"{"tokens": 2}"#);
        assert_eq!(agent.label(), "agent:test-model");
    }

    #[test]
    fn test_agent_out_of_range_reply() {
        let mut agent = ModelAgent::new(Scripted(vec![Ok(r#"{"tokens": 12}"#.to_string())]), "m");
        assert_eq!(decide(&mut agent), Err(DecisionError::InvalidMove { invested: 12, endowment: 5 }));
    }

    #[test]
    fn test_agent_client_failure() {
        let mut agent = ModelAgent::new(Scripted(vec![]), "m");
        assert_eq!(decide(&mut agent), Err(DecisionError::Model("script exhausted".to_string())));
        // Only the prompt made it into the transcript
        assert_eq!(agent.transcript().len(), 1);
    }
}
