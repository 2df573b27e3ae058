//! Multi-model deliberation
//!
//! The caller drives the phases: step 1 frames the proposal, each later
//! step consults `models[current_model_index]` under its stance, and once
//! the index runs past the list the collected `model_responses` are
//! synthesized into a recommendation.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::error::{ToolError, ToolResult};
use super::handler::{parse_args, schema_of, ToolContext, ToolHandler};
use super::turn::{run_turn, Turn};
use crate::workflow::{ConsensusPhase, ResponseTrailer, StepFields, StepKind, StepPrompt};
use crate::log_debug;

const SYSTEM_PROMPT: &str = "You take part in a structured deliberation between several models. \
Argue from the stance you are given, be specific, and acknowledge strong opposing points.";

/// Position a participant argues from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    #[serde(alias = "for")]
    Supportive,
    #[serde(alias = "against")]
    Critical,
    #[default]
    Neutral,
}

impl Stance {
    fn instruction(&self) -> &'static str {
        match self {
            Stance::Supportive => {
                "Argue in favour of the proposal. Point out real blockers if you find any, but make the strongest honest case for it."
            }
            Stance::Critical => {
                "Argue against the proposal. Look for risks, hidden costs and weaker assumptions."
            }
            Stance::Neutral => "Weigh the proposal evenly and state where the balance falls.",
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stance::Supportive => "supportive",
            Stance::Critical => "critical",
            Stance::Neutral => "neutral",
        };
        f.write_str(label)
    }
}

/// A model taking part in the deliberation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Participant {
    /// Model name
    pub model: String,
    /// Position to argue from (default: neutral)
    #[serde(default)]
    pub stance: Stance,
    /// Custom instruction replacing the stance's default
    #[serde(default)]
    pub stance_prompt: Option<String>,
}

/// A response collected from a participant in an earlier step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParticipantResponse {
    pub model: String,
    #[serde(default)]
    pub stance: Option<Stance>,
    pub response: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConsensusArgs {
    #[serde(flatten)]
    pub fields: StepFields,
    /// Participants, consulted in the order the caller chooses
    pub models: Vec<Participant>,
    /// Participant to consult in this step
    #[serde(default)]
    pub current_model_index: usize,
    /// Responses gathered so far, used when synthesizing
    #[serde(default)]
    pub model_responses: Vec<ParticipantResponse>,
}

impl ConsensusArgs {
    fn validate(&self) -> ToolResult<()> {
        self.fields.validate()?;
        if self.models.is_empty() {
            return Err(ToolError::invalid("models", "at least one participant is required"));
        }
        if let Some(i) = self.models.iter().position(|p| p.model.trim().is_empty()) {
            return Err(ToolError::invalid("models", format!("participant {} has no model name", i)));
        }
        Ok(())
    }
}

pub struct ConsensusTool;

#[async_trait]
impl ToolHandler for ConsensusTool {
    fn name(&self) -> &'static str {
        "consensus"
    }

    fn description(&self) -> &'static str {
        "Gather opinions from several models with assigned stances, then synthesize a \
         recommendation. Step 1 frames the proposal; each following step consults \
         models[current_model_index]; an index past the end synthesizes."
    }

    fn input_schema(&self) -> Value {
        schema_of::<ConsensusArgs>()
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> ToolResult<String> {
        let args: ConsensusArgs = parse_args(arguments)?;
        args.validate()?;

        let phase = ConsensusPhase::determine(
            args.fields.step_number,
            args.current_model_index,
            args.models.len(),
        );
        let kind = StepKind::classify(&args.fields, None);
        log_debug!(
            ctx.logger,
            "[consensus] Step {} phase {} ({} participants)",
            args.fields.step_number,
            phase,
            args.models.len(),
        );

        let participant = match phase {
            ConsensusPhase::Consulting { index } => args.models.get(index),
            _ => None,
        };
        let model = match participant {
            Some(p) => Some(p.model.as_str()),
            None => args.fields.model.as_deref(),
        };

        let outcome = run_turn(
            ctx,
            Turn {
                tool: self.name(),
                system_prompt: SYSTEM_PROMPT,
                continuation_id: args.fields.continuation(),
                model,
                temperature: args.fields.temperature,
                user_message: compose_prompt(&args, &kind, phase, participant),
            },
        )
        .await?;

        let mut trailer = ResponseTrailer::for_step(self.name(), &args.fields, &outcome.continuation_id)
            .field("phase", phase)
            .field("participants", args.models.len());
        if let Some(p) = participant {
            trailer = trailer.field("consulted_model", &p.model).field("stance", p.stance);
        }
        if let ConsensusPhase::Consulting { .. } = phase {
            trailer = trailer.optional("next_model_index", phase.next_model_index());
        }
        Ok(trailer.attach_to(&outcome.reply))
    }
}

fn compose_prompt(
    args: &ConsensusArgs,
    kind: &StepKind,
    phase: ConsensusPhase,
    participant: Option<&Participant>,
) -> String {
    let roster: Vec<String> = args
        .models
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}: {} ({})", i, p.model, p.stance))
        .collect();

    match phase {
        ConsensusPhase::Framing => StepPrompt::new(
            "consensus",
            &args.fields,
            kind,
            "a neutral statement of the proposal and the key questions to settle",
        )
        .with_framing(
            "Frame the proposal below. Restate it neutrally and list the questions each participant should address.",
        )
        .list_section("Participants", &roster)
        .render(),

        ConsensusPhase::Consulting { .. } => {
            let (stance, instruction) = match participant {
                Some(p) => (
                    p.stance,
                    p.stance_prompt
                        .clone()
                        .filter(|s| !s.trim().is_empty())
                        .unwrap_or_else(|| p.stance.instruction().to_string()),
                ),
                None => (Stance::Neutral, Stance::Neutral.instruction().to_string()),
            };
            StepPrompt::new(
                "consensus",
                &args.fields,
                kind,
                "your verdict on the proposal from your stance",
            )
            .with_framing(format!(
                "You are consulted with a {} stance. Give your own assessment of the proposal.",
                stance
            ))
            .section("Your stance", &instruction)
            .render()
        }

        ConsensusPhase::Synthesizing => {
            let responses: Vec<String> = args
                .model_responses
                .iter()
                .map(|r| match r.stance {
                    Some(stance) => format!("{} ({}): {}", r.model, stance, r.response.trim()),
                    None => format!("{}: {}", r.model, r.response.trim()),
                })
                .collect();
            StepPrompt::new(
                "consensus",
                &args.fields,
                kind,
                "a recommendation listing points of agreement, points of disagreement and a final verdict",
            )
            .with_framing("All participants have been consulted. Synthesize their responses.")
            .list_section("Participants", &roster)
            .list_section("Responses", &responses)
            .render()
        }
    }
}
