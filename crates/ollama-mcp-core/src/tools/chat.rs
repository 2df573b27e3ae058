//! General conversation tool

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::error::{ToolError, ToolResult};
use super::handler::{parse_args, schema_of, ToolContext, ToolHandler};
use super::turn::{run_turn, Turn};
use crate::workflow::{check_temperature, ResponseTrailer};

const SYSTEM_PROMPT: &str = "You are a knowledgeable assistant helping a developer think through problems. \
Answer directly and concisely. Say so when you are unsure.";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ChatArgs {
    /// Message to send to the model
    pub prompt: String,
    /// Model to use (defaults to the server's default model)
    #[serde(default)]
    pub model: Option<String>,
    /// Id returned by a previous call, to continue that conversation
    #[serde(default)]
    pub continuation_id: Option<String>,
    /// Sampling temperature override
    #[serde(default)]
    pub temperature: Option<f32>,
}

pub struct ChatTool;

#[async_trait]
impl ToolHandler for ChatTool {
    fn name(&self) -> &'static str {
        "chat"
    }

    fn description(&self) -> &'static str {
        "Talk to a local model. Pass the returned continuation_id to keep the conversation going."
    }

    fn input_schema(&self) -> Value {
        schema_of::<ChatArgs>()
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> ToolResult<String> {
        let args: ChatArgs = parse_args(arguments)?;
        if args.prompt.trim().is_empty() {
            return Err(ToolError::invalid("prompt", "must not be empty"));
        }
        check_temperature(args.temperature)?;

        let outcome = run_turn(
            ctx,
            Turn {
                tool: self.name(),
                system_prompt: SYSTEM_PROMPT,
                continuation_id: args.continuation_id.as_deref(),
                model: args.model.as_deref(),
                temperature: args.temperature,
                user_message: args.prompt,
            },
        )
        .await?;

        let trailer = ResponseTrailer::for_chat(self.name(), &outcome.continuation_id)
            .field("model", &outcome.model)
            .field("turns", outcome.turns);
        Ok(trailer.attach_to(&outcome.reply))
    }
}
