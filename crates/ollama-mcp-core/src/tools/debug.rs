//! Step-wise root cause investigation

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::Confidence;
use super::error::ToolResult;
use super::handler::{parse_args, schema_of, ToolContext, ToolHandler};
use super::turn::{run_turn, Turn};
use crate::workflow::{ResponseTrailer, StepFields, StepKind, StepPrompt};

const SYSTEM_PROMPT: &str = "You are an experienced debugger. Work from evidence, keep competing \
hypotheses apart, and say what would confirm or rule each one out.";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DebugArgs {
    #[serde(flatten)]
    pub fields: StepFields,
    /// Current best explanation of the bug
    #[serde(default)]
    pub hypothesis: Option<String>,
    /// Confidence in the hypothesis
    #[serde(default)]
    pub confidence: Option<Confidence>,
    /// Files relevant to the investigation
    #[serde(default)]
    pub relevant_files: Vec<String>,
}

pub struct DebugTool;

#[async_trait]
impl ToolHandler for DebugTool {
    fn name(&self) -> &'static str {
        "debug"
    }

    fn description(&self) -> &'static str {
        "Investigate a bug step by step. Each call records findings and a hypothesis; \
         set next_step_required to false for the root cause and fix."
    }

    fn input_schema(&self) -> Value {
        schema_of::<DebugArgs>()
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> ToolResult<String> {
        let args: DebugArgs = parse_args(arguments)?;
        args.fields.validate()?;

        let kind = StepKind::classify(&args.fields, None);
        let prompt = StepPrompt::new(
            self.name(),
            &args.fields,
            &kind,
            "the root cause, the evidence for it and a minimal fix",
        )
        .optional_section("Hypothesis", args.hypothesis.as_deref())
        .optional_section("Confidence", args.confidence.map(|c| c.to_string()).as_deref())
        .list_section("Relevant files", &args.relevant_files);

        let outcome = run_turn(
            ctx,
            Turn {
                tool: self.name(),
                system_prompt: SYSTEM_PROMPT,
                continuation_id: args.fields.continuation(),
                model: args.fields.model.as_deref(),
                temperature: args.fields.temperature,
                user_message: prompt.render(),
            },
        )
        .await?;

        let trailer = ResponseTrailer::for_step(self.name(), &args.fields, &outcome.continuation_id)
            .optional("confidence", args.confidence)
            .optional("hypothesis", args.hypothesis.as_deref());
        Ok(trailer.attach_to(&outcome.reply))
    }
}
