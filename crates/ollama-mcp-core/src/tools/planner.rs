//! Incremental planning with revisions and branches

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::error::ToolResult;
use super::handler::{parse_args, schema_of, ToolContext, ToolHandler};
use super::turn::{run_turn, Turn};
use crate::workflow::{PlanMarkers, ResponseTrailer, StepFields, StepKind, StepPrompt};
use crate::log_debug;

const SYSTEM_PROMPT: &str = "You are a planning assistant. Build plans one step at a time, keep \
each step concrete, and track which steps were revised or branched.";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PlannerArgs {
    #[serde(flatten)]
    pub fields: StepFields,
    #[serde(flatten)]
    pub markers: PlanMarkers,
}

pub struct PlannerTool;

#[async_trait]
impl ToolHandler for PlannerTool {
    fn name(&self) -> &'static str {
        "planner"
    }

    fn description(&self) -> &'static str {
        "Build a plan step by step. Steps may revise an earlier step (is_step_revision) \
         or branch from one (is_branch_point)."
    }

    fn input_schema(&self) -> Value {
        schema_of::<PlannerArgs>()
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> ToolResult<String> {
        let args: PlannerArgs = parse_args(arguments)?;
        args.fields.validate()?;
        args.markers.validate()?;

        let kind = StepKind::classify(&args.fields, Some(&args.markers));
        log_debug!(
            ctx.logger,
            "[planner] Step {} classified as {}",
            args.fields.step_number, kind,
        );

        let prompt = StepPrompt::new(
            self.name(),
            &args.fields,
            &kind,
            "the final plan as an ordered list of concrete steps",
        );

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

        let mut trailer = ResponseTrailer::for_step(self.name(), &args.fields, &outcome.continuation_id)
            .field("step_kind", &kind);
        trailer = match &kind {
            StepKind::Revision { revises_step } => trailer.field("revises_step", revises_step),
            StepKind::Branch { branch_id, from_step } => trailer
                .field("branch_id", branch_id)
                .field("branch_from_step", from_step),
            StepKind::Initial | StepKind::Continuation => trailer,
        };
        Ok(trailer.attach_to(&outcome.reply))
    }
}
