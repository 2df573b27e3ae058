//! Pre-commit validation of pending changes

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{issue_lines, severity_counts, Confidence, Issue};
use super::error::ToolResult;
use super::handler::{parse_args, schema_of, ToolContext, ToolHandler};
use super::turn::{run_turn, Turn};
use crate::workflow::{ResponseTrailer, StepFields, StepKind, StepPrompt};

const SYSTEM_PROMPT: &str = "You validate changes before they are committed. Check that the change \
does what it claims, look for regressions and missing tests, and give a clear verdict.";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PrecommitArgs {
    #[serde(flatten)]
    pub fields: StepFields,
    /// Repository or directory being validated
    #[serde(default)]
    pub path: Option<String>,
    /// Issues identified so far
    #[serde(default)]
    pub issues_found: Vec<Issue>,
    /// Confidence in the validation so far
    #[serde(default)]
    pub confidence: Option<Confidence>,
}

pub struct PrecommitTool;

#[async_trait]
impl ToolHandler for PrecommitTool {
    fn name(&self) -> &'static str {
        "precommit"
    }

    fn description(&self) -> &'static str {
        "Validate pending changes step by step. Set next_step_required to false for \
         the commit verdict."
    }

    fn input_schema(&self) -> Value {
        schema_of::<PrecommitArgs>()
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> ToolResult<String> {
        let args: PrecommitArgs = parse_args(arguments)?;
        args.fields.validate()?;

        let kind = StepKind::classify(&args.fields, None);
        let prompt = StepPrompt::new(
            self.name(),
            &args.fields,
            &kind,
            "a verdict (ready to commit or not) listing any blocking issues",
        )
        .optional_section("Path", args.path.as_deref())
        .list_section("Issues found so far", &issue_lines(&args.issues_found));

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
            .optional("path", args.path.as_deref())
            .optional("issues", severity_counts(&args.issues_found))
            .optional("confidence", args.confidence);
        Ok(trailer.attach_to(&outcome.reply))
    }
}
