//! Step-wise code review

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::common::{issue_lines, severity_counts, Confidence, Issue};
use super::error::ToolResult;
use super::handler::{parse_args, schema_of, ToolContext, ToolHandler};
use super::turn::{run_turn, Turn};
use crate::workflow::{ResponseTrailer, StepFields, StepKind, StepPrompt};

const SYSTEM_PROMPT: &str = "You are a senior code reviewer. Prioritise correctness and security, \
point at exact locations, and propose concrete fixes.";

/// Focus of the review
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewType {
    #[default]
    Full,
    Security,
    Performance,
    Quick,
}

impl fmt::Display for ReviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReviewType::Full => "full",
            ReviewType::Security => "security",
            ReviewType::Performance => "performance",
            ReviewType::Quick => "quick",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CodeReviewArgs {
    #[serde(flatten)]
    pub fields: StepFields,
    /// Focus of the review (default: full)
    #[serde(default)]
    pub review_type: Option<ReviewType>,
    /// Issues identified so far
    #[serde(default)]
    pub issues_found: Vec<Issue>,
    /// Confidence in the review so far
    #[serde(default)]
    pub confidence: Option<Confidence>,
    /// Files under review
    #[serde(default)]
    pub relevant_files: Vec<String>,
}

pub struct CodeReviewTool;

#[async_trait]
impl ToolHandler for CodeReviewTool {
    fn name(&self) -> &'static str {
        "codereview"
    }

    fn description(&self) -> &'static str {
        "Review code step by step, tracking issues by severity. Set next_step_required \
         to false for the review summary."
    }

    fn input_schema(&self) -> Value {
        schema_of::<CodeReviewArgs>()
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> ToolResult<String> {
        let args: CodeReviewArgs = parse_args(arguments)?;
        args.fields.validate()?;

        let review_type = args.review_type.unwrap_or_default();
        let kind = StepKind::classify(&args.fields, None);
        let prompt = StepPrompt::new(
            self.name(),
            &args.fields,
            &kind,
            "a review summary ordered by severity, with a concrete fix for each issue",
        )
        .section("Review type", &review_type.to_string())
        .list_section("Issues found so far", &issue_lines(&args.issues_found))
        .list_section("Files under review", &args.relevant_files);

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
            .field("review_type", review_type)
            .optional("issues", severity_counts(&args.issues_found))
            .optional("confidence", args.confidence);
        Ok(trailer.attach_to(&outcome.reply))
    }
}
