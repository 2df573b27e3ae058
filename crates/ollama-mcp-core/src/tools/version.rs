//! Server and backend information

use async_trait::async_trait;
use serde_json::Value;

use super::error::ToolResult;
use super::handler::{parse_args, schema_of, NoArguments, ToolContext, ToolHandler};

pub const SERVER_NAME: &str = "ollama-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct VersionTool;

#[async_trait]
impl ToolHandler for VersionTool {
    fn name(&self) -> &'static str {
        "version"
    }

    fn description(&self) -> &'static str {
        "Show the server version, backend, default model and enabled tools."
    }

    fn input_schema(&self) -> Value {
        schema_of::<NoArguments>()
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> ToolResult<String> {
        let _: NoArguments = parse_args(arguments)?;
        let config = &ctx.config;
        let temperature = config
            .default_temperature
            .map(|t| t.to_string())
            .unwrap_or_else(|| "model default".to_string());

        Ok([
            format!("{} {}", SERVER_NAME, SERVER_VERSION),
            format!("backend: {} ({})", ctx.backend.name(), ctx.backend.base_url()),
            format!("default_model: {}", config.default_model),
            format!("default_temperature: {}", temperature),
            format!("streaming: {}", config.stream),
            format!(
                "conversations: {}/{} (retention {}h)",
                ctx.store.size(),
                config.max_conversations,
                config.conversation_timeout.as_secs() / 3600
            ),
            format!("tools: {}", ctx.enabled_tools.join(", ")),
        ]
        .join("\n"))
    }
}
