//! Lists locally installed models

use async_trait::async_trait;
use serde_json::Value;

use super::error::ToolResult;
use super::handler::{parse_args, schema_of, NoArguments, ToolContext, ToolHandler};
use crate::types::ModelInfo;
use crate::log_debug;

pub struct ListModelsTool;

#[async_trait]
impl ToolHandler for ListModelsTool {
    fn name(&self) -> &'static str {
        "listmodels"
    }

    fn description(&self) -> &'static str {
        "List the models installed on the Ollama server, marking the default."
    }

    fn input_schema(&self) -> Value {
        schema_of::<NoArguments>()
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> ToolResult<String> {
        let _: NoArguments = parse_args(arguments)?;
        let models = ctx.backend.list_models().await?;
        log_debug!(ctx.logger, "[listmodels] Backend reported {} models", models.len());
        Ok(format_models(&models, &ctx.config.default_model, ctx.backend.base_url()))
    }
}

fn format_models(models: &[ModelInfo], default_model: &str, base_url: &str) -> String {
    if models.is_empty() {
        return format!(
            "No models installed at {}. Pull one with `ollama pull {}`.",
            base_url, default_model
        );
    }

    let mut sorted: Vec<&ModelInfo> = models.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut out = format!("Available models ({}) at {}:", models.len(), base_url);
    for model in &sorted {
        let mut facts = Vec::new();
        if let Some(params) = &model.details.parameter_size {
            facts.push(params.clone());
        }
        if let Some(quant) = &model.details.quantization_level {
            facts.push(quant.clone());
        }
        if model.size > 0 {
            facts.push(format_size(model.size));
        }

        out.push_str(&format!("\n- {}", model.name));
        if !facts.is_empty() {
            out.push_str(&format!(" [{}]", facts.join(", ")));
        }
        if model.matches(default_model) {
            out.push_str(" (default)");
        }
    }

    if !models.iter().any(|m| m.matches(default_model)) {
        out.push_str(&format!(
            "\n\nThe default model '{}' is not installed.",
            default_model
        ));
    }
    out
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
