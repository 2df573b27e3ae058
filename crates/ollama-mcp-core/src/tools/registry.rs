//! Tool registry: listing and dispatch
//!
//! The ToolRegistry is the central component for:
//! - Holding the built-in tool handlers
//! - Applying the configured disabled list (essential tools always stay)
//! - Listing tools with their JSON Schemas for the host
//! - Dispatching calls and turning failures into error responses

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::chat::ChatTool;
use super::codereview::CodeReviewTool;
use super::consensus::ConsensusTool;
use super::debug::DebugTool;
use super::error::ToolError;
use super::handler::{ToolContext, ToolHandler};
use super::listmodels::ListModelsTool;
use super::planner::PlannerTool;
use super::precommit::PrecommitTool;
use super::version::VersionTool;
use crate::types::ToolResponse;
use crate::{log_info, log_warn};

/// Tools that can never be disabled
pub static ESSENTIAL_TOOLS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["version", "listmodels"].into_iter().collect());

/// Every built-in handler, in listing order
pub fn builtin_tools() -> Vec<Arc<dyn ToolHandler>> {
    vec![
        Arc::new(ChatTool),
        Arc::new(DebugTool),
        Arc::new(PlannerTool),
        Arc::new(CodeReviewTool),
        Arc::new(PrecommitTool),
        Arc::new(ConsensusTool),
        Arc::new(ListModelsTool),
        Arc::new(VersionTool),
    ]
}

/// Information about a tool as shown to the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for tool parameters
    pub input_schema: Value,
}

impl ToolInfo {
    fn from_handler(handler: &dyn ToolHandler) -> Self {
        Self {
            name: handler.name().to_string(),
            description: handler.description().to_string(),
            input_schema: handler.input_schema(),
        }
    }
}

/// Tool registry for the server's tools
pub struct ToolRegistry {
    /// Handlers in listing order
    handlers: Vec<Arc<dyn ToolHandler>>,
    /// Enabled/disabled state by tool name, fixed at construction
    tool_states: HashMap<String, bool>,
    /// Shared collaborators handed to every call
    context: ToolContext,
}

impl ToolRegistry {
    /// Create a registry with the built-in tools
    pub fn new(context: ToolContext) -> Self {
        Self::with_handlers(builtin_tools(), context)
    }

    /// Create a registry over specific handlers, applying the configured
    /// disabled list
    pub fn with_handlers(handlers: Vec<Arc<dyn ToolHandler>>, context: ToolContext) -> Self {
        let config = &context.config;
        let states: HashMap<String, bool> = handlers
            .iter()
            .map(|h| {
                let enabled = ESSENTIAL_TOOLS.contains(h.name()) || !config.is_tool_disabled(h.name());
                (h.name().to_string(), enabled)
            })
            .collect();

        for name in &config.disabled_tools {
            if ESSENTIAL_TOOLS.contains(name.as_str()) {
                log_warn!(
                    context.logger,
                    "[ToolRegistry] Tool '{}' is essential and cannot be disabled",
                    name,
                );
            } else if !states.contains_key(name) {
                log_warn!(
                    context.logger,
                    "[ToolRegistry] Ignoring unknown tool '{}' in disabled list",
                    name,
                );
            }
        }

        let registry = Self {
            handlers,
            tool_states: states,
            context,
        };
        log_info!(
            registry.context.logger,
            "[ToolRegistry] {} of {} tools enabled: {}",
            registry.enabled_tool_count(),
            registry.tool_count(),
            registry.enabled_names().join(", "),
        );
        registry
    }

    /// Tools to advertise to the host (enabled only)
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.handlers
            .iter()
            .filter(|h| self.is_enabled(h.name()))
            .map(|h| ToolInfo::from_handler(h.as_ref()))
            .collect()
    }

    /// Call a tool by name
    ///
    /// Unknown or disabled names are `Err(ToolError::UnknownTool)` and touch
    /// nothing. Every other failure becomes an error response.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResponse, ToolError> {
        let handler = self
            .enabled_handler(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        log_info!(self.context.logger, "[ToolRegistry] Calling tool: {}", name);

        let mut context = self.context.clone();
        context.enabled_tools = self.enabled_names();

        match handler.execute(&context, arguments).await {
            Ok(text) => Ok(ToolResponse::text(text)),
            Err(ToolError::UnknownTool(other)) => Err(ToolError::UnknownTool(other)),
            Err(e) => {
                log_warn!(self.context.logger, "[ToolRegistry] Tool '{}' failed: {}", name, e);
                Ok(e.to_response())
            }
        }
    }

    /// Shared context (store, backend, config, logger)
    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    /// Get count of registered tools
    pub fn tool_count(&self) -> usize {
        self.handlers.len()
    }

    /// Get count of enabled tools
    pub fn enabled_tool_count(&self) -> usize {
        self.list_tools().len()
    }

    fn is_enabled(&self, name: &str) -> bool {
        self.tool_states.get(name).copied().unwrap_or(false)
    }

    fn enabled_names(&self) -> Vec<String> {
        self.handlers
            .iter()
            .filter(|h| self.is_enabled(h.name()))
            .map(|h| h.name().to_string())
            .collect()
    }

    fn enabled_handler(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        if !self.is_enabled(name) {
            return None;
        }
        self.handlers.iter().find(|h| h.name() == name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InferenceBackend, MockBackend, MockConfig, MockMode};
    use crate::config::ServerConfig;
    use crate::conversation::{ConversationStore, Metadata};
    use crate::logging::{LogLevel, Logger, MemoryLogger, NoOpLogger};
    use crate::types::{Message, MessageRole};
    use serde_json::json;

    struct Harness {
        registry: ToolRegistry,
        backend: Arc<MockBackend>,
        store: Arc<ConversationStore>,
    }

    fn harness_with(config: ServerConfig, backend: MockBackend, logger: Arc<dyn Logger>) -> Harness {
        let backend = Arc::new(backend);
        let store = Arc::new(ConversationStore::new(config.store_limits(), logger.clone()));
        let context = ToolContext::new(
            store.clone(),
            backend.clone() as Arc<dyn InferenceBackend>,
            Arc::new(config),
            logger,
        );
        Harness {
            registry: ToolRegistry::new(context),
            backend,
            store,
        }
    }

    fn harness() -> Harness {
        harness_with(
            ServerConfig::default(),
            MockBackend::echo(Arc::new(NoOpLogger)),
            Arc::new(NoOpLogger),
        )
    }

    /// Value of `key:` in the trailer of a response
    fn trailer_value(text: &str, key: &str) -> Option<String> {
        let (_, trailer) = text.rsplit_once("\n---\n")?;
        trailer
            .lines()
            .find_map(|line| line.strip_prefix(&format!("{}: ", key)))
            .map(str::to_string)
    }

    fn step_args(step_number: u32, continuation_id: Option<&str>) -> Value {
        let mut args = json!({
            "step": "Investigate the flaky test",
            "step_number": step_number,
            "total_steps": 3,
            "next_step_required": true,
            "findings": "Fails only under load"
        });
        if let Some(id) = continuation_id {
            args["continuation_id"] = json!(id);
        }
        args
    }

    #[test]
    fn test_lists_all_builtin_tools_with_schemas() {
        let h = harness();
        let tools = h.registry.list_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["chat", "debug", "planner", "codereview", "precommit", "consensus", "listmodels", "version"]
        );
        for tool in &tools {
            assert_eq!(tool.input_schema["type"], "object", "{} schema", tool.name);
        }
        let consensus = tools.iter().find(|t| t.name == "consensus").unwrap();
        assert!(consensus.input_schema["properties"]["models"].is_object());
        assert!(consensus.input_schema["properties"]["step_number"].is_object());
    }

    #[test]
    fn test_disabled_list_respects_essential_tools() {
        let logger = Arc::new(MemoryLogger::new());
        let config = ServerConfig {
            disabled_tools: vec!["debug".to_string(), "version".to_string(), "nope".to_string()],
            ..Default::default()
        };
        let h = harness_with(config, MockBackend::echo(Arc::new(NoOpLogger)), logger.clone());

        let names: Vec<String> = h.registry.list_tools().into_iter().map(|t| t.name).collect();
        assert!(!names.contains(&"debug".to_string()));
        assert!(names.contains(&"version".to_string()));
        assert!(logger.contains(LogLevel::Warn, "'version' is essential"));
        assert!(logger.contains(LogLevel::Warn, "unknown tool 'nope'"));

        assert_eq!(h.registry.tool_count(), 8);
        assert_eq!(h.registry.enabled_tool_count(), 7);
    }

    #[tokio::test]
    async fn test_unknown_tool_leaves_store_untouched() {
        let h = harness();
        let err = h.registry.call_tool("does-not-exist", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref n) if n == "does-not-exist"));
        assert_eq!(h.store.size(), 0);
        assert_eq!(h.backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_disabled_tool_is_unknown() {
        let config = ServerConfig {
            disabled_tools: vec!["chat".to_string()],
            ..Default::default()
        };
        let h = harness_with(config, MockBackend::echo(Arc::new(NoOpLogger)), Arc::new(NoOpLogger));
        let err = h.registry.call_tool("chat", json!({"prompt": "hi"})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
        assert_eq!(h.store.size(), 0);
    }

    #[tokio::test]
    async fn test_chat_continuation_replays_history() {
        let h = harness();

        let first = h.registry.call_tool("chat", json!({"prompt": "hello"})).await.unwrap();
        assert!(!first.is_error());
        let first_text = first.joined_text();
        assert!(first_text.starts_with("Echo: hello"));
        let id = trailer_value(&first_text, "continuation_id").expect("trailer carries the id");
        assert!(h.store.get(&id).is_some());

        let second = h
            .registry
            .call_tool("chat", json!({"prompt": "and again", "continuation_id": id}))
            .await
            .unwrap();
        assert_eq!(trailer_value(&second.joined_text(), "continuation_id").as_deref(), Some(id.as_str()));
        assert_eq!(trailer_value(&second.joined_text(), "turns").as_deref(), Some("2"));

        let sent = h.backend.last_request().unwrap().messages;
        assert!(sent.len() >= 3);
        let tail: Vec<(MessageRole, &str)> = sent[sent.len() - 3..]
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(tail[0], (MessageRole::User, "hello"));
        assert_eq!(tail[1].0, MessageRole::Assistant);
        assert!(tail[1].1.starts_with("Echo: hello"));
        assert_eq!(tail[2], (MessageRole::User, "and again"));
    }

    #[tokio::test]
    async fn test_chat_records_metadata() {
        let h = harness();
        let response = h
            .registry
            .call_tool("chat", json!({"prompt": "hi", "model": "mistral"}))
            .await
            .unwrap();
        let id = trailer_value(&response.joined_text(), "continuation_id").unwrap();
        let conversation = h.store.get(&id).unwrap();
        assert_eq!(conversation.metadata["tool"], "chat");
        assert_eq!(conversation.metadata["model"], "mistral");
        assert_eq!(conversation.metadata["turns"], 1);
        assert_eq!(h.backend.last_request().unwrap().model, "mistral");
    }

    #[tokio::test]
    async fn test_stale_continuation_starts_fresh() {
        let h = harness();
        let response = h
            .registry
            .call_tool("chat", json!({"prompt": "hi", "continuation_id": "does-not-exist"}))
            .await
            .unwrap();
        assert!(!response.is_error());
        let id = trailer_value(&response.joined_text(), "continuation_id").unwrap();
        assert_ne!(id, "does-not-exist");
        assert_eq!(h.store.get_messages(&id).len(), 3);
    }

    #[tokio::test]
    async fn test_validation_error_names_field_without_backend_call() {
        let h = harness();
        let mut args = step_args(0, None);
        args["step_number"] = json!(0);
        let response = h.registry.call_tool("debug", args).await.unwrap();
        assert!(response.is_error());
        assert!(response.joined_text().contains("step_number"));

        let response = h.registry.call_tool("chat", json!({})).await.unwrap();
        assert!(response.is_error());
        assert!(response.joined_text().contains("prompt"));

        assert_eq!(h.backend.request_count(), 0);
        assert_eq!(h.store.size(), 0);
    }

    #[tokio::test]
    async fn test_backend_error_is_tool_error_and_keeps_history_clean() {
        let h = harness_with(
            ServerConfig::default(),
            MockBackend::api_error(404, "model \"ghost\" not found", Arc::new(NoOpLogger)),
            Arc::new(NoOpLogger),
        );
        let response = h.registry.call_tool("chat", json!({"prompt": "hi"})).await.unwrap();
        assert!(response.is_error());
        assert!(response.joined_text().contains("404"));

        // conversation was created but nothing beyond the seed was appended
        let ids = h.store.ids();
        assert_eq!(ids.len(), 1);
        let messages = h.store.get_messages(&ids[0]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::System);
        assert!(!h.store.get(&ids[0]).unwrap().metadata.contains_key("turns"));
    }

    #[tokio::test]
    async fn test_mid_stream_failure_leaves_resumed_history_unchanged() {
        let backend = MockBackend::with_config(
            MockConfig {
                mode: MockMode::Error {
                    message: "runner died".to_string(),
                    delay_chunks: 2,
                },
                ..Default::default()
            },
            Arc::new(NoOpLogger),
        );
        let h = harness_with(ServerConfig::default(), backend, Arc::new(NoOpLogger));

        let id = h.store.create(
            vec![
                Message::system("seed"),
                Message::user("first question"),
                Message::assistant("first answer"),
            ],
            Metadata::new(),
        );
        let before = h.store.get(&id).unwrap();

        let response = h
            .registry
            .call_tool("chat", json!({"prompt": "second question", "continuation_id": id}))
            .await
            .unwrap();
        assert!(response.is_error());
        assert!(response.joined_text().contains("runner died"));

        // the backend saw the full history plus the new question
        assert_eq!(h.backend.last_request().unwrap().messages.len(), 4);
        assert_eq!(h.store.get(&id).unwrap(), before);
        assert_eq!(h.store.size(), 1);
    }

    #[tokio::test]
    async fn test_wrong_type_names_field() {
        let h = harness();

        let mut args = step_args(1, None);
        args["step_number"] = json!("two");
        let response = h.registry.call_tool("debug", args).await.unwrap();
        assert!(response.is_error());
        assert!(response.joined_text().contains("`step_number`"));

        let response = h.registry.call_tool("chat", json!({"prompt": 5})).await.unwrap();
        assert!(response.is_error());
        assert!(response.joined_text().contains("`prompt`"));

        let mut args = step_args(1, None);
        args["is_branch_point"] = json!("yes");
        let response = h.registry.call_tool("planner", args).await.unwrap();
        assert!(response.is_error());
        assert!(response.joined_text().contains("`is_branch_point`"));

        let mut args = step_args(2, None);
        args["models"] = json!([{"model": "llama3.2"}]);
        args["current_model_index"] = json!(-1);
        let response = h.registry.call_tool("consensus", args).await.unwrap();
        assert!(response.is_error());
        assert!(response.joined_text().contains("`current_model_index`"));

        assert_eq!(h.backend.request_count(), 0);
        assert_eq!(h.store.size(), 0);
    }

    #[tokio::test]
    async fn test_non_streaming_path() {
        let config = ServerConfig {
            stream: false,
            default_temperature: Some(0.3),
            ..Default::default()
        };
        let h = harness_with(config, MockBackend::fixed("Plain reply", Arc::new(NoOpLogger)), Arc::new(NoOpLogger));
        let response = h.registry.call_tool("chat", json!({"prompt": "hi"})).await.unwrap();
        assert!(response.joined_text().starts_with("Plain reply"));
        assert_eq!(h.backend.last_request().unwrap().options.temperature, Some(0.3));

        h.registry
            .call_tool("chat", json!({"prompt": "hi", "temperature": 1.2}))
            .await
            .unwrap();
        assert_eq!(h.backend.last_request().unwrap().options.temperature, Some(1.2));
    }

    #[tokio::test]
    async fn test_debug_steps_share_conversation() {
        let h = harness();
        let first = h.registry.call_tool("debug", step_args(1, None)).await.unwrap();
        let text = first.joined_text();
        assert_eq!(trailer_value(&text, "tool").as_deref(), Some("debug"));
        assert_eq!(trailer_value(&text, "step").as_deref(), Some("1/3"));
        assert_eq!(trailer_value(&text, "next_step_required").as_deref(), Some("true"));
        let id = trailer_value(&text, "continuation_id").unwrap();

        let sent = h.backend.last_request().unwrap();
        assert!(sent.last_user_content().unwrap().contains("first step"));

        let mut args = step_args(2, Some(&id));
        args["next_step_required"] = json!(false);
        args["hypothesis"] = json!("shared temp dir");
        args["confidence"] = json!("high");
        let second = h.registry.call_tool("debug", args).await.unwrap();
        let text = second.joined_text();
        assert_eq!(trailer_value(&text, "continuation_id").as_deref(), Some(id.as_str()));
        assert_eq!(trailer_value(&text, "confidence").as_deref(), Some("high"));
        assert_eq!(trailer_value(&text, "hypothesis").as_deref(), Some("shared temp dir"));

        let prompt = h.backend.last_request().unwrap().last_user_content().unwrap().to_string();
        assert!(prompt.contains("final step"));
        assert!(prompt.contains("root cause"));
        assert_eq!(h.store.get(&id).unwrap().turn_count(), 2);
    }

    #[tokio::test]
    async fn test_planner_branch_is_named() {
        let h = harness();
        let mut args = step_args(3, None);
        args["is_branch_point"] = json!(true);
        args["branch_id"] = json!("alt-1");
        args["branch_from_step"] = json!(2);

        let response = h.registry.call_tool("planner", args).await.unwrap();
        let text = response.joined_text();
        assert_eq!(trailer_value(&text, "step_kind").as_deref(), Some("branch"));
        assert_eq!(trailer_value(&text, "branch_id").as_deref(), Some("alt-1"));
        assert_eq!(trailer_value(&text, "branch_from_step").as_deref(), Some("2"));

        let prompt = h.backend.last_request().unwrap().last_user_content().unwrap().to_string();
        assert!(prompt.contains("branch 'alt-1' from step 2"));
    }

    #[tokio::test]
    async fn test_planner_revision_marker_requires_target() {
        let h = harness();
        let mut args = step_args(3, None);
        args["is_step_revision"] = json!(true);
        let response = h.registry.call_tool("planner", args).await.unwrap();
        assert!(response.is_error());
        assert!(response.joined_text().contains("revises_step_number"));
        assert_eq!(h.backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_consensus_consults_indexed_participant() {
        let h = harness();
        let mut args = step_args(2, None);
        args["models"] = json!([
            {"model": "llama3.2", "stance": "for"},
            {"model": "mistral", "stance": "against"}
        ]);
        args["current_model_index"] = json!(0);

        let response = h.registry.call_tool("consensus", args.clone()).await.unwrap();
        let text = response.joined_text();
        assert_eq!(h.backend.last_request().unwrap().model, "llama3.2");
        assert_eq!(trailer_value(&text, "phase").as_deref(), Some("consulting"));
        assert_eq!(trailer_value(&text, "consulted_model").as_deref(), Some("llama3.2"));
        assert_eq!(trailer_value(&text, "stance").as_deref(), Some("supportive"));
        assert_eq!(trailer_value(&text, "next_model_index").as_deref(), Some("1"));

        args["step_number"] = json!(3);
        args["current_model_index"] = json!(1);
        h.registry.call_tool("consensus", args.clone()).await.unwrap();
        assert_eq!(h.backend.last_request().unwrap().model, "mistral");

        args["step_number"] = json!(4);
        args["current_model_index"] = json!(2);
        args["model"] = json!("qwen2.5");
        let response = h.registry.call_tool("consensus", args).await.unwrap();
        assert_eq!(h.backend.last_request().unwrap().model, "qwen2.5");
        assert_eq!(trailer_value(&response.joined_text(), "phase").as_deref(), Some("synthesizing"));
    }

    #[tokio::test]
    async fn test_consensus_requires_models() {
        let h = harness();
        let mut args = step_args(1, None);
        args["models"] = json!([]);
        let response = h.registry.call_tool("consensus", args).await.unwrap();
        assert!(response.is_error());
        assert!(response.joined_text().contains("models"));
    }

    #[tokio::test]
    async fn test_codereview_counts_issues() {
        let h = harness();
        let mut args = step_args(2, None);
        args["review_type"] = json!("security");
        args["issues_found"] = json!([
            {"severity": "high", "description": "unchecked input"},
            {"severity": "low", "description": "typo"}
        ]);
        let response = h.registry.call_tool("codereview", args).await.unwrap();
        let text = response.joined_text();
        assert_eq!(trailer_value(&text, "review_type").as_deref(), Some("security"));
        assert_eq!(
            trailer_value(&text, "issues").as_deref(),
            Some("critical=0 high=1 medium=0 low=1")
        );
        let prompt = h.backend.last_request().unwrap().last_user_content().unwrap().to_string();
        assert!(prompt.contains("[high] unchecked input"));
    }

    #[tokio::test]
    async fn test_precommit_reports_path() {
        let h = harness();
        let mut args = step_args(1, None);
        args["path"] = json!("/repo");
        args["next_step_required"] = json!(false);
        let response = h.registry.call_tool("precommit", args).await.unwrap();
        let text = response.joined_text();
        assert_eq!(trailer_value(&text, "path").as_deref(), Some("/repo"));
        let prompt = h.backend.last_request().unwrap().last_user_content().unwrap().to_string();
        assert!(prompt.contains("verdict"));
    }

    #[tokio::test]
    async fn test_listmodels_and_version() {
        let h = harness();
        let models = h.registry.call_tool("listmodels", Value::Null).await.unwrap();
        assert!(models.joined_text().contains("llama3.2:latest"));
        assert!(models.joined_text().contains("(default)"));

        h.registry.call_tool("chat", json!({"prompt": "hi"})).await.unwrap();
        let version = h.registry.call_tool("version", json!({})).await.unwrap();
        let text = version.joined_text();
        assert!(text.starts_with("ollama-mcp "));
        assert!(text.contains("default_model: llama3.2"));
        assert!(text.contains("conversations: 1/100"));
        assert!(text.contains("tools: chat, debug"));
        assert_eq!(h.backend.request_count(), 1);
    }
}
