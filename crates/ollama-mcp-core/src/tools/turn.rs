//! Single conversational turn shared by every model-backed tool

use serde_json::json;

use super::error::ToolResult;
use super::handler::ToolContext;
use crate::backend::{collect_reply, ChatRequest};
use crate::conversation::Metadata;
use crate::types::{ChatOptions, Message};
use crate::workflow::{resolve_conversation, Resolution};
use crate::log_debug;

/// One outbound message and where to send it
#[derive(Debug, Clone)]
pub struct Turn<'a> {
    pub tool: &'a str,
    /// Seeds a new conversation; ignored when one is resumed
    pub system_prompt: &'a str,
    pub continuation_id: Option<&'a str>,
    /// Model override, else the configured default
    pub model: Option<&'a str>,
    /// Temperature override, else the configured default
    pub temperature: Option<f32>,
    pub user_message: String,
}

/// Result of a completed turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub continuation_id: String,
    pub resumed: bool,
    pub model: String,
    pub reply: String,
    /// Completed exchanges in the conversation after this turn
    pub turns: usize,
}

/// Resolve the conversation, call the backend once, then record the exchange
///
/// The store is only written after the full reply is assembled; a backend
/// failure leaves the history as it was.
pub async fn run_turn(ctx: &ToolContext, turn: Turn<'_>) -> ToolResult<TurnOutcome> {
    let mut metadata = Metadata::new();
    metadata.insert("tool".to_string(), json!(turn.tool));
    let Resolution { id, resumed } = resolve_conversation(
        &ctx.store,
        turn.continuation_id,
        vec![Message::system(turn.system_prompt)],
        metadata,
        ctx.logger.as_ref(),
    );

    let model = ctx.resolve_model(turn.model);
    let user = Message::user(turn.user_message);
    let mut history = ctx.store.get_messages(&id);
    history.push(user.clone());

    let options = match turn.temperature.or(ctx.config.default_temperature) {
        Some(temperature) => ChatOptions::new().with_temperature(temperature),
        None => ChatOptions::new(),
    };
    let request = ChatRequest::new(model.clone(), history).with_options(options);

    log_debug!(
        ctx.logger,
        "[{}] Sending {} messages to {} (conversation {}, stream={})",
        turn.tool,
        request.messages.len(),
        model,
        id,
        ctx.config.stream,
    );

    let reply = if ctx.config.stream {
        collect_reply(ctx.backend.chat_stream(request).await?).await?
    } else {
        ctx.backend.chat(request).await?.content
    };

    ctx.store.add_message(&id, user);
    ctx.store.add_message(&id, Message::assistant(reply.clone()));

    let turns = ctx.store.get(&id).map(|c| c.turn_count()).unwrap_or(0);
    let mut update = Metadata::new();
    update.insert("tool".to_string(), json!(turn.tool));
    update.insert("model".to_string(), json!(model));
    update.insert("turns".to_string(), json!(turns));
    ctx.store.update_metadata(&id, update);

    Ok(TurnOutcome {
        continuation_id: id,
        resumed,
        model,
        reply,
        turns,
    })
}
