//! Ollama HTTP wire shapes

use serde::{Deserialize, Serialize};

use crate::types::{ChatOptions, Message, ModelInfo};

/// Body of `POST /api/chat`
#[derive(Debug, Serialize)]
pub(crate) struct WireChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<&'a ChatOptions>,
}

impl<'a> WireChatRequest<'a> {
    pub fn new(model: &'a str, messages: &'a [Message], options: &'a ChatOptions, stream: bool) -> Self {
        Self {
            model,
            messages,
            stream,
            options: if options.is_empty() { None } else { Some(options) },
        }
    }
}

/// A full `/api/chat` reply, or one line of a streamed reply
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireChatChunk {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub message: Option<WireMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub total_duration: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    /// Present when the backend fails mid-stream
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireMessage {
    #[serde(default)]
    pub content: String,
}

impl WireChatChunk {
    pub fn content(&self) -> &str {
        self.message.as_ref().map(|m| m.content.as_str()).unwrap_or("")
    }
}

/// Reply of `GET /api/tags`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireTags {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// Error body (`{"error": "..."}`) sent with non-success statuses
#[derive(Debug, Deserialize)]
pub(crate) struct WireError {
    pub error: String,
}
