//! Inference backend trait definition

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

use super::error::BackendResult;
use crate::types::{ChatOptions, Message, ModelInfo, StreamChunk};

/// One chat completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Model name as known to the backend
    pub model: String,
    /// Full history, replayed verbatim
    pub messages: Vec<Message>,
    /// Sampling options (omitted on the wire when empty)
    pub options: ChatOptions,
}

impl ChatRequest {
    /// Create a request with default options
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    /// Set sampling options
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Content of the last user message, if any
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::types::MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// A complete (non-streamed) chat reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    /// Model that produced the reply
    pub model: String,
    /// Assistant text
    pub content: String,
    /// Tokens generated
    pub eval_count: Option<u64>,
    /// Tokens in the prompt
    pub prompt_eval_count: Option<u64>,
    /// Total time in nanoseconds
    pub total_duration: Option<u64>,
}

/// Type alias for the streaming response
pub type ChunkStream = Pin<Box<dyn Stream<Item = BackendResult<StreamChunk>> + Send>>;

/// Inference backend abstraction
///
/// `OllamaClient` talks HTTP; `MockBackend` is deterministic and offline.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Backend name (e.g., "ollama", "mock")
    fn name(&self) -> &str;

    /// Base URL requests are sent to
    fn base_url(&self) -> &str;

    /// List locally available models
    async fn list_models(&self) -> BackendResult<Vec<ModelInfo>>;

    /// Run a chat completion and wait for the whole reply
    async fn chat(&self, request: ChatRequest) -> BackendResult<ChatResponse>;

    /// Run a chat completion as a lazy stream of chunks
    async fn chat_stream(&self, request: ChatRequest) -> BackendResult<ChunkStream>;
}

/// Concatenate a chunk stream into the full reply
///
/// Stops at the first error or at the chunk flagged `done`.
pub async fn collect_reply(mut stream: ChunkStream) -> BackendResult<String> {
    let mut reply = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        reply.push_str(&chunk.text);
        if chunk.done {
            break;
        }
    }
    Ok(reply)
}
