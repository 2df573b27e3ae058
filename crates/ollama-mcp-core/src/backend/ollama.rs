//! HTTP client for a local Ollama server

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use std::sync::Arc;

use super::error::{BackendError, BackendResult};
use super::ndjson::decode_chat_stream;
use super::traits::{ChatRequest, ChatResponse, ChunkStream, InferenceBackend};
use super::wire::{WireChatChunk, WireChatRequest, WireError, WireTags};
use crate::logging::Logger;
use crate::types::ModelInfo;
use crate::{log_debug, log_warn};

/// Ollama backend speaking `/api/tags` and `/api/chat`
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    logger: Arc<dyn Logger>,
}

impl OllamaClient {
    /// Create a client for `base_url` (already normalized, no trailing slash)
    pub fn new(base_url: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, logger)
    }

    /// Create with a preconfigured reqwest client
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            logger,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, mapping transport failures and non-success statuses
    async fn send(&self, builder: RequestBuilder) -> BackendResult<Response> {
        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                BackendError::unreachable(&self.base_url, e.to_string())
            } else {
                BackendError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log_warn!(self.logger, "[OllamaClient] HTTP {} from backend", status.as_u16());
            return Err(api_error(status, &body));
        }
        Ok(response)
    }

    fn chat_builder(&self, request: &ChatRequest, stream: bool) -> RequestBuilder {
        let body = WireChatRequest::new(&request.model, &request.messages, &request.options, stream);
        self.http.post(self.endpoint("/api/chat")).json(&body)
    }
}

/// Build an API error from a status and its body
///
/// Prefers Ollama's `{"error": ...}` message, then the raw body, then the
/// canonical status reason.
fn api_error(status: StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<WireError>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.trim().to_string());
    let message = if message.is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_string()
    } else {
        message
    };
    BackendError::api(status.as_u16(), message)
}

#[async_trait]
impl InferenceBackend for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list_models(&self) -> BackendResult<Vec<ModelInfo>> {
        self.logger.debug("[OllamaClient] GET /api/tags");
        let response = self.send(self.http.get(self.endpoint("/api/tags"))).await?;
        let body = response.text().await?;
        let tags: WireTags = serde_json::from_str(&body)?;
        Ok(tags.models)
    }

    async fn chat(&self, request: ChatRequest) -> BackendResult<ChatResponse> {
        log_debug!(
            self.logger,
            "[OllamaClient] POST /api/chat model={} messages={} stream=false",
            request.model,
            request.messages.len(),
        );
        let response = self.send(self.chat_builder(&request, false)).await?;
        let body = response.text().await?;
        let reply: WireChatChunk = serde_json::from_str(&body)?;

        if let Some(error) = reply.error {
            return Err(BackendError::invalid_response(error));
        }
        let content = match &reply.message {
            Some(message) => message.content.clone(),
            None => return Err(BackendError::invalid_response("reply has no message")),
        };

        Ok(ChatResponse {
            model: if reply.model.is_empty() { request.model } else { reply.model },
            content,
            eval_count: reply.eval_count,
            prompt_eval_count: reply.prompt_eval_count,
            total_duration: reply.total_duration,
        })
    }

    async fn chat_stream(&self, request: ChatRequest) -> BackendResult<ChunkStream> {
        log_debug!(
            self.logger,
            "[OllamaClient] POST /api/chat model={} messages={} stream=true",
            request.model,
            request.messages.len(),
        );
        let response = self.send(self.chat_builder(&request, true)).await?;
        Ok(decode_chat_stream(response.bytes_stream(), Arc::clone(&self.logger)))
    }
}
