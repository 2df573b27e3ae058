//! Mock backend for testing
//!
//! Deterministic, configurable replies without a running Ollama. Every chat
//! request is recorded so tests can assert on the exact outbound history.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use super::error::{BackendError, BackendResult};
use super::traits::{ChatRequest, ChatResponse, ChunkStream, InferenceBackend};
use crate::logging::Logger;
use crate::types::{ModelDetails, ModelInfo, StreamChunk};
use crate::log_debug;

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Return a fixed response
    Fixed(String),
    /// Return response as specific chunks
    Chunks(Vec<String>),
    /// Fail mid-stream after `delay_chunks` chunks
    Error { message: String, delay_chunks: usize },
    /// Fail as if the server answered with a non-success status
    ApiError { status: u16, message: String },
    /// Return nothing (empty response)
    Empty,
}

/// Configuration for the mock backend
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Response mode
    pub mode: MockMode,
    /// Delay between chunks in milliseconds (0 = no delay)
    pub chunk_delay_ms: u64,
    /// Size of each chunk when splitting fixed/echo responses
    pub chunk_size: usize,
    /// Models reported by `list_models`
    pub models: Vec<ModelInfo>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            mode: MockMode::Echo,
            chunk_delay_ms: 0,
            chunk_size: 10,
            models: default_models(),
        }
    }
}

fn default_models() -> Vec<ModelInfo> {
    let model = |name: &str, params: &str, size: u64| ModelInfo {
        size,
        details: ModelDetails {
            format: Some("gguf".to_string()),
            family: Some("mock".to_string()),
            parameter_size: Some(params.to_string()),
            quantization_level: Some("Q4_K_M".to_string()),
            ..Default::default()
        },
        ..ModelInfo::named(name)
    };
    vec![
        model("llama3.2:latest", "3.2B", 2_019_393_189),
        model("mistral:latest", "7.2B", 4_113_301_824),
    ]
}

/// Mock inference backend
pub struct MockBackend {
    config: MockConfig,
    requests: Mutex<Vec<ChatRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockBackend {
    /// Create with default config (echo mode)
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self::with_config(MockConfig::default(), logger)
    }

    /// Create with specific config
    pub fn with_config(config: MockConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Create an echo backend (echoes back the last user message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::new(logger)
    }

    /// Create a fixed response backend
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Fixed(response.into()), logger)
    }

    /// Create a chunked response backend
    pub fn chunked(chunks: Vec<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Chunks(chunks), logger)
    }

    /// Create a backend that fails mid-stream
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(
            MockMode::Error {
                message: message.into(),
                delay_chunks: 0,
            },
            logger,
        )
    }

    /// Create a backend that rejects every request with `status`
    pub fn api_error(status: u16, message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(
            MockMode::ApiError {
                status,
                message: message.into(),
            },
            logger,
        )
    }

    fn with_mode(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode,
                ..Default::default()
            },
            logger,
        )
    }

    /// Set chunk delay
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.config.chunk_delay_ms = delay_ms;
        self
    }

    /// Set chunk size for splitting responses
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Replace the advertised model list
    pub fn with_models(mut self, models: Vec<ModelInfo>) -> Self {
        self.config.models = models;
        self
    }

    /// Every chat request received so far, oldest first
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    /// The most recent chat request
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().last().cloned()
    }

    /// Number of chat requests received
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Record the request and work out the chunks to send back
    fn plan(&self, request: ChatRequest) -> BackendResult<Vec<BackendResult<String>>> {
        let chunks = match &self.config.mode {
            MockMode::Echo => {
                let text = request.last_user_content().unwrap_or("Hello from MockBackend!");
                log_debug!(self.logger, "[MockBackend] Echo mode, echoing {} chars", text.len());
                self.split_into_chunks(&format!("Echo: {}", text))
                    .into_iter()
                    .map(Ok)
                    .collect()
            }
            MockMode::Fixed(response) => {
                log_debug!(self.logger, "[MockBackend] Fixed mode, response len: {}", response.len());
                self.split_into_chunks(response).into_iter().map(Ok).collect()
            }
            MockMode::Chunks(chunks) => chunks.iter().cloned().map(Ok).collect(),
            MockMode::Empty => Vec::new(),
            MockMode::Error { message, delay_chunks } => {
                let mut chunks: Vec<BackendResult<String>> = (0..*delay_chunks)
                    .map(|i| Ok(format!("Chunk {} before error. ", i)))
                    .collect();
                chunks.push(Err(BackendError::stream(format!("Mock error: {}", message))));
                chunks
            }
            MockMode::ApiError { status, message } => {
                self.requests.lock().push(request);
                return Err(BackendError::api(*status, message.clone()));
            }
        };
        self.requests.lock().push(request);
        Ok(chunks)
    }

    /// Split text into chunks
    fn split_into_chunks(&self, text: &str) -> Vec<String> {
        if self.config.chunk_size == 0 || text.is_empty() {
            return vec![text.to_string()];
        }

        text.chars()
            .collect::<Vec<_>>()
            .chunks(self.config.chunk_size)
            .map(|c| c.iter().collect())
            .collect()
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn base_url(&self) -> &str {
        "mock://local"
    }

    async fn list_models(&self) -> BackendResult<Vec<ModelInfo>> {
        if let MockMode::ApiError { status, message } = &self.config.mode {
            return Err(BackendError::api(*status, message.clone()));
        }
        Ok(self.config.models.clone())
    }

    async fn chat(&self, request: ChatRequest) -> BackendResult<ChatResponse> {
        let model = request.model.clone();
        let chunks = self.plan(request)?;
        let content = chunks.into_iter().collect::<BackendResult<Vec<String>>>()?.concat();
        Ok(ChatResponse {
            model,
            eval_count: Some(content.split_whitespace().count() as u64),
            content,
            ..Default::default()
        })
    }

    async fn chat_stream(&self, request: ChatRequest) -> BackendResult<ChunkStream> {
        let chunks = self.plan(request)?;
        let delay_ms = self.config.chunk_delay_ms;
        let logger = self.logger.clone();

        let stream = stream::iter(chunks.into_iter().enumerate())
            .then(move |(i, chunk)| {
                let logger = logger.clone();
                async move {
                    // Apply delay (except for first chunk)
                    if i > 0 && delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                    let text = chunk?;
                    log_debug!(logger, "[MockBackend] Yielding chunk {}: '{}'", i, text);
                    Ok::<_, BackendError>(StreamChunk::text(text))
                }
            })
            .chain(stream::once(async { Ok::<_, BackendError>(StreamChunk::last("")) }));

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::collect_reply;
    use crate::logging::NoOpLogger;
    use crate::types::Message;

    fn test_logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger::new())
    }

    fn request(content: &str) -> ChatRequest {
        ChatRequest::new("llama3.2", vec![Message::user(content)])
    }

    #[tokio::test]
    async fn test_echo_mode() {
        let backend = MockBackend::echo(test_logger());
        let reply = backend.chat(request("Hello, world!")).await.unwrap();
        assert_eq!(reply.content, "Echo: Hello, world!");
        assert_eq!(reply.model, "llama3.2");
    }

    #[tokio::test]
    async fn test_fixed_mode_streams_whole_text() {
        let backend = MockBackend::fixed("This is a test response.", test_logger());
        let stream = backend.chat_stream(request("Anything")).await.unwrap();
        assert_eq!(collect_reply(stream).await.unwrap(), "This is a test response.");
    }

    #[tokio::test]
    async fn test_chunked_mode() {
        let chunks = vec!["First ".to_string(), "second ".to_string(), "third.".to_string()];
        let backend = MockBackend::chunked(chunks.clone(), test_logger());
        let mut stream = backend.chat_stream(request("Anything")).await.unwrap();

        let mut received = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.expect("chunk should succeed");
            if chunk.done {
                break;
            }
            received.push(chunk.text);
        }
        assert_eq!(received, chunks);
    }

    #[tokio::test]
    async fn test_error_mode() {
        let backend = MockBackend::error("Test error message", test_logger());
        let stream = backend.chat_stream(request("Anything")).await.unwrap();
        let err = collect_reply(stream).await.unwrap_err();
        assert!(err.to_string().contains("Test error message"));

        assert!(backend.chat(request("Anything")).await.is_err());
    }

    #[tokio::test]
    async fn test_api_error_mode_fails_before_streaming() {
        let backend = MockBackend::api_error(503, "Service Unavailable", test_logger());
        assert!(matches!(
            backend.chat_stream(request("x")).await,
            Err(BackendError::Api { status: 503, .. })
        ));
        assert!(backend.list_models().await.is_err());
    }

    #[tokio::test]
    async fn test_records_requests() {
        let backend = MockBackend::new(test_logger());
        backend.chat(request("one")).await.unwrap();
        backend.chat(request("two")).await.unwrap();

        assert_eq!(backend.request_count(), 2);
        assert_eq!(backend.last_request().unwrap().last_user_content(), Some("two"));
    }

    #[tokio::test]
    async fn test_default_models() {
        let backend = MockBackend::new(test_logger());
        let models = backend.list_models().await.unwrap();
        assert!(models.iter().any(|m| m.matches("llama3.2")));
    }

    #[test]
    fn test_chunk_splitting() {
        let backend = MockBackend::new(test_logger()).with_chunk_size(5);
        let chunks = backend.split_into_chunks("Hello, world!");
        assert_eq!(chunks, vec!["Hello", ", wor", "ld!"]);
    }
}
