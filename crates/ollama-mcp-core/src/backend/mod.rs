//! Inference backend
//!
//! The `InferenceBackend` trait is the seam between tools and the model
//! server. `OllamaClient` talks to Ollama's native `/api/tags` and
//! `/api/chat` endpoints (NDJSON when streaming); `MockBackend` answers
//! deterministically and records every request.

mod error;
mod mock;
mod ndjson;
mod ollama;
mod traits;
mod wire;

pub use error::{BackendError, BackendResult};
pub use mock::{MockBackend, MockConfig, MockMode};
pub use ndjson::decode_chat_stream;
pub use ollama::OllamaClient;
pub use traits::{collect_reply, ChatRequest, ChatResponse, ChunkStream, InferenceBackend};

use crate::config::ServerConfig;
use crate::logging::Logger;
use std::sync::Arc;
use crate::log_info;

/// Create the backend selected by the configuration
///
/// `OLLAMA_HOST=mock` yields an echoing `MockBackend`; anything else is an
/// `OllamaClient` pointed at the configured host.
pub fn create_backend(config: &ServerConfig, logger: Arc<dyn Logger>) -> Arc<dyn InferenceBackend> {
    if config.uses_mock_backend() {
        logger.info("[backend] Using mock backend");
        Arc::new(MockBackend::echo(logger))
    } else {
        log_info!(logger, "[backend] Using Ollama at {}", config.ollama_host);
        Arc::new(OllamaClient::new(config.ollama_host.clone(), logger))
    }
}
