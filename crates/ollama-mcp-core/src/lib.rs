//! ollama-mcp core
//!
//! Runtime-agnostic building blocks of an MCP tool server backed by a local
//! Ollama instance. The binary crate only adds the stdio transport.
//!
//! ## Conversation continuity
//!
//! Tool calls are stateless; the `ConversationStore` stitches them into
//! dialogues keyed by a continuation id that every reply carries back.
//!
//! ```rust,ignore
//! use ollama_mcp_core::{ServerConfig, ToolContext, ToolRegistry};
//!
//! let config = Arc::new(ServerConfig::load()?);
//! let store = Arc::new(ConversationStore::new(config.store_limits(), logger.clone()));
//! let backend = create_backend(&config, logger.clone());
//! let registry = ToolRegistry::new(ToolContext::new(store, backend, config, logger));
//!
//! let reply = registry.call_tool("chat", json!({"prompt": "hello"})).await?;
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod backend;
pub mod conversation;
pub mod workflow;
pub mod tools;

// Re-export commonly used types
pub use types::{
    ChatOptions, Message, MessageRole, ModelDetails, ModelInfo, StreamChunk, ToolContent,
    ToolResponse,
};

pub use logging::{ConsoleLogger, FileLogger, LogLevel, Logger, MemoryLogger, NoOpLogger, SharedLogger};

pub use config::{ConfigError, ConfigResult, EnvSource, MemoryEnv, ProcessEnv, ServerConfig};

pub use backend::{
    create_backend, BackendError, BackendResult, ChatRequest, ChatResponse, InferenceBackend,
    MockBackend, OllamaClient,
};

pub use conversation::{Clock, Conversation, ConversationStore, Metadata, StoreLimits, SystemClock};

pub use workflow::{ConsensusPhase, ResponseTrailer, StepFields, StepKind};

pub use tools::{ToolContext, ToolError, ToolHandler, ToolInfo, ToolRegistry};
