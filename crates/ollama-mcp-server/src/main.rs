//! `ollama-mcp`: MCP stdio server backed by a local Ollama instance
//!
//! stdout carries the protocol; all logging goes to stderr or to the file
//! named by `OLLAMA_MCP_LOG_FILE`.

mod handler;

use std::path::PathBuf;
use std::sync::Arc;

use ollama_mcp_core::{
    create_backend, ConfigError, ConsoleLogger, ConversationStore, FileLogger, Logger, ServerConfig,
    ToolContext, ToolRegistry,
};
use rmcp::{transport::stdio, ServiceExt};
use thiserror::Error;

use handler::OllamaMcpServer;
use ollama_mcp_core::log_info;

#[derive(Error, Debug)]
enum ServerError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("cannot open log file {path:?}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("MCP transport error: {0}")]
    Transport(String),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("[ollama-mcp] fatal: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;
    let logger = build_logger(&config)?;

    log_info!(
        logger,
        "[ollama-mcp] Starting: host={} model={} stream={} max_conversations={} retention={}h",
        config.ollama_host,
        config.default_model,
        config.stream,
        config.max_conversations,
        config.conversation_timeout.as_secs() / 3600,
    );

    let config = Arc::new(config);
    let store = Arc::new(ConversationStore::new(config.store_limits(), Arc::clone(&logger)));
    let backend = create_backend(&config, Arc::clone(&logger));
    let registry = Arc::new(ToolRegistry::new(ToolContext::new(
        store,
        backend,
        Arc::clone(&config),
        Arc::clone(&logger),
    )));

    let service = OllamaMcpServer::new(registry)
        .serve(stdio())
        .await
        .map_err(|e| ServerError::Transport(e.to_string()))?;
    logger.info("[ollama-mcp] Serving MCP over stdio");

    let reason = service
        .waiting()
        .await
        .map_err(|e| ServerError::Transport(e.to_string()))?;
    log_info!(logger, "[ollama-mcp] Stopped: {:?}", reason);
    Ok(())
}

fn build_logger(config: &ServerConfig) -> Result<Arc<dyn Logger>, ServerError> {
    match &config.log_file {
        Some(path) => {
            let logger = FileLogger::open(path, config.log_level).map_err(|source| ServerError::LogFile {
                path: path.clone(),
                source,
            })?;
            Ok(Arc::new(logger))
        }
        None => Ok(Arc::new(ConsoleLogger::new().with_level(config.log_level))),
    }
}
