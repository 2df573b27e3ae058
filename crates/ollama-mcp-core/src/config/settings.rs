//! Resolved server configuration
//!
//! Source priority (later sources override earlier):
//! 1. Built-in defaults
//! 2. YAML config file
//! 3. Environment variables

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::file::ConfigFile;
use super::traits::{ConfigError, ConfigResult, EnvSource, ProcessEnv};
use crate::conversation::StoreLimits;
use crate::logging::{FileLogger, LogLevel};

pub const ENV_CONFIG_FILE: &str = "OLLAMA_MCP_CONFIG";
pub const ENV_OLLAMA_HOST: &str = "OLLAMA_HOST";
pub const ENV_DEFAULT_MODEL: &str = "DEFAULT_MODEL";
pub const ENV_DISABLED_TOOLS: &str = "DISABLED_TOOLS";
pub const ENV_MAX_CONVERSATIONS: &str = "MAX_CONVERSATIONS";
pub const ENV_CONVERSATION_TIMEOUT_HOURS: &str = "CONVERSATION_TIMEOUT_HOURS";
pub const ENV_STREAM: &str = "OLLAMA_STREAM";
pub const ENV_DEFAULT_TEMPERATURE: &str = "DEFAULT_TEMPERATURE";
pub const ENV_LOG_LEVEL: &str = "OLLAMA_MCP_LOG_LEVEL";
pub const ENV_LOG_FILE: &str = "OLLAMA_MCP_LOG_FILE";

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_MAX_CONVERSATIONS: usize = 100;
pub const DEFAULT_TIMEOUT_HOURS: u64 = 24;

/// Host value that selects the in-process mock backend
pub const MOCK_HOST: &str = "mock";

/// Everything the server reads once at start-up
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Ollama base URL, normalized (scheme present, no trailing slash)
    pub ollama_host: String,
    /// Model used when a tool call does not name one
    pub default_model: String,
    /// Lower-cased tool names hidden from the host
    pub disabled_tools: Vec<String>,
    /// Capacity bound of the conversation store (at least 1)
    pub max_conversations: usize,
    /// Retention window of the conversation store
    pub conversation_timeout: Duration,
    /// Use `stream: true` on `/api/chat`
    pub stream: bool,
    pub default_temperature: Option<f32>,
    pub log_level: LogLevel,
    /// When set, logs go to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            disabled_tools: Vec::new(),
            max_conversations: DEFAULT_MAX_CONVERSATIONS,
            conversation_timeout: Duration::from_secs(DEFAULT_TIMEOUT_HOURS * 3600),
            stream: true,
            default_temperature: None,
            log_level: LogLevel::Info,
            log_file: None,
        }
    }
}

impl ServerConfig {
    /// Load from the process environment (and the config file it points to)
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&ProcessEnv)
    }

    /// Load using an explicit environment source
    pub fn load_from(env: &dyn EnvSource) -> ConfigResult<Self> {
        let path = env
            .get(ENV_CONFIG_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(ConfigFile::default_path);

        let mut config = Self::default();
        if let Some(file) = ConfigFile::load(&path)? {
            config.apply_file(file)?;
        }
        config.apply_env(env)?;
        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile) -> ConfigResult<()> {
        if let Some(host) = file.ollama_host {
            self.ollama_host = normalize_host(&host);
        }
        if let Some(model) = file.default_model {
            self.default_model = model;
        }
        if let Some(tools) = file.disabled_tools {
            self.disabled_tools = normalize_tool_names(tools);
        }
        if let Some(max) = file.max_conversations {
            self.max_conversations = max.max(1);
        }
        if let Some(hours) = file.conversation_timeout_hours {
            self.conversation_timeout = retention_window("conversation_timeout_hours", hours)?;
        }
        if let Some(stream) = file.stream {
            self.stream = stream;
        }
        if let Some(temp) = file.default_temperature {
            self.default_temperature = Some(check_temperature("default_temperature", temp)?);
        }
        if let Some(level) = file.log_level {
            self.log_level = parse_level("log_level", &level)?;
        }
        if let Some(path) = file.log_file {
            self.log_file = Some(log_file_path(&path.to_string_lossy()));
        }
        Ok(())
    }

    fn apply_env(&mut self, env: &dyn EnvSource) -> ConfigResult<()> {
        if let Some(host) = env.get(ENV_OLLAMA_HOST) {
            self.ollama_host = normalize_host(&host);
        }
        if let Some(model) = env.get(ENV_DEFAULT_MODEL) {
            self.default_model = model.trim().to_string();
        }
        if let Some(raw) = env.get(ENV_DISABLED_TOOLS) {
            self.disabled_tools = normalize_tool_names(raw.split(',').map(str::to_string));
        }
        if let Some(raw) = env.get(ENV_MAX_CONVERSATIONS) {
            let max: usize = parse_number(ENV_MAX_CONVERSATIONS, &raw)?;
            self.max_conversations = max.max(1);
        }
        if let Some(raw) = env.get(ENV_CONVERSATION_TIMEOUT_HOURS) {
            let hours: u64 = parse_number(ENV_CONVERSATION_TIMEOUT_HOURS, &raw)?;
            self.conversation_timeout = retention_window(ENV_CONVERSATION_TIMEOUT_HOURS, hours)?;
        }
        if let Some(raw) = env.get(ENV_STREAM) {
            self.stream = parse_bool(ENV_STREAM, &raw)?;
        }
        if let Some(raw) = env.get(ENV_DEFAULT_TEMPERATURE) {
            let temp: f32 = parse_number(ENV_DEFAULT_TEMPERATURE, &raw)?;
            self.default_temperature = Some(check_temperature(ENV_DEFAULT_TEMPERATURE, temp)?);
        }
        if let Some(raw) = env.get(ENV_LOG_LEVEL) {
            self.log_level = parse_level(ENV_LOG_LEVEL, &raw)?;
        }
        if let Some(raw) = env.get(ENV_LOG_FILE) {
            self.log_file = Some(log_file_path(&raw));
        }
        Ok(())
    }

    /// Limits for the conversation store
    pub fn store_limits(&self) -> StoreLimits {
        StoreLimits::new(self.max_conversations, self.conversation_timeout)
    }

    /// Whether the host asked to hide `tool`
    pub fn is_tool_disabled(&self, tool: &str) -> bool {
        let tool = tool.to_lowercase();
        self.disabled_tools.iter().any(|t| *t == tool)
    }

    /// Whether the mock backend should be used instead of HTTP
    pub fn uses_mock_backend(&self) -> bool {
        self.ollama_host == MOCK_HOST
    }
}

/// Add a scheme when missing and drop trailing slashes
///
/// `OLLAMA_HOST` is commonly set to `0.0.0.0:11434` for the Ollama server
/// itself, so a bare `host:port` must still work as a client URL.
pub fn normalize_host(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.eq_ignore_ascii_case(MOCK_HOST) {
        return MOCK_HOST.to_string();
    }
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

fn normalize_tool_names(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        let name = name.trim().to_lowercase();
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, raw, e.to_string()))
}

fn parse_bool(key: &str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, raw, "expected true or false")),
    }
}

fn retention_window(key: &str, hours: u64) -> ConfigResult<Duration> {
    hours
        .checked_mul(3600)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::invalid(key, &hours.to_string(), "too large"))
}

/// A truthy flag selects the default debug file, anything else is a path
fn log_file_path(raw: &str) -> PathBuf {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => FileLogger::default_path(),
        _ => PathBuf::from(raw.trim()),
    }
}

fn parse_level(key: &str, raw: &str) -> ConfigResult<LogLevel> {
    LogLevel::parse(raw)
        .ok_or_else(|| ConfigError::invalid(key, raw, "expected debug, info, warn or error"))
}

fn check_temperature(key: &str, temp: f32) -> ConfigResult<f32> {
    if temp.is_finite() && (0.0..=2.0).contains(&temp) {
        Ok(temp)
    } else {
        Err(ConfigError::invalid(key, &temp.to_string(), "must be between 0.0 and 2.0"))
    }
}
