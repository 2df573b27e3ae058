//! Backend error types

use thiserror::Error;

/// Errors that can occur while talking to the inference backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection could not be established
    #[error("Cannot reach Ollama at {url}: {message}")]
    Unreachable { url: String, message: String },

    /// Backend answered with a non-success status
    #[error("Ollama API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network/HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport I/O error while reading a stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend reported an error in the middle of a stream
    #[error("Stream error: {0}")]
    Stream(String),

    /// Response body did not have the expected shape
    #[error("Invalid response from Ollama: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Create an API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an unreachable error
    pub fn unreachable(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unreachable {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a stream error
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream(message.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}

pub type BackendResult<T> = Result<T, BackendError>;
