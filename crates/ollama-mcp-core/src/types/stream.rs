//! Streaming response types

use serde::{Deserialize, Serialize};

/// One partial piece of a streamed chat reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Text appended by this chunk (may be empty on the final chunk)
    pub text: String,
    /// Whether the backend marked this as the last chunk
    #[serde(default)]
    pub done: bool,
}

impl StreamChunk {
    /// Create an intermediate text chunk
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }

    /// Create the terminating chunk
    pub fn last(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: true,
        }
    }

    /// Check if this chunk carries any text
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
