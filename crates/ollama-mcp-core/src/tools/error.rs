//! Tool error types

use thiserror::Error;

use crate::backend::BackendError;
use crate::types::ToolResponse;
use crate::workflow::InvalidStep;

/// Errors raised while dispatching or running a tool
#[derive(Error, Debug)]
pub enum ToolError {
    /// No enabled tool with this name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments failed to parse or validate
    #[error("Invalid arguments{}: {message}", describe_field(.field.as_deref()))]
    InvalidArguments {
        field: Option<String>,
        message: String,
    },

    /// Inference backend failure
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_field(field: Option<&str>) -> String {
    field.map(|f| format!(" for `{}`", f)).unwrap_or_default()
}

impl ToolError {
    /// Create an invalid arguments error naming `field`
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Build from a deserialization failure
    ///
    /// `field` is the located field, if any; otherwise the name is recovered
    /// from serde's "missing field `x`" message.
    pub fn from_parse(err: serde_json::Error, field: Option<String>) -> Self {
        let message = err.to_string();
        let field = field.or_else(|| {
            message
                .split('`')
                .nth(1)
                .filter(|_| message.starts_with("missing field"))
                .map(str::to_string)
        });
        Self::InvalidArguments { field, message }
    }

    /// Render as a tool-level error response
    pub fn to_response(&self) -> ToolResponse {
        ToolResponse::error(self.to_string())
    }
}

impl From<InvalidStep> for ToolError {
    fn from(err: InvalidStep) -> Self {
        Self::InvalidArguments {
            field: Some(err.field),
            message: err.message,
        }
    }
}

pub type ToolResult<T> = Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Args {
        prompt: String,
    }

    #[test]
    fn test_missing_field_is_named() {
        let err = serde_json::from_value::<Args>(serde_json::json!({})).unwrap_err();
        match ToolError::from_parse(err, None) {
            ToolError::InvalidArguments { field, message } => {
                assert_eq!(field.as_deref(), Some("prompt"));
                assert!(message.contains("missing field"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_located_field_wins() {
        let err = serde_json::from_value::<Args>(serde_json::json!({"prompt": 5})).unwrap_err();
        let err = ToolError::from_parse(err, Some("prompt".to_string()));
        assert!(err.to_string().starts_with("Invalid arguments for `prompt`: invalid type"));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ToolError::invalid("models", "must not be empty").to_string(),
            "Invalid arguments for `models`: must not be empty"
        );
        assert!(ToolError::invalid("step", "x").to_response().is_error());

        let err: ToolError = BackendError::api(404, "model not found").into();
        assert_eq!(err.to_string(), "Ollama API error (404): model not found");
    }
}
