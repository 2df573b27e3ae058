//! Model listing and generation option types

use serde::{Deserialize, Serialize};

/// A locally installed model, as reported by `GET /api/tags`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Display name, e.g. `llama3.2:latest`
    pub name: String,
    /// Model reference (usually equal to `name`)
    #[serde(default)]
    pub model: String,
    /// Last modification timestamp as sent by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    /// Size on disk in bytes
    #[serde(default)]
    pub size: u64,
    /// Content digest
    #[serde(default)]
    pub digest: String,
    /// Architecture details
    #[serde(default)]
    pub details: ModelDetails,
}

/// Architecture details of a model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDetails {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub families: Option<Vec<String>>,
    #[serde(default)]
    pub parameter_size: Option<String>,
    #[serde(default)]
    pub quantization_level: Option<String>,
}

impl ModelInfo {
    /// Create a model entry with just a name
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            model: name.clone(),
            name,
            ..Default::default()
        }
    }

    /// Whether this entry refers to `model`, ignoring an implicit `:latest` tag
    pub fn matches(&self, model: &str) -> bool {
        strip_latest(&self.name) == strip_latest(model)
    }
}

fn strip_latest(name: &str) -> &str {
    name.strip_suffix(":latest").unwrap_or(name)
}

/// Sampling options forwarded in the `options` object of `/api/chat`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

impl ChatOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set temperature
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// True when no option is set (the `options` object can be dropped)
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_info_from_tags_entry() {
        let json = r#"{
            "name": "llama3.2:latest",
            "model": "llama3.2:latest",
            "modified_at": "2024-10-01T12:00:00Z",
            "size": 2019393189,
            "digest": "a80c4f17acd5",
            "details": {"format": "gguf", "family": "llama", "parameter_size": "3.2B", "quantization_level": "Q4_K_M"}
        }"#;
        let info: ModelInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.details.parameter_size.as_deref(), Some("3.2B"));
        assert!(info.matches("llama3.2"));
        assert!(info.matches("llama3.2:latest"));
        assert!(!info.matches("llama3.1"));
    }

    #[test]
    fn test_options_skip_unset_fields() {
        let opts = ChatOptions {
            num_predict: Some(256),
            ..ChatOptions::new().with_temperature(0.2)
        };
        let json = serde_json::to_value(&opts).unwrap();
        assert_eq!(json, serde_json::json!({"temperature": 0.2f32, "num_predict": 256}));
        assert!(ChatOptions::new().is_empty());
        assert!(!opts.is_empty());
    }
}
