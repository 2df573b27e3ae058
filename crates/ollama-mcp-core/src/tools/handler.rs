//! Tool handler trait and per-call context

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::error::{ToolError, ToolResult};
use crate::backend::InferenceBackend;
use crate::config::ServerConfig;
use crate::conversation::ConversationStore;
use crate::logging::Logger;

/// Everything a tool may touch while running
#[derive(Clone)]
pub struct ToolContext {
    pub store: Arc<ConversationStore>,
    pub backend: Arc<dyn InferenceBackend>,
    pub config: Arc<ServerConfig>,
    pub logger: Arc<dyn Logger>,
    /// Names of the tools currently enabled, in listing order
    pub enabled_tools: Vec<String>,
}

impl ToolContext {
    pub fn new(
        store: Arc<ConversationStore>,
        backend: Arc<dyn InferenceBackend>,
        config: Arc<ServerConfig>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            store,
            backend,
            config,
            logger,
            enabled_tools: Vec::new(),
        }
    }

    /// Model to use when the caller did not name one
    pub fn resolve_model(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.config.default_model.as_str())
            .to_string()
    }
}

/// A callable tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name the host calls the tool by
    fn name(&self) -> &'static str;

    /// One-paragraph description shown to the host
    fn description(&self) -> &'static str;

    /// JSON Schema of the arguments object
    fn input_schema(&self) -> Value;

    /// Run the tool and return the text shown to the host
    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> ToolResult<String>;
}

/// Arguments of tools that take none
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoArguments {}

/// JSON Schema for `T` as a plain JSON value
pub fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| serde_json::json!({"type": "object"}))
}

/// Deserialize tool arguments; a missing/null payload counts as `{}`
///
/// Failures name the offending field. Fields reached through
/// `#[serde(flatten)]` lose their deserializer path, so those are located by
/// checking each top-level value against `T`'s schema.
pub fn parse_args<T: DeserializeOwned + JsonSchema>(arguments: Value) -> ToolResult<T> {
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments
    };

    serde_path_to_error::deserialize::<_, T>(&arguments).map_err(|err| {
        let path = err.path().to_string();
        let field = if path != "." {
            Some(path)
        } else {
            mismatched_field(&schema_of::<T>(), &arguments)
        };
        ToolError::from_parse(err.into_inner(), field)
    })
}

/// First top-level argument whose value does not fit its declared schema
fn mismatched_field(schema: &Value, arguments: &Value) -> Option<String> {
    let arguments = arguments.as_object()?;
    arguments
        .iter()
        .find(|(name, value)| {
            property_schema(schema, schema, name).is_some_and(|prop| !conforms(schema, prop, value))
        })
        .map(|(name, _)| name.clone())
}

fn property_schema<'a>(root: &'a Value, schema: &'a Value, name: &str) -> Option<&'a Value> {
    let schema = resolve_ref(root, schema);
    if let Some(prop) = schema.get("properties").and_then(|p| p.get(name)) {
        return Some(prop);
    }
    schema
        .get("allOf")?
        .as_array()?
        .iter()
        .find_map(|part| property_schema(root, part, name))
}

fn resolve_ref<'a>(root: &'a Value, schema: &'a Value) -> &'a Value {
    schema
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| r.strip_prefix('#'))
        .and_then(|pointer| root.pointer(pointer))
        .unwrap_or(schema)
}

/// Shallow check of `type`, `enum` and numeric bounds
fn conforms(root: &Value, schema: &Value, value: &Value) -> bool {
    let schema = resolve_ref(root, schema);

    for key in ["anyOf", "oneOf"] {
        if let Some(options) = schema.get(key).and_then(Value::as_array) {
            return options.iter().any(|option| conforms(root, option, value));
        }
    }

    if let Some(expected) = schema.get("type") {
        let matches = match expected {
            Value::String(t) => has_type(t, value),
            Value::Array(types) => types.iter().filter_map(Value::as_str).any(|t| has_type(t, value)),
            _ => true,
        };
        if !matches {
            return false;
        }
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            return false;
        }
    }

    if let Some(n) = value.as_f64() {
        if schema.get("minimum").and_then(Value::as_f64).is_some_and(|min| n < min) {
            return false;
        }
        if schema.get("maximum").and_then(Value::as_f64).is_some_and(|max| n > max) {
            return false;
        }
    }
    true
}

fn has_type(expected: &str, value: &Value) -> bool {
    match expected {
        "null" => value.is_null(),
        "boolean" => value.is_boolean(),
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}
