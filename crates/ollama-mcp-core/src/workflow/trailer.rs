//! Status block appended to every tool reply

use std::fmt;

use super::step::StepFields;

/// Fixed-shape `key: value` block separated from the answer by `---`
///
/// Core keys come first in a stable order; tool-specific keys follow in the
/// order they were added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTrailer {
    fields: Vec<(String, String)>,
}

impl ResponseTrailer {
    /// Trailer for a step-based tool
    pub fn for_step(tool: &str, step: &StepFields, continuation_id: &str) -> Self {
        Self { fields: Vec::new() }
            .field("tool", tool)
            .field("step", format!("{}/{}", step.step_number, step.total_steps))
            .field("next_step_required", step.next_step_required)
            .field("continuation_id", continuation_id)
    }

    /// Trailer for a plain conversational tool
    pub fn for_chat(tool: &str, continuation_id: &str) -> Self {
        Self { fields: Vec::new() }
            .field("tool", tool)
            .field("continuation_id", continuation_id)
    }

    /// Append a field
    pub fn field(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.fields.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a field only when a value is present
    pub fn optional<T: fmt::Display>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.field(key, value),
            None => self,
        }
    }

    /// Value of a field, if set
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Answer followed by this trailer
    pub fn attach_to(&self, answer: &str) -> String {
        format!("{}\n\n{}", answer.trim_end(), self)
    }
}

impl fmt::Display for ResponseTrailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "---")?;
        for (key, value) in &self.fields {
            write!(f, "\n{}: {}", key, value)?;
        }
        Ok(())
    }
}
