//! Outbound prompt composition for step-based tools

use super::step::{completion_instruction, StepFields, StepKind};

/// Builds the single user message a step sends to the model
#[derive(Debug, Clone)]
pub struct StepPrompt {
    header: String,
    framing: String,
    sections: Vec<(String, String)>,
    instruction: String,
}

impl StepPrompt {
    /// Start a prompt with the step header, framing and the common sections
    pub fn new(tool: &str, fields: &StepFields, kind: &StepKind, closing_form: &str) -> Self {
        let prompt = Self {
            header: format!(
                "[{}] Step {} of {} ({})",
                tool, fields.step_number, fields.total_steps, kind
            ),
            framing: kind.framing(),
            sections: Vec::new(),
            instruction: completion_instruction(fields.next_step_required, closing_form),
        };
        prompt
            .section("Step", &fields.step)
            .section("Findings", &fields.findings)
    }

    /// Replace the framing sentence
    pub fn with_framing(mut self, framing: impl Into<String>) -> Self {
        self.framing = framing.into();
        self
    }

    /// Add a titled section; blank bodies are dropped
    pub fn section(mut self, title: &str, body: &str) -> Self {
        let body = body.trim();
        if !body.is_empty() {
            self.sections.push((title.to_string(), body.to_string()));
        }
        self
    }

    /// Add a section only when `body` is present
    pub fn optional_section(self, title: &str, body: Option<&str>) -> Self {
        match body {
            Some(body) => self.section(title, body),
            None => self,
        }
    }

    /// Add a bulleted list section; empty lists are dropped
    pub fn list_section(self, title: &str, items: &[String]) -> Self {
        let body = items
            .iter()
            .map(|item| format!("- {}", item))
            .collect::<Vec<_>>()
            .join("\n");
        self.section(title, &body)
    }

    pub fn render(&self) -> String {
        let mut out = format!("{}\n{}", self.header, self.framing);
        for (title, body) in &self.sections {
            out.push_str(&format!("\n\n{}:\n{}", title, body));
        }
        out.push_str("\n\n");
        out.push_str(&self.instruction);
        out
    }
}
