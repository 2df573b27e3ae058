//! Step fields, validation and classification

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A request field failed validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid `{field}`: {message}")]
pub struct InvalidStep {
    pub field: String,
    pub message: String,
}

impl InvalidStep {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Fields shared by every step-based tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepFields {
    /// What this step covers
    pub step: String,
    /// Current step number, starting at 1
    pub step_number: u32,
    /// Estimated total number of steps (may change between calls)
    pub total_steps: u32,
    /// Whether another step will follow; false asks for a closing answer
    pub next_step_required: bool,
    /// What was found or decided in this step
    pub findings: String,
    /// Model to use (defaults to the server's default model)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Id returned by a previous call, to continue that conversation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_id: Option<String>,
    /// Sampling temperature override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl StepFields {
    /// Check bounds; the first failing field is reported
    pub fn validate(&self) -> Result<(), InvalidStep> {
        if self.step.trim().is_empty() {
            return Err(InvalidStep::new("step", "must not be empty"));
        }
        if self.step_number < 1 {
            return Err(InvalidStep::new("step_number", "must be at least 1"));
        }
        if self.total_steps < 1 {
            return Err(InvalidStep::new("total_steps", "must be at least 1"));
        }
        check_temperature(self.temperature)
    }

    /// Continuation token, ignoring blank strings
    pub fn continuation(&self) -> Option<&str> {
        self.continuation_id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Whether this call asks for the closing form
    pub fn is_final(&self) -> bool {
        !self.next_step_required
    }
}

/// Shared temperature bound for every tool
pub fn check_temperature(temperature: Option<f32>) -> Result<(), InvalidStep> {
    match temperature {
        Some(t) if !t.is_finite() || !(0.0..=2.0).contains(&t) => {
            Err(InvalidStep::new("temperature", "must be between 0.0 and 2.0"))
        }
        _ => Ok(()),
    }
}

/// Revision and branch markers (planner only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanMarkers {
    /// This step replaces an earlier one
    #[serde(default)]
    pub is_step_revision: bool,
    /// Step being revised (required with `is_step_revision`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revises_step_number: Option<u32>,
    /// This step opens an alternative path
    #[serde(default)]
    pub is_branch_point: bool,
    /// Name of the branch (required with `is_branch_point`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
    /// Step the branch departs from (required with `is_branch_point`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_from_step: Option<u32>,
}

impl PlanMarkers {
    /// A flag without its companion fields is rejected
    pub fn validate(&self) -> Result<(), InvalidStep> {
        if self.is_step_revision && self.revises_step_number.is_none() {
            return Err(InvalidStep::new(
                "revises_step_number",
                "required when is_step_revision is true",
            ));
        }
        if self.is_branch_point {
            let named = self.branch_id.as_deref().is_some_and(|b| !b.trim().is_empty());
            if !named {
                return Err(InvalidStep::new("branch_id", "required when is_branch_point is true"));
            }
            if self.branch_from_step.is_none() {
                return Err(InvalidStep::new(
                    "branch_from_step",
                    "required when is_branch_point is true",
                ));
            }
        }
        Ok(())
    }
}

/// How a step relates to the work done so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// First step: frame the problem
    Initial,
    /// Replaces the conclusion of an earlier step
    Revision { revises_step: u32 },
    /// Explores an alternative departing from an earlier step
    Branch { branch_id: String, from_step: u32 },
    /// Ordinary next step
    Continuation,
}

impl StepKind {
    /// Classify a step; earlier rules win
    ///
    /// 1. `step_number == 1` is always initial
    /// 2. a complete revision marker
    /// 3. a complete branch marker
    /// 4. anything else continues
    pub fn classify(fields: &StepFields, markers: Option<&PlanMarkers>) -> Self {
        if fields.step_number == 1 {
            return StepKind::Initial;
        }
        if let Some(markers) = markers {
            if markers.is_step_revision {
                if let Some(revises_step) = markers.revises_step_number {
                    return StepKind::Revision { revises_step };
                }
            }
            if markers.is_branch_point {
                if let (Some(branch_id), Some(from_step)) = (&markers.branch_id, markers.branch_from_step) {
                    return StepKind::Branch {
                        branch_id: branch_id.trim().to_string(),
                        from_step,
                    };
                }
            }
        }
        StepKind::Continuation
    }

    /// Framing sentence placed at the top of the outbound prompt
    pub fn framing(&self) -> String {
        match self {
            StepKind::Initial => {
                "This is the first step. Frame the problem and describe the approach you expect to take."
                    .to_string()
            }
            StepKind::Revision { revises_step } => format!(
                "This step revises step {}. Where the two disagree, this step replaces the earlier conclusion.",
                revises_step
            ),
            StepKind::Branch { branch_id, from_step } => format!(
                "This step opens branch '{}' from step {}. Compare it explicitly against the main path.",
                branch_id, from_step
            ),
            StepKind::Continuation => {
                "Continue from the previous steps, building on what was already established.".to_string()
            }
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Initial => write!(f, "initial"),
            StepKind::Revision { .. } => write!(f, "revision"),
            StepKind::Branch { .. } => write!(f, "branch"),
            StepKind::Continuation => write!(f, "continuation"),
        }
    }
}

/// Closing or forward instruction appended to every step prompt
pub fn completion_instruction(next_step_required: bool, closing_form: &str) -> String {
    if next_step_required {
        "More steps will follow. Give guidance on what to examine next rather than a final answer.".to_string()
    } else {
        format!("This is the final step. Conclude with {}.", closing_form)
    }
}
