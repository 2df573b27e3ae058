//! Argument types shared by several step tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How sure the caller is about the current conclusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Exploring,
    Low,
    Medium,
    High,
    VeryHigh,
    AlmostCertain,
    Certain,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::Exploring => "exploring",
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
            Confidence::VeryHigh => "very_high",
            Confidence::AlmostCertain => "almost_certain",
            Confidence::Certain => "certain",
        };
        f.write_str(label)
    }
}

/// Issue severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Severity::Critical, Severity::High, Severity::Medium, Severity::Low];
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        };
        f.write_str(label)
    }
}

/// An issue recorded by review or validation steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Issue {
    pub severity: Severity,
    pub description: String,
}

/// `- [high] description` lines
pub fn issue_lines(issues: &[Issue]) -> Vec<String> {
    let mut sorted: Vec<&Issue> = issues.iter().collect();
    sorted.sort_by_key(|issue| issue.severity);
    sorted
        .into_iter()
        .map(|issue| format!("[{}] {}", issue.severity, issue.description))
        .collect()
}

/// `critical=1 high=0 medium=2 low=0`, or `None` when there are no issues
pub fn severity_counts(issues: &[Issue]) -> Option<String> {
    if issues.is_empty() {
        return None;
    }
    let counts = Severity::ALL
        .iter()
        .map(|severity| {
            let n = issues.iter().filter(|i| i.severity == *severity).count();
            format!("{}={}", severity, n)
        })
        .collect::<Vec<_>>()
        .join(" ");
    Some(counts)
}
