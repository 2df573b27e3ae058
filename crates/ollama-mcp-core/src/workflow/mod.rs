//! Multi-step workflow protocol
//!
//! Shared contract of the step-based tools (`debug`, `planner`,
//! `codereview`, `precommit`, `consensus`):
//!
//! - resolve or create the conversation behind a continuation token
//! - classify the step (initial, revision, branch, continuation)
//! - compose one outbound prompt with closing or forward framing
//! - append a fixed-shape status trailer to the model's answer
//!
//! Step counters are caller-owned and never cross-checked.

mod consensus;
mod prompt;
mod resolve;
mod step;
mod trailer;

pub use consensus::ConsensusPhase;
pub use prompt::StepPrompt;
pub use resolve::{resolve_conversation, Resolution};
pub use step::{check_temperature, completion_instruction, InvalidStep, PlanMarkers, StepFields, StepKind};
pub use trailer::ResponseTrailer;
