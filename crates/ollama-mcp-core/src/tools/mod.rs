//! Tools exposed to the host
//!
//! ```text
//! host ──tools/call──▶ ToolRegistry ──▶ ToolHandler::execute
//!                                            │
//!                         resolve conversation (workflow)
//!                         one backend call (backend)
//!                         append user + assistant (conversation)
//!                                            │
//!              ◀── answer + status trailer ──┘
//! ```
//!
//! `chat` is a plain conversational tool; `debug`, `planner`, `codereview`,
//! `precommit` and `consensus` follow the step protocol; `listmodels` and
//! `version` are essential utilities that cannot be disabled.

mod chat;
mod codereview;
mod common;
mod consensus;
mod debug;
mod error;
mod handler;
mod listmodels;
mod planner;
mod precommit;
mod registry;
mod turn;
mod version;

pub use chat::{ChatArgs, ChatTool};
pub use codereview::{CodeReviewArgs, CodeReviewTool, ReviewType};
pub use common::{Confidence, Issue, Severity};
pub use consensus::{ConsensusArgs, ConsensusTool, Participant, ParticipantResponse, Stance};
pub use debug::{DebugArgs, DebugTool};
pub use error::{ToolError, ToolResult};
pub use handler::{parse_args, schema_of, NoArguments, ToolContext, ToolHandler};
pub use listmodels::ListModelsTool;
pub use planner::{PlannerArgs, PlannerTool};
pub use precommit::{PrecommitArgs, PrecommitTool};
pub use registry::{builtin_tools, ToolInfo, ToolRegistry, ESSENTIAL_TOOLS};
pub use turn::{run_turn, Turn, TurnOutcome};
pub use version::{VersionTool, SERVER_NAME, SERVER_VERSION};
