//! Conversation continuity
//!
//! Stitches independent, stateless tool calls into multi-turn dialogues.
//! Every conversation lives in a single process-wide `ConversationStore`
//! that bounds memory by age (retention window) and count (capacity).

mod clock;
mod model;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use model::{Conversation, Metadata};
pub use store::{ConversationStore, StoreLimits};
