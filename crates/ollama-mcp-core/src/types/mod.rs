//! Core types shared by the backend, the conversation store and the tools

mod message;
mod model;
mod tool;
mod stream;

pub use message::{Message, MessageRole};
pub use model::{ChatOptions, ModelDetails, ModelInfo};
pub use tool::{ToolContent, ToolResponse};
pub use stream::StreamChunk;
