//! Logging abstractions

mod traits;
mod noop;
mod console;
mod file_logger;
mod memory;

pub use traits::{LogLevel, Logger, SharedLogger};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
pub use file_logger::FileLogger;
pub use memory::MemoryLogger;
