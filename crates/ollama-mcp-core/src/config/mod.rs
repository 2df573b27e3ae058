//! Server configuration
//!
//! Supports multiple configuration sources:
//! - Built-in defaults
//! - `ConfigFile`: optional YAML file
//! - `EnvSource`: environment variables (`ProcessEnv`, or `MemoryEnv` in tests)

mod traits;
mod memory;
mod file;
mod settings;

pub use traits::{ConfigError, ConfigResult, EnvSource, ProcessEnv};
pub use memory::MemoryEnv;
pub use file::ConfigFile;
pub use settings::*;
