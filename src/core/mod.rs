pub mod config;
pub mod defaults;
pub mod dejacode;
pub mod error;
pub mod paths;
pub mod pipeline;
pub mod runner;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
