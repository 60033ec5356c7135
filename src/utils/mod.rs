//! Generic utility primitives with zero domain knowledge.
//!
//! - `command` - Subprocess invocation behind a swappable runner
//! - `io` - File I/O with consistent error handling
//! - `parser` - Text extraction and list splitting

pub mod command;
pub mod io;
pub mod parser;
