//! Infrastructure adapters for configuration, filesystem writes, and logging.

pub mod config;
pub mod fs;
pub mod logging;
