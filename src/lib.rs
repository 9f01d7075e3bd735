//! PrintKe CLI - operations wrapper and smoke-test harness
//!
//! This library provides the operation table used to run the PrintKe
//! service fleet and the scenario executor that verifies a deployment.

pub mod browser;
pub mod cli;
pub mod commands;
pub mod common;
pub mod ops;
pub mod testing;

// Re-export commonly used types for tests
pub use commands::Operation;
pub use common::{Error, Result};
