//! Smoke-test harness
//!
//! Reads a suite of independent scenarios (YAML, built-in by default) and
//! executes them against the running PrintKe services: API routes through
//! an HTTP client, UI pages through a WebDriver-controlled browser.

pub mod artifacts;
pub mod assertions;
mod config;
pub mod report;
mod runner;

pub use artifacts::ResultsDir;
pub use config::*;
pub use report::{Outcome, ScenarioResult, SuiteReport};
pub use runner::{run_scenario, run_suite, run_suite_until, wait_healthy, RunContext};
