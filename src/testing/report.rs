//! Scenario results and the suite summary

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use colored::Colorize;
use serde::Serialize;

use crate::common::Error;

/// Outcome of a single scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Every assertion held
    Pass,
    /// An assertion did not hold
    Fail,
    /// The scenario could not be evaluated (unreachable, timeout, malformed)
    Error,
}

impl Outcome {
    /// Classify an error raised while executing a scenario
    pub fn classify(error: &Error) -> Self {
        if error.is_assertion() {
            Outcome::Fail
        } else {
            Outcome::Error
        }
    }

    fn label(self) -> colored::ColoredString {
        match self {
            Outcome::Pass => "PASS".green().bold(),
            Outcome::Fail => "FAIL".red().bold(),
            Outcome::Error => "ERROR".yellow().bold(),
        }
    }
}

/// Result of running one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub outcome: Outcome,
    /// Screenshots captured before the scenario ended
    pub artifacts: Vec<PathBuf>,
    /// First failing check, for Fail and Error outcomes
    pub detail: Option<String>,
    pub duration_ms: u64,
}

impl ScenarioResult {
    pub fn passed(name: &str, artifacts: Vec<PathBuf>, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            outcome: Outcome::Pass,
            artifacts,
            detail: None,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Result for a scenario that stopped at `step` with `error`
    pub fn stopped(
        name: &str,
        step: usize,
        error: &Error,
        artifacts: Vec<PathBuf>,
        duration: Duration,
    ) -> Self {
        Self {
            name: name.to_string(),
            outcome: Outcome::classify(error),
            artifacts,
            detail: Some(format!("step {}: {}", step, error)),
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.outcome == Outcome::Pass
    }

    /// One console line for this result
    pub fn print(&self) {
        match self.outcome {
            Outcome::Pass => {
                println!(
                    "  {} {} {}",
                    "✓".green(),
                    self.name.white().bold(),
                    format!("({} ms)", self.duration_ms).dimmed()
                );
                for artifact in &self.artifacts {
                    println!("      {} {}", "→".dimmed(), artifact.display().to_string().dimmed());
                }
            }
            Outcome::Fail | Outcome::Error => {
                println!(
                    "  {} {} [{}] {}",
                    "✗".red(),
                    self.name.white().bold(),
                    self.outcome.label(),
                    self.detail.as_deref().unwrap_or_default()
                );
            }
        }
    }
}

fn unix_secs(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Aggregate of one suite run
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub results: Vec<ScenarioResult>,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    /// Scenarios declared but never finished because the run was interrupted
    pub not_run: usize,
    pub started_at_unix: u64,
    pub finished_at_unix: u64,
    pub duration_ms: u64,
}

impl SuiteReport {
    pub fn new(results: Vec<ScenarioResult>, declared: usize, started: SystemTime) -> Self {
        let count = |o: Outcome| results.iter().filter(|r| r.outcome == o).count();
        let (passed, failed, errored) = (count(Outcome::Pass), count(Outcome::Fail), count(Outcome::Error));
        let not_run = declared.saturating_sub(results.len());

        Self {
            passed,
            failed,
            errored,
            not_run,
            started_at_unix: unix_secs(started),
            finished_at_unix: unix_secs(SystemTime::now()),
            duration_ms: started.elapsed().map(|d| d.as_millis() as u64).unwrap_or(0),
            results,
        }
    }

    /// Whether every declared scenario ran and passed
    pub fn success(&self) -> bool {
        self.failed == 0 && self.errored == 0 && self.not_run == 0
    }

    /// Process exit code for this report
    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }

    /// Print the summary table
    pub fn print_summary(&self) {
        println!("\n{}", "Summary:".cyan().bold());
        for result in &self.results {
            println!("  {:.<40} {}", format!("{} ", result.name), result.outcome.label());
        }

        let total = self.results.len() + self.not_run;
        println!(
            "\n{} {}/{} passed, {} failed, {} errors",
            "Results:".bold(),
            self.passed,
            total,
            self.failed,
            self.errored
        );
        if self.not_run > 0 {
            println!("{} {} scenario(s) not run (interrupted)", "!".yellow(), self.not_run);
        }

        if self.success() {
            println!("\n{}\n", "All smoke checks passed.".green().bold());
        } else {
            println!("\n{}\n", "Some smoke checks failed.".red().bold());
        }
    }
}
