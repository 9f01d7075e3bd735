//! Error types for the PrintKe operations CLI
//!
//! Scenario errors are classified into suite outcomes: assertion mismatches
//! become `Fail`, everything else a scenario can hit becomes `Error`.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PrintKe CLI
#[derive(Error, Debug)]
pub enum Error {
    // === Scenario Errors ===
    #[error("{0}")]
    AssertionFailed(String),

    #[error("Target '{target}' is unreachable: {reason}")]
    Unreachable { target: String, reason: String },

    #[error("Malformed response from '{target}': {reason}")]
    MalformedResponse { target: String, reason: String },

    #[error("No element matching {locator} on '{url}'")]
    ElementNotFound { locator: String, url: String },

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    // === Browser Errors ===
    #[error("WebDriver command '{command}' failed: {message}")]
    WebDriver { command: String, message: String },

    #[error("WebDriver server at '{0}' is not reachable. Start chromedriver/geckodriver or set PRINTKE_WEBDRIVER_URL")]
    WebDriverUnavailable(String),

    // === Operations Errors ===
    #[error("Program '{0}' not found. Is it installed and on PATH?")]
    ProgramNotFound(String),

    #[error("Failed to run '{program}': {error}")]
    SpawnFailed { program: String, error: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Invalid scenario file: {0}")]
    ScenarioParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Failed to write artifact '{path}': {error}")]
    ArtifactWrite { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an assertion failure naming the check with its expected and actual values
    pub fn assertion(check: &str, expected: impl std::fmt::Display, actual: impl std::fmt::Display) -> Self {
        Self::AssertionFailed(format!("{check}: expected {expected}, got {actual}"))
    }

    /// Create an unreachable-target error
    pub fn unreachable(target: &str, reason: impl ToString) -> Self {
        Self::Unreachable {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a malformed-response error
    pub fn malformed(target: &str, reason: impl ToString) -> Self {
        Self::MalformedResponse {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a WebDriver command error
    pub fn webdriver(command: &str, message: impl ToString) -> Self {
        Self::WebDriver {
            command: command.to_string(),
            message: message.to_string(),
        }
    }

    /// Classify a `reqwest` failure against a target URL
    ///
    /// Connection and timeout failures mean the target is unreachable; a body
    /// that could not be decoded is malformed.
    pub fn from_http(target: &str, e: reqwest::Error) -> Self {
        if e.is_decode() || e.is_body() {
            Self::malformed(target, e)
        } else {
            Self::unreachable(target, e)
        }
    }

    /// Whether this error is an assertion mismatch rather than an execution problem
    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::AssertionFailed(_))
    }
}
