//! Configuration and results paths
//!
//! Linux: `~/.config/printke/config.toml`
//! macOS: `~/Library/Application Support/printke/config.toml`
//! Windows: `%APPDATA%\printke\config.toml`

use std::path::{Path, PathBuf};

/// Application name used for platform directories
const APP_NAME: &str = "printke";

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "PRINTKE_CONFIG";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
///
/// `PRINTKE_CONFIG` takes precedence over the platform location.
pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(explicit));
    }
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Directory holding screenshot artifacts inside a results directory
pub fn screenshots_dir(results_dir: &Path) -> PathBuf {
    results_dir.join("screenshots")
}

/// Path of the JSON suite report inside a results directory
pub fn report_path(results_dir: &Path) -> PathBuf {
    results_dir.join("report.json")
}

/// File name of the suite log inside a results directory
pub const SUITE_LOG: &str = "suite.log";
