//! Configuration file handling

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Base URLs of the services under test
    #[serde(default)]
    pub endpoints: Endpoints,

    /// WebDriver and browser settings
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Where artifacts and reports are written
    #[serde(default)]
    pub results: ResultsConfig,

    /// External commands used by the operations wrapper
    #[serde(default)]
    pub ops: OpsConfig,
}

/// A managed service the suite can target
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    /// Admin dashboard UI
    Admin,
    /// PrintKe REST API
    Api,
    /// MinIO object-storage console
    Storage,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Service::Admin => "admin",
            Service::Api => "api",
            Service::Storage => "storage",
        })
    }
}

/// Base URLs of the services under test
#[derive(Debug, Deserialize, Clone)]
pub struct Endpoints {
    #[serde(default = "default_admin_url", alias = "baseAdminUrl")]
    pub admin_url: String,

    #[serde(default = "default_api_url", alias = "baseApiUrl")]
    pub api_url: String,

    #[serde(default = "default_storage_url", alias = "baseStorageUrl")]
    pub storage_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            admin_url: default_admin_url(),
            api_url: default_api_url(),
            storage_url: default_storage_url(),
        }
    }
}

fn default_admin_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_storage_url() -> String {
    "http://localhost:9001".to_string()
}

impl Endpoints {
    /// Base URL configured for a service
    pub fn base(&self, service: Service) -> &str {
        match service {
            Service::Admin => &self.admin_url,
            Service::Api => &self.api_url,
            Service::Storage => &self.storage_url,
        }
    }

    /// Resolve a path against a service's base URL
    pub fn resolve(&self, service: Service, path: &str) -> Result<reqwest::Url> {
        let base = self.base(service);
        let base_url = reqwest::Url::parse(base).map_err(|e| {
            super::Error::Config(format!("Invalid {} URL '{}': {}", service, base, e))
        })?;
        base_url.join(path).map_err(|e| {
            super::Error::Config(format!("Invalid path '{}' for {}: {}", path, service, e))
        })
    }
}

/// WebDriver settings
#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    /// URL of a running W3C WebDriver server (chromedriver, geckodriver)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Browser name requested in the session capabilities
    #[serde(default = "default_browser")]
    pub browser: String,

    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            browser: default_browser(),
            headless: default_headless(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}
fn default_browser() -> String {
    "chrome".to_string()
}
fn default_headless() -> bool {
    true
}
fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    800
}

/// Timeout settings
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Timeout for a single HTTP request or WebDriver command
    #[serde(default = "default_request")]
    pub request_secs: u64,

    /// Timeout for a page navigation including the network idle wait
    #[serde(default = "default_navigation")]
    pub navigation_secs: u64,

    /// How long to wait for an element to appear
    #[serde(default = "default_element")]
    pub element_secs: u64,

    /// Quiet period with no new network activity before a page counts as idle
    #[serde(default = "default_network_idle")]
    pub network_idle_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: default_request(),
            navigation_secs: default_navigation(),
            element_secs: default_element(),
            network_idle_ms: default_network_idle(),
        }
    }
}

fn default_request() -> u64 {
    30
}
fn default_navigation() -> u64 {
    30
}
fn default_element() -> u64 {
    5
}
fn default_network_idle() -> u64 {
    500
}

impl Timeouts {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_secs(self.navigation_secs)
    }

    pub fn element(&self) -> Duration {
        Duration::from_secs(self.element_secs)
    }

    pub fn network_idle(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }
}

/// Results directory configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ResultsConfig {
    #[serde(default = "default_results_dir")]
    pub dir: PathBuf,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            dir: default_results_dir(),
        }
    }
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("test-results")
}

/// Operations wrapper configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OpsConfig {
    /// Directory holding start/stop/backup/restore scripts
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,

    /// Container orchestration command, program first
    #[serde(default = "default_compose_command")]
    pub compose_command: Vec<String>,

    /// Compose file passed with `-f`, if any
    #[serde(default)]
    pub compose_file: Option<PathBuf>,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
            compose_command: default_compose_command(),
            compose_file: None,
        }
    }
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("scripts")
}
fn default_compose_command() -> Vec<String> {
    vec!["docker".to_string(), "compose".to_string()]
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist. Environment
    /// overrides are applied on top in both cases.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = config_path() {
            if path.exists() {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    super::Error::FileRead {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    }
                })?;
                config = Self::from_toml(&content)?;
            }
        }
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Apply `PRINTKE_*` overrides using the given lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PRINTKE_ADMIN_URL") {
            self.endpoints.admin_url = v;
        }
        if let Some(v) = lookup("PRINTKE_API_URL") {
            self.endpoints.api_url = v;
        }
        if let Some(v) = lookup("PRINTKE_STORAGE_URL") {
            self.endpoints.storage_url = v;
        }
        if let Some(v) = lookup("PRINTKE_WEBDRIVER_URL") {
            self.browser.webdriver_url = v;
        }
        if let Some(v) = lookup("PRINTKE_RESULTS_DIR") {
            self.results.dir = PathBuf::from(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_local_ports() {
        let config = Config::default();
        assert_eq!(config.endpoints.api_url, "http://localhost:8000");
        assert_eq!(config.endpoints.admin_url, "http://localhost:3000");
        assert_eq!(config.endpoints.storage_url, "http://localhost:9001");
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.ops.compose_command, vec!["docker", "compose"]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
[endpoints]
api_url = "http://api.printke.local"

[timeouts]
element_secs = 2
"#,
        )
        .unwrap();
        assert_eq!(config.endpoints.api_url, "http://api.printke.local");
        assert_eq!(config.endpoints.admin_url, "http://localhost:3000");
        assert_eq!(config.timeouts.element_secs, 2);
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn test_camel_case_endpoint_names_accepted() {
        let config = Config::from_toml(
            r#"
[endpoints]
baseAdminUrl = "http://admin:80"
baseStorageUrl = "http://minio:9001"
"#,
        )
        .unwrap();
        assert_eq!(config.endpoints.admin_url, "http://admin:80");
        assert_eq!(config.endpoints.storage_url, "http://minio:9001");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            "PRINTKE_API_URL" => Some("http://127.0.0.1:18000".to_string()),
            "PRINTKE_RESULTS_DIR" => Some("/tmp/printke".to_string()),
            _ => None,
        });
        assert_eq!(config.endpoints.api_url, "http://127.0.0.1:18000");
        assert_eq!(config.results.dir, PathBuf::from("/tmp/printke"));
        assert_eq!(config.endpoints.admin_url, "http://localhost:3000");
    }

    #[test]
    fn test_invalid_toml_is_config_parse_error() {
        let err = Config::from_toml("[endpoints\n").unwrap_err();
        assert!(matches!(err, crate::Error::ConfigParse(_)));
    }

    #[test]
    fn test_resolve_joins_path() {
        let endpoints = Endpoints::default();
        let url = endpoints.resolve(Service::Api, "/health").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/health");
        let root = endpoints.resolve(Service::Storage, "/").unwrap();
        assert_eq!(root.as_str(), "http://localhost:9001/");
    }
}
