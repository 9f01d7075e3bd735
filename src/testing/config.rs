//! Scenario configuration types
//!
//! Defines the data structures for deserializing YAML smoke-test suites.
//! Scenarios are plain data; a single executor interprets them.

use serde::Deserialize;
use std::path::Path;

use crate::common::config::Service;
use crate::common::{Error, Result};

/// The built-in PrintKe smoke suite
const BUILTIN_SUITE: &str = include_str!("../../scenarios/smoke.yaml");

/// A suite file: an ordered list of independent scenarios
#[derive(Deserialize, Debug)]
pub struct Suite {
    pub scenarios: Vec<Scenario>,
}

/// A single self-contained verification unit
#[derive(Deserialize, Debug, Clone)]
pub struct Scenario {
    /// Name of the scenario, also used in the report
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// The sequence of checks to execute
    pub steps: Vec<Step>,
}

/// One endpoint check inside a scenario
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Load a rendered page in the browser
    Page {
        service: Service,
        #[serde(default = "default_path")]
        path: String,
        /// Wait until no network requests are in flight before asserting
        #[serde(default)]
        wait_for_network_idle: bool,
        #[serde(default)]
        expect: Vec<PageAssertion>,
        /// File name for a full-page screenshot under `screenshots/`
        screenshot: Option<String>,
    },
    /// Issue an HTTP request and inspect the JSON body
    Api {
        service: Service,
        #[serde(default = "default_path")]
        path: String,
        #[serde(default)]
        method: HttpMethod,
        /// JSON body sent with the request
        body: Option<serde_json::Value>,
        /// Exact status code instead of the default 2xx check
        expect_status: Option<u16>,
        #[serde(default)]
        expect: Vec<JsonAssertion>,
    },
}

fn default_path() -> String {
    "/".to_string()
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

/// Assertion on a rendered page
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub enum PageAssertion {
    /// Page title matches a regular expression
    TitleMatches { pattern: String },
    /// Element matching a CSS selector contains the text, preferring a displayed match
    TextContains { selector: String, text: String },
    /// An element whose own text contains the given text is visible
    TextVisible { text: String },
    /// An anchor with exactly this `href` attribute is visible
    LinkVisible { href: String },
}

/// Assertion on a JSON response body
#[derive(Deserialize, Debug, Clone)]
pub struct JsonAssertion {
    /// Dotted path into the body, e.g. `status` or `orders.total`
    pub field: String,
    /// Expected exact value
    pub equals: Option<serde_json::Value>,
    /// Expected substring of a string value
    pub contains: Option<String>,
}

impl Suite {
    /// The suite shipped with the binary
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_SUITE)
    }

    /// Parse a suite from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let suite: Suite =
            serde_yaml::from_str(content).map_err(|e| Error::ScenarioParse(e.to_string()))?;
        suite.validate()?;
        Ok(suite)
    }

    /// Load a suite from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_yaml(&content)
    }

    /// Keep only scenarios whose name contains `filter`
    pub fn filtered(self, filter: Option<&str>) -> Vec<Scenario> {
        match filter {
            Some(f) => self
                .scenarios
                .into_iter()
                .filter(|s| s.name.contains(f))
                .collect(),
            None => self.scenarios,
        }
    }

    fn validate(&self) -> Result<()> {
        let mut names = std::collections::HashSet::new();
        let mut screenshots = std::collections::HashSet::new();

        for scenario in &self.scenarios {
            if !names.insert(scenario.name.as_str()) {
                return Err(Error::ScenarioParse(format!(
                    "duplicate scenario name '{}'",
                    scenario.name
                )));
            }
            if scenario.steps.is_empty() {
                return Err(Error::ScenarioParse(format!(
                    "scenario '{}' has no steps",
                    scenario.name
                )));
            }
            for step in &scenario.steps {
                match step {
                    Step::Page {
                        expect, screenshot, ..
                    } => {
                        if let Some(file) = screenshot {
                            if file.contains('/') || file.contains('\\') || file.is_empty() {
                                return Err(Error::ScenarioParse(format!(
                                    "screenshot '{}' must be a plain file name",
                                    file
                                )));
                            }
                            // Artifacts are write-once; two scenarios may not share one
                            if !screenshots.insert(file.as_str()) {
                                return Err(Error::ScenarioParse(format!(
                                    "screenshot '{}' is declared twice",
                                    file
                                )));
                            }
                        }
                        for assertion in expect {
                            if let PageAssertion::TitleMatches { pattern } = assertion {
                                regex::Regex::new(pattern).map_err(|e| {
                                    Error::ScenarioParse(format!(
                                        "scenario '{}': invalid title pattern: {}",
                                        scenario.name, e
                                    ))
                                })?;
                            }
                        }
                    }
                    Step::Api { expect, .. } => {
                        for assertion in expect {
                            if assertion.equals.is_none() && assertion.contains.is_none() {
                                return Err(Error::ScenarioParse(format!(
                                    "scenario '{}': assertion on '{}' needs 'equals' or 'contains'",
                                    scenario.name, assertion.field
                                )));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl Scenario {
    /// Screenshot file names this scenario declares, in step order
    pub fn declared_screenshots(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::Page { screenshot, .. } => screenshot.as_deref(),
                Step::Api { .. } => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_suite_parses() {
        let suite = Suite::builtin().unwrap();
        let names: Vec<&str> = suite.scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "admin-dashboard",
                "api-health",
                "api-root",
                "minio-console",
                "admin-links",
                "full-screenshots"
            ]
        );
    }

    #[test]
    fn test_builtin_health_scenario_checks_three_fields() {
        let suite = Suite::builtin().unwrap();
        let health = &suite.scenarios[1];
        match &health.steps[0] {
            Step::Api {
                service,
                path,
                method,
                expect,
                ..
            } => {
                assert_eq!(*service, Service::Api);
                assert_eq!(path, "/health");
                assert_eq!(*method, HttpMethod::Get);
                let fields: Vec<&str> = expect.iter().map(|a| a.field.as_str()).collect();
                assert_eq!(fields, vec!["status", "service", "platform"]);
            }
            other => panic!("Expected api step, got {:?}", other),
        }
    }

    #[test]
    fn test_full_screenshots_declares_two_files() {
        let suite = Suite::builtin().unwrap();
        let full = suite
            .scenarios
            .iter()
            .find(|s| s.name == "full-screenshots")
            .unwrap();
        assert_eq!(
            full.declared_screenshots(),
            vec!["06-full-admin.png", "06-full-minio.png"]
        );
    }

    #[test]
    fn test_filter_by_substring() {
        let suite = Suite::builtin().unwrap();
        let api: Vec<String> = suite
            .filtered(Some("api-"))
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(api, vec!["api-health", "api-root"]);
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let yaml = r#"
scenarios:
  - name: twice
    steps:
      - action: api
        service: api
  - name: twice
    steps:
      - action: api
        service: api
"#;
        let err = Suite::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate scenario name"));
    }

    #[test]
    fn test_rejects_screenshot_with_directory() {
        let yaml = r#"
scenarios:
  - name: escape
    steps:
      - action: page
        service: admin
        screenshot: ../outside.png
"#;
        assert!(Suite::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_rejects_bad_title_pattern() {
        let yaml = r#"
scenarios:
  - name: bad
    steps:
      - action: page
        service: admin
        expect:
          - title_matches: { pattern: "PrintKe (" }
"#;
        let err = Suite::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("invalid title pattern"));
    }

    #[test]
    fn test_post_step_with_body() {
        let yaml = r#"
scenarios:
  - name: pricing
    steps:
      - action: api
        service: api
        path: /api/orders/calculate
        method: POST
        body: { quantity: 10, delivery_city: nairobi }
        expect:
          - field: unit_price
            equals: 400
"#;
        let suite = Suite::from_yaml(yaml).unwrap();
        match &suite.scenarios[0].steps[0] {
            Step::Api { method, body, .. } => {
                assert_eq!(*method, HttpMethod::Post);
                assert_eq!(body.as_ref().unwrap()["quantity"], 10);
            }
            other => panic!("Expected api step, got {:?}", other),
        }
    }
}
