//! W3C WebDriver wire types
//!
//! Only the handful of commands the smoke suite needs.
//! See: https://www.w3.org/TR/webdriver2/

use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::config::BrowserConfig;

/// Key under which WebDriver returns element references
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Error code returned when a lookup matched nothing
pub const NO_SUCH_ELEMENT: &str = "no such element";

/// Most matches inspected when looking for a displayed element
pub const MAX_CANDIDATES: usize = 16;

/// Every WebDriver response wraps its payload in `value`
#[derive(Debug, Deserialize)]
pub struct WireResponse {
    #[serde(default)]
    pub value: Value,
}

/// Error payload of a failed command
#[derive(Debug, Deserialize, Clone)]
pub struct WireError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.error)
        } else {
            write!(f, "{}: {}", self.error, self.message)
        }
    }
}

impl WireError {
    /// Whether a navigation failed because the page's host could not be reached
    ///
    /// Chrome reports `net::ERR_*`, Firefox an `about:neterror` page.
    pub fn is_network_failure(&self) -> bool {
        self.message.contains("net::ERR_") || self.message.contains("about:neterror")
    }

    pub fn is_timeout(&self) -> bool {
        self.error == "timeout" || self.error == "script timeout"
    }
}

/// Payload of a successful new-session command
#[derive(Debug, Deserialize)]
pub struct NewSession {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Element locator strategies used by the suite
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    /// Elements whose own text nodes contain `text`
    ///
    /// Text inside `head`, `script` and `style` never renders, so it is skipped.
    pub fn text(text: &str) -> Self {
        Locator::XPath(format!(
            "//*[not(ancestor-or-self::head or ancestor-or-self::script or ancestor-or-self::style)]\
             [text()[contains(normalize-space(.), {})]]",
            xpath_literal(text)
        ))
    }

    /// Anchor with exactly this `href` attribute
    pub fn link(href: &str) -> Self {
        Locator::Css(format!("a[href=\"{}\"]", href.replace('"', "\\\"")))
    }

    pub fn to_wire(&self) -> Value {
        match self {
            Locator::Css(selector) => json!({ "using": "css selector", "value": selector }),
            Locator::XPath(path) => json!({ "using": "xpath", "value": path }),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css '{}'", selector),
            Locator::XPath(path) => write!(f, "xpath '{}'", path),
        }
    }
}

/// Quote a string for use inside an XPath expression
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{}'", text)
    } else if !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Capabilities requested when opening a session
pub fn capabilities(config: &BrowserConfig) -> Value {
    let size = format!("--window-size={},{}", config.window_width, config.window_height);
    let always_match = match config.browser.as_str() {
        "firefox" => {
            let args: Vec<&str> = if config.headless { vec!["-headless"] } else { vec![] };
            json!({
                "browserName": "firefox",
                "moz:firefoxOptions": { "args": args }
            })
        }
        name => {
            let mut args = vec![size, "--disable-gpu".to_string()];
            if config.headless {
                args.push("--headless=new".to_string());
            }
            json!({
                "browserName": name,
                "goog:chromeOptions": { "args": args }
            })
        }
    };
    json!({ "capabilities": { "alwaysMatch": always_match } })
}

/// Script reporting document readiness and the number of finished resource loads
pub const NETWORK_PROBE: &str =
    "return [document.readyState, performance.getEntriesByType('resource').length];";

/// Script reporting the full scrollable size of the document
pub const DOCUMENT_SIZE: &str = "var d = document.documentElement, b = document.body; \
     return [Math.max(d.scrollWidth, b ? b.scrollWidth : 0), \
             Math.max(d.scrollHeight, b ? b.scrollHeight : 0)];";
