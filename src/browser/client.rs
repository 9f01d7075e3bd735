//! WebDriver client for driving a headless browser
//!
//! Speaks the W3C WebDriver HTTP protocol to chromedriver or geckodriver.
//! Each [`WebDriverSession`] maps to one browser session.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Method;
use serde_json::{json, Value};

use crate::common::config::{BrowserConfig, Config, Timeouts};
use crate::common::{Error, Result};

use super::types::*;
use super::{Browser, ElementState, PageSession};

/// Tallest page we resize the window to for a full-page capture
const MAX_CAPTURE_HEIGHT: u64 = 16_384;

/// Interval between network idle probes
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Outcome of a WebDriver command at the protocol level
enum Reply {
    Ok(Value),
    Failed(WireError),
}

/// Connection settings shared by all sessions
#[derive(Clone)]
struct Wire {
    http: reqwest::Client,
    server: String,
    request_secs: u64,
}

impl Wire {
    /// Send a command and return the unwrapped `value`
    async fn send(&self, method: Method, url: &str, name: &str, body: Option<Value>) -> Result<Reply> {
        tracing::debug!(command = name, url, "WebDriver request");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                Error::WebDriverUnavailable(self.server.clone())
            } else if e.is_timeout() {
                Error::Timeout(self.request_secs)
            } else {
                Error::webdriver(name, e)
            }
        })?;

        let status = response.status();
        let payload: WireResponse = response
            .json()
            .await
            .map_err(|e| Error::webdriver(name, format!("invalid response: {}", e)))?;

        if status.is_success() {
            Ok(Reply::Ok(payload.value))
        } else {
            let err: WireError = serde_json::from_value(payload.value).map_err(|_| {
                Error::webdriver(name, format!("HTTP {} without error payload", status))
            })?;
            tracing::debug!(command = name, error = %err, "WebDriver error");
            Ok(Reply::Failed(err))
        }
    }

    /// Send a command, treating any WebDriver error as fatal
    async fn call(&self, method: Method, url: &str, name: &str, body: Option<Value>) -> Result<Value> {
        match self.send(method, url, name, body).await? {
            Reply::Ok(value) => Ok(value),
            Reply::Failed(err) if err.is_timeout() => Err(Error::Timeout(self.request_secs)),
            Reply::Failed(err) => Err(Error::webdriver(name, err)),
        }
    }
}

/// Browser backed by a running WebDriver server
pub struct WebDriver {
    wire: Wire,
    browser: BrowserConfig,
    timeouts: Timeouts,
}

impl WebDriver {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.navigation() + config.timeouts.request())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            wire: Wire {
                http,
                server: config.browser.webdriver_url.trim_end_matches('/').to_string(),
                request_secs: config.timeouts.request_secs,
            },
            browser: config.browser.clone(),
            timeouts: config.timeouts.clone(),
        })
    }
}

#[async_trait]
impl Browser for WebDriver {
    async fn open(&self) -> Result<Box<dyn PageSession>> {
        let url = format!("{}/session", self.wire.server);
        let value = self
            .wire
            .call(Method::POST, &url, "new session", Some(capabilities(&self.browser)))
            .await?;
        let session: NewSession = serde_json::from_value(value)
            .map_err(|e| Error::webdriver("new session", format!("unexpected payload: {}", e)))?;

        tracing::debug!(session = %session.session_id, "Opened browser session");

        let page = WebDriverSession {
            wire: self.wire.clone(),
            session_url: format!("{}/session/{}", self.wire.server, session.session_id),
            current_url: String::new(),
            window: (self.browser.window_width, self.browser.window_height),
            navigation_secs: self.timeouts.navigation_secs,
        };

        // Implicit wait makes element lookups poll until the element shows up
        let timeouts = json!({
            "implicit": self.timeouts.element().as_millis() as u64,
            "pageLoad": self.timeouts.navigation().as_millis() as u64,
            "script": self.timeouts.request().as_millis() as u64,
        });
        let setup = match page.post("timeouts", "/timeouts", timeouts).await {
            Ok(_) => page.resize(page.window.0 as u64, page.window.1 as u64).await,
            Err(e) => Err(e),
        };
        if let Err(e) = setup {
            let _ = Box::new(page).close().await;
            return Err(e);
        }

        Ok(Box::new(page))
    }
}

/// A single WebDriver browser session
pub struct WebDriverSession {
    wire: Wire,
    session_url: String,
    current_url: String,
    window: (u32, u32),
    navigation_secs: u64,
}

impl WebDriverSession {
    async fn get(&self, name: &str, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.session_url, path);
        self.wire.call(Method::GET, &url, name, None).await
    }

    async fn post(&self, name: &str, path: &str, body: Value) -> Result<Value> {
        let url = format!("{}{}", self.session_url, path);
        self.wire.call(Method::POST, &url, name, Some(body)).await
    }

    async fn execute(&self, script: &str) -> Result<Value> {
        self.post("execute script", "/execute/sync", json!({ "script": script, "args": [] }))
            .await
    }

    async fn resize(&self, width: u64, height: u64) -> Result<()> {
        self.post(
            "set window rect",
            "/window/rect",
            json!({ "width": width, "height": height }),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl PageSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.current_url = url.to_string();
        let endpoint = format!("{}/url", self.session_url);
        match self
            .wire
            .send(Method::POST, &endpoint, "navigate", Some(json!({ "url": url })))
            .await?
        {
            Reply::Ok(_) => Ok(()),
            Reply::Failed(err) if err.is_network_failure() => Err(Error::unreachable(url, err)),
            Reply::Failed(err) if err.is_timeout() => Err(Error::Timeout(self.navigation_secs)),
            Reply::Failed(err) => Err(Error::webdriver("navigate", err)),
        }
    }

    async fn wait_for_network_idle(&mut self, quiet: Duration, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();

        loop {
            let probe = self.execute(NETWORK_PROBE).await?;
            let ready = probe[0].as_str() == Some("complete");
            let count = probe[1].as_u64();

            if !ready || count != last_count {
                last_count = count;
                quiet_since = Instant::now();
            } else if quiet_since.elapsed() >= quiet {
                tracing::debug!(url = %self.current_url, resources = ?count, "Network idle");
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(Error::Timeout(timeout.as_secs()));
            }
            tokio::time::sleep(IDLE_POLL).await;
        }
    }

    async fn title(&mut self) -> Result<String> {
        let value = self.get("get title", "/title").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn find(&mut self, locator: &Locator) -> Result<Option<ElementState>> {
        let endpoint = format!("{}/elements", self.session_url);
        let found = match self
            .wire
            .send(Method::POST, &endpoint, "find elements", Some(locator.to_wire()))
            .await?
        {
            Reply::Ok(value) => value,
            Reply::Failed(err) if err.error == NO_SUCH_ELEMENT => return Ok(None),
            Reply::Failed(err) => return Err(Error::webdriver("find elements", err)),
        };

        let ids = found
            .as_array()
            .map(|refs| {
                refs.iter()
                    .filter_map(|r| r[ELEMENT_KEY].as_str().map(str::to_string))
                    .take(MAX_CANDIDATES)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        // Hidden duplicates (collapsed menus, templates) may precede the visible match
        let mut first_hidden = None;
        for id in ids {
            let displayed = self
                .get("is element displayed", &format!("/element/{}/displayed", id))
                .await?
                .as_bool()
                .unwrap_or(false);
            if displayed || first_hidden.is_none() {
                let text = self.get("get element text", &format!("/element/{}/text", id)).await?;
                let state = ElementState {
                    text: text.as_str().unwrap_or_default().to_string(),
                    displayed,
                };
                if displayed {
                    return Ok(Some(state));
                }
                first_hidden = Some(state);
            }
        }
        Ok(first_hidden)
    }

    async fn screenshot_full_page(&mut self) -> Result<Vec<u8>> {
        let size = self.execute(DOCUMENT_SIZE).await?;
        let width = size[0].as_u64().unwrap_or(self.window.0 as u64).max(self.window.0 as u64);
        let height = size[1]
            .as_u64()
            .unwrap_or(self.window.1 as u64)
            .clamp(self.window.1 as u64, MAX_CAPTURE_HEIGHT);

        self.resize(width, height).await?;
        let shot = self.get("take screenshot", "/screenshot").await;
        if let Err(e) = self.resize(self.window.0 as u64, self.window.1 as u64).await {
            tracing::warn!(url = %self.current_url, "Could not restore window size: {}", e);
        }

        let encoded = shot?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_str().unwrap_or_default())
            .map_err(|e| Error::webdriver("take screenshot", format!("invalid image data: {}", e)))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.wire
            .call(Method::DELETE, &self.session_url, "delete session", None)
            .await
            .map(|_| ())
    }
}
