//! Rendered-page access for page scenarios
//!
//! The suite talks to pages through the [`Browser`] and [`PageSession`]
//! traits. The production implementation drives a real browser through a
//! W3C WebDriver server.

pub mod client;
pub mod types;

use async_trait::async_trait;
use std::time::Duration;

use crate::common::Result;

pub use client::WebDriver;
pub use types::Locator;

/// What the suite needs to know about a located element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementState {
    /// Rendered text of the element
    pub text: String,
    /// Whether the element is displayed
    pub displayed: bool,
}

/// Opens isolated page sessions
#[async_trait]
pub trait Browser: Send + Sync {
    /// Open a fresh session with no cookies or history
    async fn open(&self) -> Result<Box<dyn PageSession>>;
}

/// One browser session, owned by a single scenario
#[async_trait]
pub trait PageSession: Send {
    /// Navigate to `url` and wait for the load event
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Suspend until no network activity was seen for `quiet`
    async fn wait_for_network_idle(&mut self, quiet: Duration, timeout: Duration) -> Result<()>;

    /// Current document title
    async fn title(&mut self) -> Result<String>;

    /// Locate an element matching `locator`
    ///
    /// The first displayed match wins, otherwise the first match is returned
    /// as hidden. `None` if nothing matches.
    async fn find(&mut self, locator: &Locator) -> Result<Option<ElementState>>;

    /// PNG bytes of the whole scrollable page
    async fn screenshot_full_page(&mut self) -> Result<Vec<u8>>;

    /// End the session
    async fn close(self: Box<Self>) -> Result<()>;
}
