//! Suite executor
//!
//! One generic executor interprets scenario descriptors. Scenarios share
//! nothing: each gets its own browser session, opened lazily on its first
//! page step and closed when the scenario ends.

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use serde_json::Value;

use crate::browser::{Browser, PageSession};
use crate::common::config::{Config, Endpoints, Service, Timeouts};
use crate::common::{truncate, Error, Result};

use super::artifacts::ResultsDir;
use super::assertions::{check_json, check_page};
use super::config::{HttpMethod, Scenario, Step};
use super::report::ScenarioResult;

/// Everything a scenario needs to execute
pub struct RunContext {
    pub endpoints: Endpoints,
    pub timeouts: Timeouts,
    pub http: reqwest::Client,
    pub browser: Arc<dyn Browser>,
    pub results: ResultsDir,
    /// Maximum number of scenarios in flight
    pub concurrency: usize,
    /// Sessions of scenarios dropped mid-run, closed after an interrupt
    abandoned: Mutex<Vec<Box<dyn PageSession>>>,
}

impl RunContext {
    pub fn new(config: &Config, browser: Arc<dyn Browser>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoints: config.endpoints.clone(),
            timeouts: config.timeouts.clone(),
            http,
            browser,
            results: ResultsDir::new(config.results.dir.clone()),
            concurrency: 1,
            abandoned: Mutex::new(Vec::new()),
        })
    }

    /// Close sessions left behind by cancelled scenarios
    async fn close_abandoned(&self) {
        let sessions = match self.abandoned.lock() {
            Ok(mut abandoned) => std::mem::take(&mut *abandoned),
            Err(_) => return,
        };
        for page in sessions {
            match tokio::time::timeout(self.timeouts.request(), page.close()).await {
                Ok(Ok(())) => tracing::debug!("Closed session of interrupted scenario"),
                Ok(Err(e)) => tracing::warn!("Failed to close browser session: {}", e),
                Err(_) => tracing::warn!("Timed out closing browser session"),
            }
        }
    }

    /// Upper bound for a single step, after which the scenario is an Error
    fn step_timeout(&self, step: &Step) -> Duration {
        match step {
            Step::Page { .. } => self.timeouts.navigation() + self.timeouts.request(),
            Step::Api { .. } => self.timeouts.request(),
        }
    }
}

/// Run every scenario and return results in declaration order
pub async fn run_suite(ctx: &RunContext, scenarios: &[Scenario]) -> Vec<ScenarioResult> {
    run_suite_until(ctx, scenarios, std::future::pending()).await
}

/// Run scenarios until all finished or `interrupt` resolves
///
/// On interrupt the results finished so far are returned. Scenarios still in
/// flight are dropped and their browser sessions closed. Artifact writes are
/// atomic, so a dropped scenario leaves no partial file at a declared path.
pub async fn run_suite_until<F>(
    ctx: &RunContext,
    scenarios: &[Scenario],
    interrupt: F,
) -> Vec<ScenarioResult>
where
    F: Future<Output = ()>,
{
    let mut stream = Box::pin(
        futures_util::stream::iter(scenarios.iter().map(|s| run_scenario(ctx, s)))
            .buffered(ctx.concurrency.max(1)),
    );
    tokio::pin!(interrupt);
    let mut interrupted = false;

    let mut results = Vec::with_capacity(scenarios.len());
    loop {
        tokio::select! {
            next = stream.next() => match next {
                Some(result) => results.push(result),
                None => break,
            },
            _ = &mut interrupt => {
                tracing::warn!(completed = results.len(), "Suite interrupted");
                interrupted = true;
                break;
            }
        }
    }

    if interrupted {
        // Dropping the in-flight scenarios hands their sessions back to the context
        drop(stream);
        ctx.close_abandoned().await;
    }
    results
}

/// Run a single scenario to completion
pub async fn run_scenario(ctx: &RunContext, scenario: &Scenario) -> ScenarioResult {
    let started = Instant::now();
    let mut session = SessionSlot {
        page: None,
        abandoned: &ctx.abandoned,
    };
    let mut artifacts = Vec::new();
    let mut failure = None;

    tracing::debug!(scenario = %scenario.name, steps = scenario.steps.len(), "Running scenario");

    for (i, step) in scenario.steps.iter().enumerate() {
        let limit = ctx.step_timeout(step);
        let outcome = tokio::time::timeout(limit, execute_step(ctx, step, &mut session.page, &mut artifacts))
            .await
            .unwrap_or_else(|_| Err(Error::Timeout(limit.as_secs())));

        if let Err(e) = outcome {
            failure = Some((i + 1, e));
            break;
        }
    }

    if let Some(page) = session.page.take() {
        if let Err(e) = page.close().await {
            tracing::warn!(scenario = %scenario.name, "Failed to close browser session: {}", e);
        }
    }

    let result = match failure {
        None => {
            tracing::info!(scenario = %scenario.name, "Scenario passed");
            ScenarioResult::passed(&scenario.name, artifacts, started.elapsed())
        }
        Some((step, e)) => {
            tracing::warn!(scenario = %scenario.name, step, "Scenario did not pass: {}", e);
            ScenarioResult::stopped(&scenario.name, step, &e, artifacts, started.elapsed())
        }
    };
    result.print();
    result
}

/// The browser session of one running scenario
///
/// A scenario dropped before it finishes parks its session in the context
/// so it can still be closed.
struct SessionSlot<'a> {
    page: Option<Box<dyn PageSession>>,
    abandoned: &'a Mutex<Vec<Box<dyn PageSession>>>,
}

impl Drop for SessionSlot<'_> {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            if let Ok(mut abandoned) = self.abandoned.lock() {
                abandoned.push(page);
            }
        }
    }
}

/// Execute a single step
async fn execute_step(
    ctx: &RunContext,
    step: &Step,
    session: &mut Option<Box<dyn PageSession>>,
    artifacts: &mut Vec<PathBuf>,
) -> Result<()> {
    match step {
        Step::Page {
            service,
            path,
            wait_for_network_idle,
            expect,
            screenshot,
        } => {
            let url = ctx.endpoints.resolve(*service, path)?;

            if session.is_none() {
                *session = Some(ctx.browser.open().await?);
            }
            let page = session
                .as_mut()
                .ok_or_else(|| Error::Internal("browser session missing".to_string()))?;

            page.navigate(url.as_str()).await?;
            if *wait_for_network_idle {
                page.wait_for_network_idle(ctx.timeouts.network_idle(), ctx.timeouts.navigation())
                    .await?;
            }

            for assertion in expect {
                check_page(&mut **page, url.as_str(), assertion).await?;
            }

            if let Some(file) = screenshot {
                let png = page.screenshot_full_page().await?;
                artifacts.push(ctx.results.write_screenshot(file, &png)?);
            }
            Ok(())
        }
        Step::Api {
            service,
            path,
            method,
            body,
            expect_status,
            expect,
        } => {
            let json = fetch_json(ctx, *service, path, *method, body.as_ref(), *expect_status).await?;
            for assertion in expect {
                check_json(&json, assertion)?;
            }
            Ok(())
        }
    }
}

/// Issue an API request, check its status and parse the JSON body
async fn fetch_json(
    ctx: &RunContext,
    service: Service,
    path: &str,
    method: HttpMethod,
    body: Option<&Value>,
    expect_status: Option<u16>,
) -> Result<Value> {
    let url = ctx.endpoints.resolve(service, path)?;
    let target = url.to_string();

    let mut request = match method {
        HttpMethod::Get => ctx.http.get(url),
        HttpMethod::Post => ctx.http.post(url),
    };
    if let Some(body) = body {
        request = request.json(body);
    }

    let response = request
        .send()
        .await
        .map_err(|e| Error::from_http(&target, e))?;

    let status = response.status();
    match expect_status {
        Some(code) if status.as_u16() != code => {
            return Err(Error::assertion("status", code, status.as_u16()));
        }
        None if !status.is_success() => {
            return Err(Error::assertion("status", "2xx", status.as_u16()));
        }
        _ => {}
    }

    let text = response
        .text()
        .await
        .map_err(|e| Error::from_http(&target, e))?;

    serde_json::from_str(&text).map_err(|e| {
        Error::malformed(
            &target,
            format!("body is not JSON ({}): {}", e, truncate(&text, 80)),
        )
    })
}

/// Poll the API health route until it answers with a success status
pub async fn wait_healthy(ctx: &RunContext, timeout: Duration) -> Result<()> {
    let url = ctx.endpoints.resolve(Service::Api, "/health")?;
    let deadline = Instant::now() + timeout;

    loop {
        match ctx.http.get(url.clone()).send().await {
            Ok(r) if r.status().is_success() => return Ok(()),
            Ok(r) => tracing::debug!(status = %r.status(), "API not healthy yet"),
            Err(e) => tracing::debug!("API not reachable yet: {}", e),
        }

        if Instant::now() >= deadline {
            return Err(Error::unreachable(
                url.as_str(),
                format!("not healthy within {} seconds", timeout.as_secs()),
            ));
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}
