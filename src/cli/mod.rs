//! CLI command handling
//!
//! Dispatches parsed commands to the operations wrapper or the suite runner
//! and returns the process exit code.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use colored::Colorize;

use crate::browser::WebDriver;
use crate::commands::{Commands, SuiteArgs};
use crate::common::config::Config;
use crate::common::{logging, Error, Result};
use crate::ops::{self, SystemRunner};
use crate::testing::{self, RunContext, Suite, SuiteReport};

/// Exit code of a suite stopped with Ctrl-C
const INTERRUPTED: i32 = 130;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: Config) -> Result<i32> {
    match command {
        Commands::Op(op) => {
            logging::init_cli();
            let exe = std::env::current_exe().map_err(|e| {
                Error::Internal(format!("Failed to get current executable path: {}", e))
            })?;

            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut output = std::io::stdout();
            ops::dispatch(op, &config.ops, &exe, &SystemRunner, &mut input, &mut output).await
        }
        Commands::Suite(args) => run_suite(args, config).await,
    }
}

/// Execute the smoke suite and print the report
async fn run_suite(args: SuiteArgs, mut config: Config) -> Result<i32> {
    let suite = match &args.scenarios {
        Some(path) => Suite::load(path)?,
        None => Suite::builtin()?,
    };
    let declared = suite.scenarios.len();
    let scenarios = suite.filtered(args.filter.as_deref());

    if args.list {
        for scenario in &scenarios {
            println!(
                "{:<20} {}",
                scenario.name,
                scenario.description.as_deref().unwrap_or_default().dimmed()
            );
        }
        return Ok(0);
    }

    if scenarios.is_empty() {
        return Err(Error::Config(format!(
            "No scenarios match filter {:?} ({} declared)",
            args.filter.as_deref().unwrap_or_default(),
            declared
        )));
    }

    if let Some(dir) = args.results_dir {
        config.results.dir = dir;
    }
    let _log_guard = logging::init_suite(&config.results.dir, args.verbose);

    let browser = Arc::new(WebDriver::new(&config)?);
    let mut ctx = RunContext::new(&config, browser)?;
    ctx.concurrency = args.concurrency.max(1);

    if let Some(secs) = args.wait_healthy {
        println!("{} {}", "Waiting for API health...".cyan(), config.endpoints.api_url.dimmed());
        testing::wait_healthy(&ctx, Duration::from_secs(secs)).await?;
    }

    println!(
        "\n{} {} scenario(s) against {}",
        "Running smoke suite:".blue().bold(),
        scenarios.len(),
        config.endpoints.api_url.white().bold()
    );

    let started = SystemTime::now();
    let interrupt = until_interrupted(tokio::signal::ctrl_c());
    let results = testing::run_suite_until(&ctx, &scenarios, interrupt).await;
    let interrupted = results.len() < scenarios.len();

    let report = SuiteReport::new(results, scenarios.len(), started);
    match ctx.results.write_report(&report) {
        Ok(path) => tracing::info!(path = %path.display(), "Wrote suite report"),
        Err(e) => tracing::warn!("Could not write suite report: {}", e),
    }
    report.print_summary();

    Ok(if interrupted {
        INTERRUPTED
    } else {
        report.exit_code()
    })
}

/// Resolve once `signal` fires
///
/// If the handler cannot be installed the run is never treated as interrupted.
async fn until_interrupted<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
