//! Logging and tracing configuration
//!
//! The CLI logs compactly to stderr. A suite run additionally mirrors its
//! events into `suite.log` inside the results directory.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use super::paths;

fn default_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "printke=debug,warn" } else { "printke=info,warn" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
pub fn init_cli() {
    tracing_subscriber::registry()
        .with(default_filter(false))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Initialize tracing for a suite run (stderr + results log file)
///
/// The returned guard must be held until the run finishes so buffered log
/// lines are flushed. Falls back to stderr only if the results directory
/// cannot be created. `verbose` lowers the default level to DEBUG.
pub fn init_suite(results_dir: &Path, verbose: bool) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(results_dir) {
        eprintln!("Warning: Could not create results directory: {}", e);
        tracing_subscriber::registry()
            .with(default_filter(verbose))
            .with(stderr_layer())
            .init();
        return None;
    }

    let appender = tracing_appender::rolling::never(results_dir, paths::SUITE_LOG);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(file_layer)
        .with(stderr_layer())
        .init();

    Some(guard)
}

fn stderr_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .compact()
}
