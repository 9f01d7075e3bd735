//! CLI command definitions
//!
//! Defines the clap commands for the PrintKe CLI.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "printke", about = "PrintKe platform operations and smoke tests")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Op(Operation),

    /// [Hidden] Run the smoke suite in-process - invoked by `test`
    #[command(hide = true)]
    Suite(SuiteArgs),
}

/// Named management operations
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Start all services (delegates to scripts/start.sh)
    Start,

    /// Stop all services (delegates to scripts/stop.sh)
    Stop,

    /// Restart all services
    Restart,

    /// Follow combined logs of all services until interrupted
    Logs,

    /// Show the status of all services
    Ps,

    /// Rebuild all service images without cache
    Build,

    /// Stop all services and DELETE their volumes (asks for confirmation)
    Clean,

    /// Back up the database (delegates to scripts/backup-db.sh)
    Backup,

    /// Restore the database (delegates to scripts/restore-db.sh)
    Restore,

    /// Run the end-to-end smoke suite
    Test,
}

impl Operation {
    /// Every operation, in help order
    pub const ALL: [Operation; 10] = [
        Operation::Start,
        Operation::Stop,
        Operation::Restart,
        Operation::Logs,
        Operation::Ps,
        Operation::Build,
        Operation::Clean,
        Operation::Backup,
        Operation::Restore,
        Operation::Test,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Start => "start",
            Operation::Stop => "stop",
            Operation::Restart => "restart",
            Operation::Logs => "logs",
            Operation::Ps => "ps",
            Operation::Build => "build",
            Operation::Clean => "clean",
            Operation::Backup => "backup",
            Operation::Restore => "restore",
            Operation::Test => "test",
        }
    }

    /// Look an operation up by its command name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }
}

/// Options of the hidden `suite` command
#[derive(Args, Debug, Default)]
pub struct SuiteArgs {
    /// YAML suite to run instead of the built-in smoke suite
    #[arg(long)]
    pub scenarios: Option<PathBuf>,

    /// Only run scenarios whose name contains this text
    #[arg(long)]
    pub filter: Option<String>,

    /// List scenarios and exit
    #[arg(long)]
    pub list: bool,

    /// Number of scenarios run at the same time
    #[arg(long, default_value = "1")]
    pub concurrency: usize,

    /// Directory for screenshots, log and report (overrides config)
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Wait up to N seconds for the API health route before running
    #[arg(long, value_name = "SECS")]
    pub wait_healthy: Option<u64>,

    /// Log step-level detail (same as RUST_LOG=printke=debug)
    #[arg(short, long)]
    pub verbose: bool,
}
