//! PrintKe CLI - operations wrapper and smoke-test harness
//!
//! Starts, stops and maintains the PrintKe service fleet by delegating to
//! helper scripts and the container orchestration CLI, and verifies a
//! running deployment with an end-to-end smoke suite.

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::Parser;
use printke::common::config::Config;
use printke::{cli, commands::Cli, ops, Error};

/// Exit code for usage errors, matching clap
const USAGE: i32 = 2;

/// Exit code when a delegated program does not exist, matching shells
const NOT_FOUND: i32 = 127;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::InvalidSubcommand => {
                let name = match e.get(ContextKind::InvalidSubcommand) {
                    Some(ContextValue::String(name)) => name.clone(),
                    _ => String::new(),
                };
                eprintln!("Unknown operation '{}'\n\n{}", name, ops::usage());
                std::process::exit(USAGE);
            }
            ErrorKind::MissingSubcommand | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                eprintln!("{}", ops::usage());
                std::process::exit(USAGE);
            }
            _ => e.exit(),
        },
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match cli::dispatch(cli.command, config).await {
        Ok(code) => std::process::exit(code),
        Err(e @ Error::ProgramNotFound(_)) => {
            eprintln!("Error: {e}");
            std::process::exit(NOT_FOUND);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
