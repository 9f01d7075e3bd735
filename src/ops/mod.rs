//! Operations wrapper
//!
//! Maps each named [`Operation`] onto an external invocation: a helper
//! script, the container orchestration CLI, or this binary's own suite
//! runner. Only `clean` asks before acting, because it deletes volumes.

mod process;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::commands::Operation;
use crate::common::config::OpsConfig;
use crate::common::Result;

pub use process::{exit_code, CommandRunner, SystemRunner};

/// A fully resolved external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<P, I, S>(program: P, args: I) -> Self
    where
        P: Into<PathBuf>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// The external command an operation delegates to
///
/// `exe` is this binary, used by `test` to run the suite in a child process.
pub fn invocation(op: Operation, config: &OpsConfig, exe: &Path) -> Invocation {
    let script = |name: &str| Invocation::new(config.scripts_dir.join(name), Vec::<String>::new());

    match op {
        Operation::Start => script("start.sh"),
        Operation::Stop => script("stop.sh"),
        Operation::Backup => script("backup-db.sh"),
        Operation::Restore => script("restore-db.sh"),
        Operation::Restart => compose(config, ["restart"]),
        Operation::Logs => compose(config, ["logs", "-f"]),
        Operation::Ps => compose(config, ["ps"]),
        Operation::Build => compose(config, ["build", "--no-cache"]),
        Operation::Clean => compose(config, ["down", "-v"]),
        Operation::Test => Invocation::new(exe, ["suite"]),
    }
}

fn compose<const N: usize>(config: &OpsConfig, action: [&str; N]) -> Invocation {
    let mut parts = config.compose_command.iter().cloned();
    let program = parts.next().unwrap_or_else(|| "docker".to_string());

    let mut args: Vec<String> = parts.collect();
    if let Some(file) = &config.compose_file {
        args.push("-f".to_string());
        args.push(file.display().to_string());
    }
    args.extend(action.iter().map(|a| a.to_string()));

    Invocation::new(program, args)
}

/// Ask for confirmation; only an explicit `y` or `Y` counts as yes
pub fn confirm(prompt: &str, input: &mut dyn BufRead, output: &mut dyn Write) -> std::io::Result<bool> {
    write!(output, "{} [y/N] ", prompt)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y"))
}

/// Run an operation and return the exit code to propagate
pub async fn dispatch(
    op: Operation,
    config: &OpsConfig,
    exe: &Path,
    runner: &dyn CommandRunner,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<i32> {
    let invocation = invocation(op, config, exe);

    if op == Operation::Clean {
        let prompt = format!(
            "{} This stops all services and deletes their volumes. Continue?",
            "WARNING:".red().bold()
        );
        if !confirm(&prompt, input, output)? {
            writeln!(output, "Cancelled.")?;
            return Ok(0);
        }
    }

    tracing::info!(operation = op.name(), command = %invocation, "Running operation");
    let code = runner.run(&invocation).await?;
    if code != 0 {
        tracing::warn!(operation = op.name(), code, "Operation exited with non-zero status");
    }
    Ok(code)
}

/// Usage text listing every operation with its description
pub fn usage() -> String {
    use clap::CommandFactory;
    crate::commands::Cli::command().render_help().to_string()
}
