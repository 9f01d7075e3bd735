//! Process execution for delegated operations

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::process::Command as TokioCommand;

use crate::common::{Error, Result};

use super::Invocation;

/// Runs an external invocation and reports its exit code
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<i32>;
}

/// Runs invocations as child processes with inherited stdio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<i32> {
        let program = resolve_program(&invocation.program)?;
        tracing::debug!(program = %program.display(), args = ?invocation.args, "Spawning");

        let mut child = TokioCommand::new(&program)
            .args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::SpawnFailed {
                program: program.display().to_string(),
                error: e.to_string(),
            })?;

        // The child shares our process group, so Ctrl-C reaches it too;
        // we only wait for it to wind down.
        let status = tokio::select! {
            status = child.wait() => status?,
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("Interrupted, waiting for child to exit");
                child.wait().await?
            }
        };

        Ok(exit_code(status))
    }
}

/// Locate a program: explicit paths must exist, bare names are looked up on PATH
fn resolve_program(program: &Path) -> Result<PathBuf> {
    let name = program.display().to_string();
    if program.components().count() > 1 || program.is_absolute() {
        if program.exists() {
            Ok(program.to_path_buf())
        } else {
            Err(Error::ProgramNotFound(name))
        }
    } else {
        which::which(program).map_err(|_| Error::ProgramNotFound(name))
    }
}

/// Exit code of a finished child; signals map to 128 + signal on Unix
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_script_is_not_found() {
        let err = resolve_program(Path::new("scripts/does-not-exist.sh")).unwrap_err();
        assert!(matches!(err, Error::ProgramNotFound(_)));
    }

    #[test]
    fn test_missing_binary_is_not_found() {
        let err = resolve_program(Path::new("printke-no-such-program")).unwrap_err();
        assert!(matches!(err, Error::ProgramNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_propagated() {
        let runner = SystemRunner;
        let invocation = Invocation::new("sh", ["-c", "exit 3"]);
        assert_eq!(runner.run(&invocation).await.unwrap(), 3);

        let ok = Invocation::new("true", Vec::<String>::new());
        assert_eq!(runner.run(&ok).await.unwrap(), 0);
    }
}
