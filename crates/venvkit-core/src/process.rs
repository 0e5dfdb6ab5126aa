use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// First non-empty stderr line, falling back to the exit code.
    #[must_use]
    pub fn failure_summary(&self) -> String {
        self.stderr
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map_or_else(
                || format!("exited with status {}", self.code),
                |line| format!("exited with status {}: {line}", self.code),
            )
    }
}

/// Execute a program and capture stdout/stderr.
///
/// # Errors
///
/// Returns an error when the program cannot be spawned or its output cannot
/// be collected.
pub fn run_command(program: &str, args: &[String], cwd: Option<&Path>) -> Result<RunOutput> {
    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    command.stdin(Stdio::null());
    tracing::debug!(program, ?args, "running command");

    let output = command
        .output()
        .with_context(|| format!("failed to start {program}"))?;
    Ok(RunOutput {
        code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Start a program without waiting for it. The child is not tracked after
/// it has been spawned.
///
/// # Errors
///
/// Returns an error when the program cannot be spawned.
pub fn spawn_detached(program: &str, args: &[String], cwd: &Path) -> Result<()> {
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    tracing::debug!(program, ?args, cwd = %cwd.display(), "spawning detached");
    command
        .spawn()
        .with_context(|| format!("failed to start {program}"))?;
    Ok(())
}
