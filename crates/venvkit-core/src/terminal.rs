//! Opening a terminal window positioned inside an environment.

use std::path::{Path, PathBuf};

use crate::discovery::Platform;
use crate::effects::TerminalSpawner;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Environment folder not found: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("no terminal emulator is configured")]
    NoTerminal,
    #[error("Failed to launch terminal: {0}")]
    SpawnFailed(String),
}

impl LaunchError {
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, LaunchError::MissingDirectory(_))
    }
}

/// One terminal emulator and the arguments that precede the command it
/// should run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerminalSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl TerminalSpec {
    #[must_use]
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|arg| (*arg).to_string()).collect(),
        }
    }

    /// Parses `program [args...]`, split on whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split_whitespace();
        let program = parts.next()?.to_string();
        Some(Self {
            program,
            args: parts.map(ToOwned::to_owned).collect(),
        })
    }

    #[must_use]
    pub fn command_args(&self, platform: Platform, env: &Path) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend(shell_invocation(platform, env));
        args
    }
}

/// Terminal emulators in order of preference. All but the last are skipped
/// when missing from `PATH`; the last one is always attempted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerminalChain {
    specs: Vec<TerminalSpec>,
}

impl TerminalChain {
    #[must_use]
    pub fn new(specs: Vec<TerminalSpec>) -> Self {
        Self { specs }
    }

    #[must_use]
    pub fn host_default() -> Self {
        Self::for_platform(Platform::host())
    }

    #[must_use]
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Unix => Self::new(vec![
                TerminalSpec::new("mate-terminal", &["--"]),
                TerminalSpec::new("gnome-terminal", &["--"]),
                TerminalSpec::new("konsole", &["-e"]),
                TerminalSpec::new("x-terminal-emulator", &["-e"]),
                TerminalSpec::new("xterm", &["-e"]),
            ]),
            Platform::Windows => Self::new(vec![TerminalSpec::new(
                "cmd",
                &["/C", "start", "cmd", "/K"],
            )]),
        }
    }

    /// Moves `spec` to the front of the chain.
    #[must_use]
    pub fn prefer(mut self, spec: TerminalSpec) -> Self {
        self.specs.retain(|existing| existing.program != spec.program);
        self.specs.insert(0, spec);
        self
    }

    #[must_use]
    pub fn specs(&self) -> &[TerminalSpec] {
        &self.specs
    }
}

#[must_use]
pub fn activation_hint(platform: Platform) -> &'static str {
    match platform {
        Platform::Unix => "To activate the virtual environment, run: source ./bin/activate",
        Platform::Windows => "To activate the virtual environment, run: Scripts\\activate.bat",
    }
}

fn shell_invocation(platform: Platform, env: &Path) -> Vec<String> {
    let hint = activation_hint(platform);
    match platform {
        Platform::Unix => vec![
            "bash".to_string(),
            "-c".to_string(),
            format!(
                "cd {} && echo \"{hint}\" && exec bash -i",
                shell_quote(&env.display().to_string())
            ),
        ],
        Platform::Windows => vec![format!("cd /d \"{}\" && echo {hint}", env.display())],
    }
}

/// Quotes `arg` for a POSIX shell.
#[must_use]
pub fn shell_quote(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    let safe = arg.chars().all(|ch| {
        matches!(
            ch,
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' | '.' | '/' | ':' | '@' | '+' | '=' | ','
        )
    });
    if safe {
        return arg.to_string();
    }
    let escaped = arg.replace('\'', "'\"'\"'");
    format!("'{escaped}'")
}

/// Starts a detached terminal in `env` that prints the activation hint and
/// then runs an interactive shell. Returns the emulator that was started.
///
/// # Errors
/// Returns [`LaunchError`] when `env` is not a directory or no candidate in
/// the chain could be spawned.
pub fn launch_terminal(
    chain: &TerminalChain,
    spawner: &dyn TerminalSpawner,
    platform: Platform,
    env: &Path,
) -> Result<String, LaunchError> {
    if !env.is_dir() {
        return Err(LaunchError::MissingDirectory(env.to_path_buf()));
    }
    let specs = chain.specs();
    let Some(fallback) = specs.len().checked_sub(1) else {
        return Err(LaunchError::NoTerminal);
    };
    let mut failures = Vec::new();
    for (idx, spec) in specs.iter().enumerate() {
        if idx != fallback && !spawner.is_available(&spec.program) {
            continue;
        }
        let args = spec.command_args(platform, env);
        match spawner.spawn(&spec.program, &args, env) {
            Ok(()) => {
                tracing::info!(terminal = %spec.program, env = %env.display(), "launched terminal");
                return Ok(spec.program.clone());
            }
            Err(err) => {
                tracing::debug!(terminal = %spec.program, error = %format!("{err:#}"), "terminal did not start");
                failures.push(format!("{err:#}"));
            }
        }
    }
    Err(LaunchError::SpawnFailed(failures.join("; ")))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;

    use anyhow::{bail, Result};
    use tempfile::tempdir;

    use super::*;

    #[derive(Default)]
    struct FakeSpawner {
        available: HashSet<String>,
        broken: HashSet<String>,
        spawned: RefCell<Vec<(String, Vec<String>, PathBuf)>>,
    }

    impl FakeSpawner {
        fn with_available(programs: &[&str]) -> Self {
            Self {
                available: programs.iter().map(|p| (*p).to_string()).collect(),
                ..Self::default()
            }
        }
    }

    impl TerminalSpawner for FakeSpawner {
        fn is_available(&self, program: &str) -> bool {
            self.available.contains(program)
        }

        fn spawn(&self, program: &str, args: &[String], cwd: &Path) -> Result<()> {
            if self.broken.contains(program) || !self.available.contains(program) {
                bail!("failed to start {program}");
            }
            self.spawned
                .borrow_mut()
                .push((program.to_string(), args.to_vec(), cwd.to_path_buf()));
            Ok(())
        }
    }

    #[test]
    fn missing_directory_is_rejected_before_spawning() {
        let spawner = FakeSpawner::with_available(&["xterm"]);
        let err = launch_terminal(
            &TerminalChain::for_platform(Platform::Unix),
            &spawner,
            Platform::Unix,
            Path::new("/definitely/not/here"),
        )
        .expect_err("missing directory");
        assert!(err.is_user_error());
        assert!(err.to_string().starts_with("Environment folder not found"));
        assert!(spawner.spawned.borrow().is_empty());
    }

    #[test]
    fn first_available_candidate_wins() -> Result<()> {
        let temp = tempdir()?;
        let spawner = FakeSpawner::with_available(&["konsole", "xterm"]);
        let program = launch_terminal(
            &TerminalChain::for_platform(Platform::Unix),
            &spawner,
            Platform::Unix,
            temp.path(),
        )?;
        assert_eq!(program, "konsole");

        let spawned = spawner.spawned.borrow();
        let (_, args, cwd) = &spawned[0];
        assert_eq!(cwd, temp.path());
        assert_eq!(&args[..3], ["-e", "bash", "-c"]);
        assert!(args[3].contains("exec bash -i"));
        assert!(args[3].contains(activation_hint(Platform::Unix)));
        Ok(())
    }

    #[test]
    fn spawn_failure_moves_to_next_candidate() -> Result<()> {
        let temp = tempdir()?;
        let mut spawner = FakeSpawner::with_available(&["mate-terminal", "xterm"]);
        spawner.broken.insert("mate-terminal".to_string());
        let program = launch_terminal(
            &TerminalChain::for_platform(Platform::Unix),
            &spawner,
            Platform::Unix,
            temp.path(),
        )?;
        assert_eq!(program, "xterm");
        Ok(())
    }

    #[test]
    fn fallback_is_attempted_even_when_not_found() -> Result<()> {
        let temp = tempdir()?;
        let spawner = FakeSpawner::default();
        let err = launch_terminal(
            &TerminalChain::for_platform(Platform::Unix),
            &spawner,
            Platform::Unix,
            temp.path(),
        )
        .expect_err("nothing can start");
        assert!(matches!(err, LaunchError::SpawnFailed(ref msg) if msg.contains("xterm")));
        Ok(())
    }

    #[test]
    fn empty_chain_reports_no_terminal() -> Result<()> {
        let temp = tempdir()?;
        let err = launch_terminal(
            &TerminalChain::new(Vec::new()),
            &FakeSpawner::default(),
            Platform::Unix,
            temp.path(),
        )
        .expect_err("empty chain");
        assert!(matches!(err, LaunchError::NoTerminal));
        Ok(())
    }

    #[test]
    fn preferred_spec_replaces_existing_entry() {
        let chain = TerminalChain::for_platform(Platform::Unix)
            .prefer(TerminalSpec::new("xterm", &["-hold", "-e"]));
        let programs: Vec<&str> = chain.specs().iter().map(|s| s.program.as_str()).collect();
        assert_eq!(programs[0], "xterm");
        assert_eq!(programs.iter().filter(|p| **p == "xterm").count(), 1);
        assert_eq!(chain.specs()[0].args, vec!["-hold", "-e"]);
    }

    #[test]
    fn unix_command_quotes_the_path() {
        let spec = TerminalSpec::new("xterm", &["-e"]);
        let args = spec.command_args(Platform::Unix, Path::new("/home/u/my env's"));
        assert_eq!(
            args[3],
            "cd '/home/u/my env'\"'\"'s' && echo \"To activate the virtual environment, run: source ./bin/activate\" && exec bash -i"
        );
    }

    #[test]
    fn windows_command_changes_drive_and_directory() {
        let chain = TerminalChain::for_platform(Platform::Windows);
        let args = chain.specs()[0].command_args(Platform::Windows, Path::new(r"C:\envs\a"));
        assert_eq!(&args[..4], ["/C", "start", "cmd", "/K"]);
        assert!(args[4].starts_with(r#"cd /d "C:\envs\a" && echo "#));
        assert!(args[4].ends_with(r"Scripts\activate.bat"));
    }

    #[test]
    fn shell_quote_leaves_plain_paths_alone() {
        assert_eq!(shell_quote("/home/u/envs/a-1"), "/home/u/envs/a-1");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("a b"), "'a b'");
    }

    #[test]
    fn parse_splits_program_and_args() {
        assert_eq!(
            TerminalSpec::parse("  kitty  --single-instance "),
            Some(TerminalSpec::new("kitty", &["--single-instance"]))
        );
        assert_eq!(TerminalSpec::parse("   "), None);
    }
}
