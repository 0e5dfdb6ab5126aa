//! Boundary between the core logic and the external programs it drives.

use std::path::Path;

use anyhow::{bail, Result};

use crate::discovery::search::SearchError;
use crate::process::{run_command, spawn_detached, RunOutput};

const LOCATE: &str = "locate";

/// Paths reported by the system file index, one per line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexerHits {
    lines: Vec<String>,
}

impl IndexerHits {
    #[must_use]
    pub fn from_output(stdout: &str) -> Self {
        Self {
            lines: stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

pub trait FileIndexer {
    /// Returns every indexed path whose name matches `file_name`.
    ///
    /// # Errors
    /// Returns [`SearchError`] when the index tool is missing or fails.
    fn locate(&self, file_name: &str) -> Result<IndexerHits, SearchError>;
}

pub trait EnvBuilder {
    /// Creates a virtual environment at `target` using `python`.
    ///
    /// # Errors
    /// Returns an error when the tool cannot be started or exits non-zero.
    fn create(&self, python: &str, target: &Path) -> Result<()>;
}

pub trait PackageInspector {
    /// Runs the environment's package manager in freeze mode.
    ///
    /// # Errors
    /// Returns an error when the interpreter cannot be started.
    fn freeze(&self, python: &Path, env: &Path) -> Result<RunOutput>;
}

pub trait TerminalSpawner {
    fn is_available(&self, program: &str) -> bool;

    /// Starts `program` detached with `cwd` as its working directory.
    ///
    /// # Errors
    /// Returns an error when the program cannot be spawned.
    fn spawn(&self, program: &str, args: &[String], cwd: &Path) -> Result<()>;
}

pub trait Effects {
    fn indexer(&self) -> &dyn FileIndexer;
    fn builder(&self) -> &dyn EnvBuilder;
    fn packages(&self) -> &dyn PackageInspector;
    fn terminal(&self) -> &dyn TerminalSpawner;
}

pub struct SystemEffects {
    indexer: SystemIndexer,
    builder: SystemEnvBuilder,
    packages: SystemPackageInspector,
    terminal: SystemTerminal,
}

impl SystemEffects {
    #[must_use]
    pub fn new() -> Self {
        Self {
            indexer: SystemIndexer,
            builder: SystemEnvBuilder,
            packages: SystemPackageInspector,
            terminal: SystemTerminal,
        }
    }
}

impl Default for SystemEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl Effects for SystemEffects {
    fn indexer(&self) -> &dyn FileIndexer {
        &self.indexer
    }

    fn builder(&self) -> &dyn EnvBuilder {
        &self.builder
    }

    fn packages(&self) -> &dyn PackageInspector {
        &self.packages
    }

    fn terminal(&self) -> &dyn TerminalSpawner {
        &self.terminal
    }
}

struct SystemIndexer;

impl FileIndexer for SystemIndexer {
    fn locate(&self, file_name: &str) -> Result<IndexerHits, SearchError> {
        let program = which::which(LOCATE).map_err(|_| SearchError::IndexerMissing {
            tool: LOCATE.to_string(),
        })?;
        let program = program.to_string_lossy().into_owned();
        let output = run_command(&program, &[file_name.to_string()], None).map_err(|err| {
            SearchError::IndexerFailed {
                tool: LOCATE.to_string(),
                message: format!("{err:#}"),
            }
        })?;
        locate_result(&output)
    }
}

// `locate` exits 1 with no output when nothing matches.
fn locate_result(output: &RunOutput) -> Result<IndexerHits, SearchError> {
    if output.success() {
        return Ok(IndexerHits::from_output(&output.stdout));
    }
    if output.code == 1 && output.stdout.trim().is_empty() && output.stderr.trim().is_empty() {
        return Ok(IndexerHits::default());
    }
    Err(SearchError::IndexerFailed {
        tool: LOCATE.to_string(),
        message: output.failure_summary(),
    })
}

struct SystemEnvBuilder;

impl EnvBuilder for SystemEnvBuilder {
    fn create(&self, python: &str, target: &Path) -> Result<()> {
        let args = vec![
            "-m".to_string(),
            "venv".to_string(),
            target.display().to_string(),
        ];
        let output = run_command(python, &args, None)?;
        if !output.success() {
            bail!("{python} -m venv {}", output.failure_summary());
        }
        Ok(())
    }
}

struct SystemPackageInspector;

impl PackageInspector for SystemPackageInspector {
    fn freeze(&self, python: &Path, env: &Path) -> Result<RunOutput> {
        let args = vec!["-m".to_string(), "pip".to_string(), "freeze".to_string()];
        run_command(&python.display().to_string(), &args, Some(env))
    }
}

struct SystemTerminal;

impl TerminalSpawner for SystemTerminal {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn spawn(&self, program: &str, args: &[String], cwd: &Path) -> Result<()> {
        spawn_detached(program, args, cwd)
    }
}
