//! Global options and the configuration snapshot every command runs against.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};

use crate::discovery::Platform;
use crate::terminal::{TerminalChain, TerminalSpec};

pub const DEFAULT_LOG_FILENAME: &str = "venv_log.json";
const DEFAULT_ENV_DIRNAME: &str = "virtualenvs";

const LOG_ENV: &str = "VENVKIT_LOG";
const ENV_DIR_ENV: &str = "VENVKIT_ENV_DIR";
const CREATE_DIR_ENV: &str = "VENVKIT_CREATE_DIR";
const PYTHON_ENV: &str = "VENVKIT_PYTHON";
const TERMINAL_ENV: &str = "VENVKIT_TERMINAL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
    pub no_color: bool,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    #[must_use]
    pub fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    #[must_use]
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    fn path_var(&self, key: &str) -> Option<PathBuf> {
        self.var(key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    log_path: PathBuf,
    env_dir: PathBuf,
    create_dir: PathBuf,
    python: Option<String>,
    terminals: TerminalChain,
    platform: Platform,
}

impl Config {
    /// Builds the configuration from the current process environment.
    ///
    /// # Errors
    /// Returns an error if the working directory or home directory cannot be
    /// resolved when a default depends on them.
    pub fn from_env(global: &GlobalOptions) -> Result<Self> {
        Self::from_snapshot(&EnvSnapshot::capture(), global)
    }

    /// Builds the configuration from a captured environment.
    ///
    /// # Errors
    /// Returns an error if the working directory or home directory cannot be
    /// resolved when a default depends on them.
    pub fn from_snapshot(snapshot: &EnvSnapshot, global: &GlobalOptions) -> Result<Self> {
        let home = || home_dir().ok_or_else(|| anyhow!("home directory not found"));

        let log_path = match global
            .log_file
            .clone()
            .or_else(|| snapshot.path_var(LOG_ENV))
        {
            Some(path) => path,
            None => env::current_dir()
                .context("unable to determine the working directory")?
                .join(DEFAULT_LOG_FILENAME),
        };
        let env_dir = match snapshot.path_var(ENV_DIR_ENV) {
            Some(path) => path,
            None => home()
                .with_context(|| format!("set {ENV_DIR_ENV} to choose the scan directory"))?
                .join(DEFAULT_ENV_DIRNAME),
        };
        let create_dir = match snapshot.path_var(CREATE_DIR_ENV) {
            Some(path) => path,
            None => home()
                .with_context(|| format!("set {CREATE_DIR_ENV} to choose where to create"))?,
        };
        let python = snapshot
            .var(PYTHON_ENV)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned);

        let mut terminals = TerminalChain::host_default();
        if let Some(preferred) = snapshot.var(TERMINAL_ENV).and_then(TerminalSpec::parse) {
            terminals = terminals.prefer(preferred);
        }

        Ok(Self {
            log_path,
            env_dir,
            create_dir,
            python,
            terminals,
            platform: Platform::host(),
        })
    }

    /// Assembles a configuration from explicit parts.
    #[must_use]
    pub fn new(
        log_path: PathBuf,
        env_dir: PathBuf,
        create_dir: PathBuf,
        platform: Platform,
    ) -> Self {
        Self {
            log_path,
            env_dir,
            create_dir,
            python: None,
            terminals: TerminalChain::for_platform(platform),
            platform,
        }
    }

    #[must_use]
    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = Some(python.into());
        self
    }

    #[must_use]
    pub fn with_terminals(mut self, terminals: TerminalChain) -> Self {
        self.terminals = terminals;
        self
    }

    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    #[must_use]
    pub fn env_dir(&self) -> &Path {
        &self.env_dir
    }

    #[must_use]
    pub fn create_dir(&self) -> &Path {
        &self.create_dir
    }

    #[must_use]
    pub fn terminals(&self) -> &TerminalChain {
        &self.terminals
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The interpreter used to run `-m venv`: the configured one, else the
    /// first `python3` / `python` found on `PATH`.
    ///
    /// # Errors
    /// Returns an error when no interpreter is configured or discoverable.
    pub fn venv_python(&self) -> Result<String> {
        if let Some(explicit) = &self.python {
            return Ok(explicit.clone());
        }
        for candidate in ["python3", "python"] {
            if let Ok(path) = which::which(candidate) {
                return path
                    .into_os_string()
                    .into_string()
                    .map_err(|_| anyhow!("non-utf8 interpreter path"));
            }
        }
        bail!("no python interpreter found; set {PYTHON_ENV}");
    }
}
