//! Recognising virtual environments on disk.

pub(crate) mod scan;
pub(crate) mod search;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environments found by one discovery pass, keyed by directory basename.
pub type Discovered = BTreeMap<String, PathBuf>;

/// Directory layout conventions of a virtual environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    const fn scripts_dir(self) -> &'static str {
        match self {
            Platform::Unix => "bin",
            Platform::Windows => "Scripts",
        }
    }

    /// Location of the activation script inside `env`.
    #[must_use]
    pub fn activation_marker(self, env: &Path) -> PathBuf {
        let script = match self {
            Platform::Unix => "activate",
            Platform::Windows => "activate.bat",
        };
        env.join(self.scripts_dir()).join(script)
    }

    /// Location of the environment's interpreter inside `env`.
    #[must_use]
    pub fn interpreter(self, env: &Path) -> PathBuf {
        let exe = match self {
            Platform::Unix => "python",
            Platform::Windows => "python.exe",
        };
        env.join(self.scripts_dir()).join(exe)
    }
}

/// True when `dir` holds the platform's activation script. Only the file's
/// existence is checked.
#[must_use]
pub fn is_valid_env(platform: Platform, dir: &Path) -> bool {
    platform.activation_marker(dir).is_file()
}
