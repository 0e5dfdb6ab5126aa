use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::notice::{Notice, Notifier};

use super::Registry;

/// The JSON file the registry is persisted to.
///
/// Reads and writes never fail past this type: problems become warning
/// notices and the caller continues with an empty (load) or unchanged
/// (save) registry. Writes overwrite the whole file; concurrent writers race
/// and the last full snapshot wins.
#[derive(Clone, Debug)]
pub struct RegistryLog {
    path: PathBuf,
}

impl RegistryLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self, notifier: &dyn Notifier) -> Registry {
        if !self.path.is_file() {
            return Registry::new();
        }
        match self.read() {
            Ok(registry) => {
                tracing::debug!(path = %self.path.display(), count = registry.len(), "loaded registry log");
                registry
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %format!("{err:#}"), "ignoring registry log");
                notifier.notify(Notice::warning(
                    "Warning",
                    format!("Error reading log file: {err:#}"),
                ));
                Registry::new()
            }
        }
    }

    pub fn save(&self, registry: &Registry, notifier: &dyn Notifier) {
        match self.write(registry) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), count = registry.len(), "saved registry log");
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %format!("{err:#}"), "registry log not written");
                notifier.notify(Notice::warning(
                    "Warning",
                    format!("Error writing log file: {err:#}"),
                ));
            }
        }
    }

    fn read(&self) -> Result<Registry> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    fn write(&self, registry: &Registry) -> Result<()> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        registry.serialize(&mut serializer)?;
        buffer.push(b'\n');
        fs::write(&self.path, buffer).with_context(|| format!("writing {}", self.path.display()))
    }
}
