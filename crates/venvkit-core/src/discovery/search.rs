use std::path::Path;

use crate::effects::{FileIndexer, IndexerHits};

use super::{is_valid_env, Discovered, Platform};

/// File written by `venv` at the root of every environment.
pub const MARKER_CONFIG_FILE: &str = "pyvenv.cfg";

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("the '{tool}' command was not found in your PATH; install it and make sure it is available")]
    IndexerMissing { tool: String },
    #[error("error executing {tool}: {message}")]
    IndexerFailed { tool: String, message: String },
}

impl SearchError {
    /// Whether the user can fix this by changing their machine setup.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, SearchError::IndexerMissing { .. })
    }
}

/// Asks the system file index for `pyvenv.cfg` files and keeps the parent
/// directories that validate as environments. Results reflect whatever the
/// index last captured, not the live filesystem.
///
/// # Errors
/// Returns [`SearchError`] when the indexer is unavailable or fails.
pub fn search_system(
    platform: Platform,
    indexer: &dyn FileIndexer,
) -> Result<Discovered, SearchError> {
    let hits = indexer.locate(MARKER_CONFIG_FILE)?;
    Ok(collect_hits(platform, &hits))
}

fn collect_hits(platform: Platform, hits: &IndexerHits) -> Discovered {
    let mut found = Discovered::new();
    for line in hits.lines() {
        let cfg_path = Path::new(line.trim());
        if cfg_path.file_name().and_then(|name| name.to_str()) != Some(MARKER_CONFIG_FILE) {
            continue;
        }
        let Some(env_dir) = cfg_path.parent() else {
            continue;
        };
        if !is_valid_env(platform, env_dir) {
            tracing::debug!(candidate = %env_dir.display(), "skipping candidate without activation script");
            continue;
        }
        let Some(name) = env_dir.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        found.insert(name.to_string(), env_dir.to_path_buf());
    }
    found
}
