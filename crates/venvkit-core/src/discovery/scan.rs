use std::fs;
use std::path::Path;

use super::{is_valid_env, Discovered, Platform};

/// Collects the immediate child directories of `root` that look like virtual
/// environments. A missing or unreadable root yields an empty map; entries
/// that are not directories or fail validation are skipped.
#[must_use]
pub fn scan_env_directory(platform: Platform, root: &Path) -> Discovered {
    let mut found = Discovered::new();
    let Ok(entries) = fs::read_dir(root) else {
        tracing::debug!(root = %root.display(), "scan root not readable; nothing found");
        return found;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() || !is_valid_env(platform, &path) {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(ToOwned::to_owned) else {
            continue;
        };
        found.insert(name, path);
    }
    tracing::debug!(root = %root.display(), count = found.len(), "scanned environment directory");
    found
}
