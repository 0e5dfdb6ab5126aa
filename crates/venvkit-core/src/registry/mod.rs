//! The name → path map of known environments.

pub(crate) mod log;

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::discovery::Discovered;

/// Known environments keyed by name, iterated in name order.
///
/// A name maps to exactly one path; merging a discovery that reuses a name
/// replaces the earlier path without any conflict check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    entries: BTreeMap<String, PathBuf>,
}

/// How a merge changed the registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub replaced: usize,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a record, returning the previous path.
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Option<PathBuf> {
        self.entries.insert(name.into(), path.into())
    }

    /// Folds `found` into the registry; later data wins on a name collision.
    pub fn merge(&mut self, found: impl IntoIterator<Item = (String, PathBuf)>) -> MergeReport {
        let mut report = MergeReport::default();
        for (name, path) in found {
            match self.entries.insert(name.clone(), path.clone()) {
                Some(previous) if previous != path => {
                    tracing::debug!(
                        name = %name,
                        previous = %previous.display(),
                        path = %path.display(),
                        "replacing registry entry"
                    );
                    report.replaced += 1;
                }
                Some(_) => {}
                None => report.added += 1,
            }
        }
        report
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, PathBuf> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Discovered> for Registry {
    fn from(entries: Discovered) -> Self {
        Self { entries }
    }
}

impl IntoIterator for Registry {
    type Item = (String, PathBuf);
    type IntoIter = btree_map::IntoIter<String, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = (&'a String, &'a PathBuf);
    type IntoIter = btree_map::Iter<'a, String, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
