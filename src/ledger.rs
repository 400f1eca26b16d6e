//! Publication ledger: the set of post ids that are live.
//!
//! The ledger is the only authority on what has been published. It only
//! grows: there is no way to remove an id, and an id is recorded only after
//! its article page has been written.
//!
//! Stored as `<state_dir>/published_posts.json`, a sorted JSON array of ids.
//! Missing or corrupt files load as an empty ledger, with a warning in the
//! corrupt case.

use crate::cache::{StateError, read_json, write_json_atomic};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

const LEDGER_FILENAME: &str = "published_posts.json";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    ids: BTreeSet<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(state_dir: &Path) -> Self {
        let ids: BTreeSet<String> = read_json(&ledger_path(state_dir)).unwrap_or_default();
        debug!(published = ids.len(), "loaded publication ledger");
        Self { ids }
    }

    pub fn save(&self, state_dir: &Path) -> Result<(), StateError> {
        write_json_atomic(&ledger_path(state_dir), &self.ids)
    }

    /// Record `id` as published. Returns `false` if it already was.
    pub fn mark_published(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Published ids in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Ledger {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Resolve the ledger file path for a state directory.
pub fn ledger_path(state_dir: &Path) -> PathBuf {
    state_dir.join(LEDGER_FILENAME)
}
