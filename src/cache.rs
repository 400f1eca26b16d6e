//! Corpus cache: every post seen so far, keyed by id.
//!
//! The cache lets a run proceed when the source is unreachable and keeps the
//! derived fields of already processed posts so they are never recomputed.
//!
//! ## Storage
//!
//! `<state_dir>/posts_cache.json`, a pretty-printed JSON array of posts in id
//! order. A missing, truncated or otherwise unreadable file loads as an empty
//! corpus with a warning; it never stops a run.
//!
//! Writes go to a sibling `.tmp` file which is then renamed over the target,
//! so a crash mid-write leaves the previous version intact. The ledger uses
//! the same helpers.
//!
//! ## Merging
//!
//! Fetched posts replace cached ones by id. The source is authoritative for
//! the raw fields; a cached [`Enrichment`](crate::types::Enrichment) survives
//! the replacement (see [`Post::absorb`]).

use crate::types::Post;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the cache file within the state directory.
const CACHE_FILENAME: &str = "posts_cache.json";

#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// In-memory corpus for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    posts: BTreeMap<String, Post>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        let mut corpus = Self::new();
        corpus.merge_fetched(posts);
        corpus
    }

    /// Load from the state directory. Returns an empty corpus if the file
    /// doesn't exist or can't be parsed.
    pub fn load(state_dir: &Path) -> Self {
        match read_json::<Vec<Post>>(&cache_path(state_dir)) {
            Some(posts) => {
                let corpus = Self::from_posts(posts);
                debug!(posts = corpus.len(), "loaded corpus cache");
                corpus
            }
            None => Self::new(),
        }
    }

    /// Atomically overwrite the cache file with the full corpus.
    pub fn save(&self, state_dir: &Path) -> Result<(), StateError> {
        let posts: Vec<&Post> = self.posts.values().collect();
        write_json_atomic(&cache_path(state_dir), &posts)
    }

    /// Fold freshly fetched posts into the corpus.
    pub fn merge_fetched(&mut self, fetched: impl IntoIterator<Item = Post>) -> MergeStats {
        let mut stats = MergeStats::default();
        for post in fetched {
            match self.posts.get_mut(&post.id) {
                Some(existing) => {
                    existing.absorb(post);
                    stats.updated += 1;
                }
                None => {
                    self.posts.insert(post.id.clone(), post);
                    stats.added += 1;
                }
            }
        }
        stats
    }

    pub fn get(&self, id: &str) -> Option<&Post> {
        self.posts.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Post> {
        self.posts.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.posts.contains_key(id)
    }

    /// Posts in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.posts.values()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Union of labels across the whole corpus, sorted.
    pub fn label_index(&self) -> BTreeSet<String> {
        self.posts
            .values()
            .flat_map(|p| p.labels.iter())
            .filter(|label| !label.trim().is_empty())
            .cloned()
            .collect()
    }
}

/// How a fetch changed the corpus.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub updated: usize,
}

impl fmt::Display for MergeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} new, {} refreshed", self.added, self.updated)
    }
}

/// Resolve the cache file path for a state directory.
pub fn cache_path(state_dir: &Path) -> PathBuf {
    state_dir.join(CACHE_FILENAME)
}

// ============================================================================
// Shared state-file helpers
// ============================================================================

/// Read and parse a JSON state file. Absent files are silent; unreadable
/// or malformed ones are logged. Both yield `None`.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read state file, starting empty");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt state file, starting empty");
            None
        }
    }
}

/// Serialize `value` as pretty JSON to `<path>.tmp`, then rename it over
/// `path`. Creates the parent directory if needed.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StateError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
