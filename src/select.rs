//! Selection policy: which unpublished posts advance this run.
//!
//! Candidates are corpus posts whose id is not in the ledger, ordered newest
//! first by `published`. Equal timestamps fall back to ascending id, and
//! posts with an unparseable date sort after every dated post, so the order
//! is total and the same inputs always select the same post.

use crate::cache::Corpus;
use crate::ledger::Ledger;
use crate::types::Post;
use std::cmp::Ordering;

/// How many candidates a run advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectMode {
    /// The newest unpublished post only.
    #[default]
    One,
    /// Every unpublished post.
    All,
}

/// Newest first; ties by ascending id.
pub fn recency_order(a: &Post, b: &Post) -> Ordering {
    b.published_at()
        .cmp(&a.published_at())
        .then_with(|| a.id.cmp(&b.id))
}

/// Unpublished posts in selection order.
pub fn candidates<'a>(corpus: &'a Corpus, ledger: &Ledger) -> Vec<&'a Post> {
    let mut pending: Vec<&Post> = corpus.iter().filter(|p| !ledger.contains(&p.id)).collect();
    pending.sort_by(|a, b| recency_order(a, b));
    pending
}

/// Ids to advance this run. Empty when everything is published.
pub fn select(corpus: &Corpus, ledger: &Ledger, mode: SelectMode) -> Vec<String> {
    let pending = candidates(corpus, ledger);
    let take = match mode {
        SelectMode::One => 1,
        SelectMode::All => pending.len(),
    };
    pending.into_iter().take(take).map(|p| p.id.clone()).collect()
}
