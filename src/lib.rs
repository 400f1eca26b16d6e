//! # Blog Trickle
//!
//! An incremental static publisher for Blogger content. Every run advances a
//! blog mirror by one post: fetch the source, pick the newest post that is not
//! live yet, censor it, paraphrase its opening passage, and regenerate a flat
//! static site from everything published so far.
//!
//! # Run Pipeline
//!
//! ```text
//! 1. Fetch     Blogger API  →  corpus        (merged into the cache)
//! 2. Select    corpus − ledger → next post   (newest first, id tie-break)
//! 3. Enrich    post  →  censored + rewritten text (once per post, cached)
//! 4. Render    corpus + live ids  →  dist/   (article, index, label pages)
//! 5. Record    id  →  ledger                 (only after its page exists)
//! ```
//!
//! Two small JSON files carry state between runs: the corpus cache (every post
//! seen, with derived text) and the publication ledger (ids already live). A
//! run that dies at any step can be rerun; see [`publish`] for why.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`source`] | Paginated Blogger fetch, degrading to partial or empty results |
//! | [`cache`] | Corpus cache: load/save, merge by id, label index |
//! | [`ledger`] | Monotonic set of published ids |
//! | [`select`] | Which unpublished posts advance this run |
//! | [`markup`] | HTML fragment walking, serialization and text extraction |
//! | [`sanitize`] | Whole-word banned-term substitution and link unwrapping |
//! | [`rewrite`] | Lead-span paraphrasing through a generative text service |
//! | [`enrich`] | Applies both transforms to a post exactly once |
//! | [`publish`] | Orchestrates a run; also `render` and `status` |
//! | [`generate`] | Renders the static site with Maud |
//! | [`naming`] | Output file naming conventions |
//! | [`config`] | `config.toml` loading, validation, merging, CSS colors; credentials |
//! | [`types`] | `Post` and `Enrichment` |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## One Post Per Run
//!
//! Publication is throttled to the newest unpublished post per invocation so
//! that a scheduled job trickles an existing archive out over time. `publish
//! --all` advances every candidate at once; the state transitions are the same.
//!
//! ## Best-Effort Everywhere Except Credentials
//!
//! Missing credentials stop the process before any work. Everything else
//! degrades: an unreachable source means a cache-only run, a failed rewrite
//! means the censored original is published, and a corrupt state file is
//! treated as empty.

pub mod cache;
pub mod config;
pub mod enrich;
pub mod generate;
pub mod ledger;
pub mod markup;
pub mod naming;
pub mod output;
pub mod publish;
pub mod rewrite;
pub mod sanitize;
pub mod select;
pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
