//! One publication run, start to finish.
//!
//! ```text
//! load cache + ledger → fetch & merge → select → enrich → save cache
//!     → render site → mark published → save ledger
//! ```
//!
//! The order of the last four steps is what makes a run safe to interrupt:
//!
//! - The cache is saved before rendering, so a post's enrichment (and its
//!   one model call) is on disk before anything refers to it.
//! - A post is marked published only after its page has been written.
//! - A crash anywhere before the ledger save leaves the ledger unchanged.
//!   The next run selects the same post again and reuses the cached
//!   enrichment instead of calling the model a second time.
//!
//! A failed fetch is never fatal: the run continues on the cached corpus.
//! Missing pages, an empty corpus or an empty queue are all normal outcomes
//! that still regenerate the site.

use crate::cache::{Corpus, MergeStats, StateError};
use crate::config::{ConfigError, SiteConfig};
use crate::enrich::ensure_enriched;
use crate::generate::{self, GenerateError, RenderSummary};
use crate::ledger::Ledger;
use crate::naming::article_filename;
use crate::rewrite::{RewriteOutcome, TextGenerator};
use crate::select::{SelectMode, candidates, select};
use crate::source::{ContentSource, Fetched, fetch_all};
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("generate error: {0}")]
    Generate(#[from] GenerateError),
}

/// Directories a run reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub output_dir: PathBuf,
    pub state_dir: PathBuf,
    pub assets_dir: PathBuf,
}

impl Paths {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&config.paths.output_dir),
            state_dir: PathBuf::from(&config.paths.state_dir),
            assets_dir: PathBuf::from(&config.paths.assets_dir),
        }
    }
}

/// How the source fetch went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Complete { posts: usize },
    Partial { posts: usize, error: String },
    Failed { error: String },
    /// No source was given.
    Skipped,
}

/// One post that went live this run.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedPost {
    pub id: String,
    pub title: String,
    pub file: String,
    /// `None` when a cached enrichment was reused.
    pub rewrite: Option<RewriteOutcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    pub fetch: FetchStatus,
    pub merge: MergeStats,
    pub corpus_size: usize,
    pub published: Vec<PublishedPost>,
    /// Candidates still waiting after this run.
    pub pending: usize,
    pub ledger_size: usize,
    pub render: RenderSummary,
}

/// Run one publication pass.
pub fn publish(
    source: Option<&dyn ContentSource>,
    generator: Option<&dyn TextGenerator>,
    config: &SiteConfig,
    paths: &Paths,
    mode: SelectMode,
) -> Result<PublishReport, PublishError> {
    let censor = config.censor()?;
    let mut corpus = Corpus::load(&paths.state_dir);
    let mut ledger = Ledger::load(&paths.state_dir);
    info!(
        cached = corpus.len(),
        published = ledger.len(),
        "loaded state"
    );

    let (fetch, merge) = match source {
        Some(source) => merge_from_source(&mut corpus, source),
        None => (FetchStatus::Skipped, MergeStats::default()),
    };

    let selected = select(&corpus, &ledger, mode);
    if selected.is_empty() {
        info!("no unpublished posts, refreshing site only");
    }

    let mut published = Vec::with_capacity(selected.len());
    for id in &selected {
        let Some(post) = corpus.get_mut(id) else {
            continue;
        };
        let rewrite = ensure_enriched(post, &censor, generator, &config.rewrite);
        let title = post
            .enrichment
            .as_ref()
            .map(|e| e.processed_title.clone())
            .unwrap_or_else(|| post.title.clone());
        published.push(PublishedPost {
            file: article_filename(&title, id),
            id: id.clone(),
            title,
            rewrite,
        });
    }
    corpus.save(&paths.state_dir)?;

    let mut live: BTreeSet<String> = ledger.iter().map(str::to_string).collect();
    live.extend(selected.iter().cloned());
    let render = generate::generate(
        &corpus,
        &live,
        &censor,
        config,
        &paths.output_dir,
        &paths.assets_dir,
    )?;

    for item in &published {
        ledger.mark_published(&item.id);
        info!(id = %item.id, file = %item.file, "published");
    }
    ledger.save(&paths.state_dir)?;

    Ok(PublishReport {
        fetch,
        merge,
        corpus_size: corpus.len(),
        pending: candidates(&corpus, &ledger).len(),
        ledger_size: ledger.len(),
        published,
        render,
    })
}

fn merge_from_source(corpus: &mut Corpus, source: &dyn ContentSource) -> (FetchStatus, MergeStats) {
    match fetch_all(source) {
        Fetched::Complete(posts) => {
            let status = FetchStatus::Complete { posts: posts.len() };
            (status, corpus.merge_fetched(posts))
        }
        Fetched::Partial { posts, error } => {
            let status = FetchStatus::Partial {
                posts: posts.len(),
                error: error.to_string(),
            };
            (status, corpus.merge_fetched(posts))
        }
        Fetched::Failed(error) => {
            warn!(cached = corpus.len(), "continuing with cached posts only");
            let status = FetchStatus::Failed {
                error: error.to_string(),
            };
            (status, MergeStats::default())
        }
    }
}

/// Regenerate the site from saved state without fetching or selecting.
pub fn render(config: &SiteConfig, paths: &Paths) -> Result<RenderSummary, PublishError> {
    let censor = config.censor()?;
    let corpus = Corpus::load(&paths.state_dir);
    let ledger = Ledger::load(&paths.state_dir);
    let live: BTreeSet<String> = ledger.iter().map(str::to_string).collect();
    Ok(generate::generate(
        &corpus,
        &live,
        &censor,
        config,
        &paths.output_dir,
        &paths.assets_dir,
    )?)
}

/// A queued post, as shown by `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedPost {
    pub id: String,
    pub title: String,
    pub published: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub cached: usize,
    pub published: usize,
    pub labels: usize,
    /// Unpublished posts in selection order; the first is next.
    pub queue: Vec<QueuedPost>,
}

/// Summarize saved state.
pub fn status(paths: &Paths) -> Status {
    let corpus = Corpus::load(&paths.state_dir);
    let ledger = Ledger::load(&paths.state_dir);
    Status {
        cached: corpus.len(),
        published: ledger.len(),
        labels: corpus.label_index().len(),
        queue: candidates(&corpus, &ledger)
            .into_iter()
            .map(|p| QueuedPost {
                id: p.id.clone(),
                title: p.title.clone(),
                published: p.published.clone(),
            })
            .collect(),
    }
}
