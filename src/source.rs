//! Content source adapter.
//!
//! Pages through a blog's posts and returns them as a flat list. The only
//! policy here is failure handling: a page that fails ends the fetch, and the
//! caller gets whatever was gathered so far tagged as [`Fetched::Partial`],
//! or [`Fetched::Failed`] when nothing was. Neither is ever fatal to a run;
//! the publisher falls back to the cached corpus.
//!
//! ## Wire format (Blogger API v3)
//!
//! ```text
//! GET {api_base}/blogs/{blog_id}/posts?key=..&fetchImages=true&maxResults=..&pageToken=..
//!
//! {
//!   "items": [{ "id", "title", "url", "published", "updated",
//!               "content", "labels": [..], "images": [{ "url" }] }],
//!   "nextPageToken": "..."
//! }
//! ```

use crate::config::{Credentials, SourceConfig};
use crate::types::{Post, PostImage};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const FIELDS: &str = "items(id,title,url,published,updated,content,labels,images),nextPageToken";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("source returned HTTP {status}")]
    Http { status: reqwest::StatusCode },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// One page of results.
#[derive(Debug, Clone, Default)]
pub struct PostPage {
    pub posts: Vec<Post>,
    /// Continuation token; absent or empty on the last page.
    pub next_page_token: Option<String>,
}

/// A paginated post listing.
pub trait ContentSource {
    fn fetch_page(&self, page_token: Option<&str>) -> Result<PostPage, SourceError>;
}

/// Result of fetching every page.
#[derive(Debug)]
pub enum Fetched {
    Complete(Vec<Post>),
    /// A later page failed; holds the posts from earlier pages.
    Partial { posts: Vec<Post>, error: SourceError },
    /// The first page failed.
    Failed(SourceError),
}

impl Fetched {
    /// Posts gathered, whatever the outcome.
    pub fn into_posts(self) -> Vec<Post> {
        match self {
            Self::Complete(posts) | Self::Partial { posts, .. } => posts,
            Self::Failed(_) => Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// Fetch every page from `source`, following continuation tokens until one
/// is missing, empty, or repeats.
pub fn fetch_all(source: &dyn ContentSource) -> Fetched {
    let mut posts = Vec::new();
    let mut seen_tokens = HashSet::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = match source.fetch_page(token.as_deref()) {
            Ok(page) => page,
            Err(error) if pages == 0 => {
                warn!(error = %error, "fetch failed, using cached posts only");
                return Fetched::Failed(error);
            }
            Err(error) => {
                warn!(error = %error, fetched = posts.len(), "fetch stopped early, merging partial result");
                return Fetched::Partial { posts, error };
            }
        };
        pages += 1;
        debug!(page = pages, posts = page.posts.len(), "fetched page");
        posts.extend(page.posts);

        match page.next_page_token.filter(|t| !t.is_empty()) {
            Some(next) if seen_tokens.insert(next.clone()) => token = Some(next),
            Some(next) => {
                warn!(token = %next, "source repeated a page token, stopping");
                break;
            }
            None => break,
        }
    }

    info!(posts = posts.len(), pages, "fetched posts from source");
    Fetched::Complete(posts)
}

// ============================================================================
// Blogger client
// ============================================================================

/// [`ContentSource`] backed by the Blogger v3 REST API.
pub struct BloggerSource {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostsResponse {
    #[serde(default)]
    items: Vec<RawPost>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    published: String,
    #[serde(default)]
    updated: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    images: Vec<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    url: Option<String>,
}

impl RawPost {
    fn into_post(self) -> Option<Post> {
        let id = self.id.filter(|id| !id.trim().is_empty())?;
        Some(Post {
            id,
            title: self.title,
            url: self.url,
            published: self.published,
            updated: self.updated,
            content: self.content,
            labels: self.labels,
            images: self
                .images
                .into_iter()
                .filter_map(|img| img.url)
                .map(|url| PostImage { url })
                .collect(),
            enrichment: None,
        })
    }
}

impl BloggerSource {
    pub fn new(credentials: &Credentials, config: &SourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!(
                "{}/blogs/{}/posts",
                config.api_base.trim_end_matches('/'),
                credentials.blog_id
            ),
            api_key: credentials.blogger_api_key.clone(),
            max_results: config.max_results,
        })
    }
}

impl ContentSource for BloggerSource {
    fn fetch_page(&self, page_token: Option<&str>) -> Result<PostPage, SourceError> {
        let max_results = self.max_results.to_string();
        let mut query = vec![
            ("key", self.api_key.as_str()),
            ("fetchImages", "true"),
            ("maxResults", max_results.as_str()),
            ("fields", FIELDS),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self.client.get(&self.url).query(&query).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http { status });
        }
        parse_page(&response.text()?)
    }
}

fn parse_page(body: &str) -> Result<PostPage, SourceError> {
    let response: PostsResponse = serde_json::from_str(body)?;
    let posts = response
        .items
        .into_iter()
        .filter_map(|raw| {
            let post = raw.into_post();
            if post.is_none() {
                warn!("skipping post without an id");
            }
            post
        })
        .collect();
    Ok(PostPage {
        posts,
        next_page_token: response.next_page_token,
    })
}
