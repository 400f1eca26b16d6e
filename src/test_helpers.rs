//! Shared test utilities for the blog-trickle test suite.
//!
//! Builders for [`Post`] values, a scratch state directory, and recording
//! mocks for the two network-facing traits.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = MockSource::single_page(vec![
//!     post("1", "2024-01-01", &["x"]),
//!     post("2", "2024-02-01", &["x"]),
//! ]);
//! let tmp = state_dir();
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;
use tempfile::TempDir;

use crate::rewrite::{RewriteError, TextGenerator};
use crate::source::{ContentSource, PostPage, SourceError};
use crate::types::Post;

// =========================================================================
// Builders
// =========================================================================

/// A post with a title and body derived from its id.
pub fn post(id: &str, published: &str, labels: &[&str]) -> Post {
    Post {
        id: id.to_string(),
        title: format!("Post {id}"),
        url: format!("https://example.blogspot.com/{id}.html"),
        published: published.to_string(),
        updated: published.to_string(),
        content: format!("<p>Body of post {id}.</p>"),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        images: Vec::new(),
        enrichment: None,
    }
}

/// A post whose body is `words` plain words in a single paragraph.
pub fn long_post(id: &str, published: &str, words: usize) -> Post {
    let body: Vec<String> = (0..words).map(|i| format!("w{i}")).collect();
    Post {
        content: format!("<p>{}</p>", body.join(" ")),
        ..post(id, published, &[])
    }
}

pub fn state_dir() -> TempDir {
    TempDir::new().unwrap()
}

// =========================================================================
// Mock content source
// =========================================================================

/// Serves canned pages in order, then errors once exhausted.
#[derive(Default)]
pub struct MockSource {
    pub pages: Mutex<VecDeque<Result<PostPage, SourceError>>>,
    pub requested_tokens: Mutex<Vec<Option<String>>>,
}

impl MockSource {
    pub fn single_page(posts: Vec<Post>) -> Self {
        Self::with_pages(vec![Ok(PostPage {
            posts,
            next_page_token: None,
        })])
    }

    pub fn with_pages(pages: Vec<Result<PostPage, SourceError>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            requested_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::with_pages(vec![Err(SourceError::Unavailable("offline".into()))])
    }

    pub fn tokens(&self) -> Vec<Option<String>> {
        self.requested_tokens.lock().unwrap().clone()
    }
}

impl ContentSource for MockSource {
    fn fetch_page(&self, page_token: Option<&str>) -> Result<PostPage, SourceError> {
        self.requested_tokens
            .lock()
            .unwrap()
            .push(page_token.map(str::to_string));
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::Unavailable("no more mock pages".into())))
    }
}

// =========================================================================
// Mock text generator
// =========================================================================

/// Records prompts and answers with a fixed reply (or a fixed failure).
pub struct MockGenerator {
    pub reply: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err("model unavailable".to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

impl TextGenerator for MockGenerator {
    fn generate(&self, prompt: &str) -> Result<String, RewriteError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(RewriteError::Service)
    }
}
