//! Shared types carried between the fetch, cache, enrichment and render steps.
//!
//! A [`Post`] holds the raw fields exactly as the content source returned
//! them. Everything derived from those fields during publication lives in a
//! separate [`Enrichment`] record, so "has this post been processed yet" is
//! a matter of `post.enrichment.is_some()` rather than probing for keys.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One content item from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Stable source identifier. Join key between cache, ledger and renderer.
    pub id: String,
    /// Raw title as published upstream.
    pub title: String,
    /// Upstream permalink (informational only).
    #[serde(default)]
    pub url: String,
    /// Source-of-truth timestamp, RFC 3339 or a bare `YYYY-MM-DD` date.
    pub published: String,
    #[serde(default)]
    pub updated: String,
    /// Raw HTML body.
    #[serde(default)]
    pub content: String,
    /// Category tags. The first one is the post's primary category.
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub images: Vec<PostImage>,
    /// Derived fields, computed at most once when the post is selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<Enrichment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostImage {
    pub url: String,
}

/// Derived text variants of a post.
///
/// Once present it is never recomputed, so rendered output for a published
/// post stays stable across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    /// Censored display title.
    pub processed_title: String,
    /// Censored markup with anchors unwrapped (`content_html_ready_for_pub`).
    pub content_html: String,
    /// Markup-free censored text, used as model input (`pure_text_for_ai`).
    pub plain_text: String,
    /// Full article text after a successful rewrite of the lead span.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_edited_text: Option<String>,
}

impl Enrichment {
    /// Text the article presents: the rewritten version when the model
    /// produced one, the censored original otherwise.
    pub fn article_text(&self) -> &str {
        self.ai_edited_text.as_deref().unwrap_or(&self.plain_text)
    }
}

impl Post {
    /// Parsed `published` timestamp.
    ///
    /// Accepts RFC 3339 (what the Blogger API returns) and bare dates, which
    /// are taken as midnight UTC. Unparseable values yield `None` and sort
    /// as the oldest possible post.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.published.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Primary category: the first label, if any.
    pub fn primary_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Replace the raw fields with a fresher copy from the source while
    /// keeping previously computed derived fields.
    pub fn absorb(&mut self, incoming: Post) {
        let enrichment = self.enrichment.take();
        *self = incoming;
        if self.enrichment.is_none() {
            self.enrichment = enrichment;
        }
    }
}
