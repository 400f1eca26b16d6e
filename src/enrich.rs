//! Turn a raw post into its publishable text variants.
//!
//! Enrichment happens once per post. A post that already carries an
//! [`Enrichment`] is left untouched, which is what keeps the AI call
//! at-most-once across crashes and reruns.

use crate::config::RewriteConfig;
use crate::markup::Fragment;
use crate::rewrite::{RewriteOutcome, TextGenerator, rewrite_lead};
use crate::sanitize::{Censor, sanitize};
use crate::types::{Enrichment, Post};
use tracing::{debug, info};

/// Censor title and body and extract plain text. No model call.
pub fn censored(post: &Post, censor: &Censor) -> Enrichment {
    let content_html = sanitize(&post.content, censor);
    let plain_text = Fragment::parse(&content_html).plain_text();
    Enrichment {
        processed_title: censor.apply(post.title.trim()),
        content_html,
        plain_text,
        ai_edited_text: None,
    }
}

/// Enrich `post` in place unless it already is.
///
/// Returns the rewrite outcome when work was done, `None` when an existing
/// enrichment was reused.
pub fn ensure_enriched(
    post: &mut Post,
    censor: &Censor,
    generator: Option<&dyn TextGenerator>,
    config: &RewriteConfig,
) -> Option<RewriteOutcome> {
    if post.enrichment.is_some() {
        debug!(id = %post.id, "reusing cached enrichment");
        return None;
    }

    let mut enrichment = censored(post, censor);
    let outcome = rewrite_lead(&enrichment.plain_text, generator, config);
    enrichment.ai_edited_text = outcome.edited_text().map(str::to_string);
    info!(id = %post.id, outcome = outcome_label(&outcome), "enriched post");
    post.enrichment = Some(enrichment);
    Some(outcome)
}

pub fn outcome_label(outcome: &RewriteOutcome) -> &'static str {
    match outcome {
        RewriteOutcome::Edited(_) => "edited",
        RewriteOutcome::TooShort { .. } => "too short",
        RewriteOutcome::Disabled => "disabled",
        RewriteOutcome::Failed(_) => "failed",
    }
}
