//! CLI output formatting for runs and state inspection.
//!
//! Output is **post-centric**: each post is shown by position and display
//! title, with its output file or id as indented context underneath.
//!
//! # Output Format
//!
//! ## Publish
//!
//! ```text
//! Fetch
//!     42 posts (1 new, 41 refreshed)
//! Published
//! 001 My First Post → my-first-post-4213.html
//!     Rewrite: edited
//! Site
//!     2 articles, 1 index page, 3 label pages, 1 asset
//! Ledger: 2 published, 40 pending
//! ```
//!
//! ## Status
//!
//! ```text
//! State
//!     42 cached, 2 published, 3 labels
//! Queue (40)
//! 001 Newest Draft (2024-02-01)
//!     id: 4214
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::generate::RenderSummary;
use crate::publish::{FetchStatus, PublishReport, Status};
use crate::rewrite::RewriteOutcome;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 article`, `2 articles`.
fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn fetch_line(fetch: &FetchStatus, report: &PublishReport) -> String {
    let merged = format!("({})", report.merge);
    match fetch {
        FetchStatus::Complete { posts } => format!("{} {}", count(*posts, "post"), merged),
        FetchStatus::Partial { posts, error } => format!(
            "{} {}, stopped early: {}",
            count(*posts, "post"),
            merged,
            error
        ),
        FetchStatus::Failed { error } => {
            format!("failed: {} (using {} cached)", error, count(report.corpus_size, "post"))
        }
        FetchStatus::Skipped => "skipped".to_string(),
    }
}

fn rewrite_line(rewrite: Option<&RewriteOutcome>) -> String {
    let detail = match rewrite {
        None => "reused cached text".to_string(),
        Some(RewriteOutcome::Edited(_)) => "edited".to_string(),
        Some(RewriteOutcome::TooShort { words }) => {
            format!("skipped, too short ({})", count(*words, "word"))
        }
        Some(RewriteOutcome::Disabled) => "disabled".to_string(),
        Some(RewriteOutcome::Failed(reason)) => format!("failed, kept original: {reason}"),
    };
    format!("{}Rewrite: {}", indent(1), detail)
}

/// One-line summary of a render.
pub fn format_render_summary(summary: &RenderSummary) -> String {
    format!(
        "{}, {}, {}, {}",
        count(summary.articles, "article"),
        count(summary.index_pages, "index page"),
        count(summary.label_pages, "label page"),
        count(summary.assets, "asset"),
    )
}

pub fn format_publish_report(report: &PublishReport) -> Vec<String> {
    let mut lines = vec![
        "Fetch".to_string(),
        format!("{}{}", indent(1), fetch_line(&report.fetch, report)),
        "Published".to_string(),
    ];

    if report.published.is_empty() {
        lines.push(format!("{}nothing new", indent(1)));
    }
    for (i, item) in report.published.iter().enumerate() {
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            item.title,
            item.file
        ));
        lines.push(rewrite_line(item.rewrite.as_ref()));
    }

    lines.push("Site".to_string());
    lines.push(format!("{}{}", indent(1), format_render_summary(&report.render)));
    lines.push(format!(
        "Ledger: {} published, {} pending",
        report.ledger_size, report.pending
    ));
    lines
}

pub fn print_publish_report(report: &PublishReport) {
    for line in format_publish_report(report) {
        println!("{}", line);
    }
}

pub fn format_status(status: &Status) -> Vec<String> {
    let mut lines = vec![
        "State".to_string(),
        format!(
            "{}{} cached, {} published, {}",
            indent(1),
            status.cached,
            status.published,
            count(status.labels, "label")
        ),
        format!("Queue ({})", status.queue.len()),
    ];
    for (i, queued) in status.queue.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            queued.title,
            queued.published
        ));
        lines.push(format!("{}id: {}", indent(1), queued.id));
    }
    lines
}

pub fn print_status(status: &Status) {
    for line in format_status(status) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
