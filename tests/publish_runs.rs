//! End-to-end publication runs against a scratch state directory.
//!
//! Drives `publish::publish` through the public API with in-memory source
//! and generator implementations, then inspects the ledger, the cache and
//! the generated site on disk.

use blog_trickle::cache::Corpus;
use blog_trickle::config::SiteConfig;
use blog_trickle::ledger::Ledger;
use blog_trickle::publish::{self, FetchStatus, Paths};
use blog_trickle::rewrite::{RewriteError, RewriteOutcome, TextGenerator};
use blog_trickle::select::SelectMode;
use blog_trickle::source::{ContentSource, PostPage, SourceError};
use blog_trickle::types::Post;
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

// =========================================================================
// In-memory collaborators
// =========================================================================

/// Serves the same posts on every call, or fails when `posts` is `None`.
struct FixedSource {
    posts: Option<Vec<Post>>,
}

impl ContentSource for FixedSource {
    fn fetch_page(&self, _page_token: Option<&str>) -> Result<PostPage, SourceError> {
        match &self.posts {
            Some(posts) => Ok(PostPage {
                posts: posts.clone(),
                next_page_token: None,
            }),
            None => Err(SourceError::Unavailable("connection refused".into())),
        }
    }
}

struct ScriptedGenerator {
    reply: Option<&'static str>,
    calls: Mutex<usize>,
}

impl ScriptedGenerator {
    fn new(reply: Option<&'static str>) -> Self {
        Self {
            reply,
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, RewriteError> {
        *self.calls.lock().unwrap() += 1;
        self.reply
            .map(str::to_string)
            .ok_or_else(|| RewriteError::Service("quota exceeded".into()))
    }
}

fn post(id: &str, published: &str, labels: &[&str], body: &str) -> Post {
    Post {
        id: id.to_string(),
        title: format!("Post {id}"),
        url: String::new(),
        published: published.to_string(),
        updated: String::new(),
        content: body.to_string(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        images: Vec::new(),
        enrichment: None,
    }
}

fn paths(tmp: &TempDir) -> Paths {
    Paths {
        output_dir: tmp.path().join("dist"),
        state_dir: tmp.path().join("state"),
        assets_dir: tmp.path().join("assets"),
    }
}

fn words(n: usize) -> String {
    (0..n).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
}

fn ledger_ids(paths: &Paths) -> Vec<String> {
    Ledger::load(&paths.state_dir).iter().map(str::to_string).collect()
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn three_runs_publish_newest_first_then_settle() {
    let tmp = TempDir::new().unwrap();
    let paths = paths(&tmp);
    let config = SiteConfig::default();
    let source = FixedSource {
        posts: Some(vec![
            post("1", "2024-01-01", &["x"], "<p>First.</p>"),
            post("2", "2024-02-01", &["x"], "<p>Second.</p>"),
        ]),
    };

    let run = || {
        publish::publish(Some(&source), None, &config, &paths, SelectMode::One).unwrap()
    };

    let first = run();
    assert_eq!(first.published.len(), 1);
    assert_eq!(first.published[0].id, "2");
    assert_eq!(ledger_ids(&paths), vec!["2"]);

    let second = run();
    assert_eq!(second.published[0].id, "1");
    assert_eq!(ledger_ids(&paths), vec!["1", "2"]);

    let third = run();
    assert!(third.published.is_empty());
    assert_eq!(ledger_ids(&paths), vec!["1", "2"]);

    let index = fs::read_to_string(paths.output_dir.join("index.html")).unwrap();
    assert!(index.contains("post-1-1.html"));
    assert!(index.contains("post-2-2.html"));
    let label = fs::read_to_string(paths.output_dir.join("x.html")).unwrap();
    assert!(label.contains("post-1-1.html"));
    assert!(label.contains("post-2-2.html"));
}

#[test]
fn unreachable_source_degrades_to_cache() {
    let tmp = TempDir::new().unwrap();
    let paths = paths(&tmp);
    let config = SiteConfig::default();
    Corpus::from_posts(vec![post("7", "2024-05-01", &[], "<p>Cached.</p>")])
        .save(&paths.state_dir)
        .unwrap();

    let report = publish::publish(
        Some(&FixedSource { posts: None }),
        None,
        &config,
        &paths,
        SelectMode::One,
    )
    .unwrap();

    assert!(matches!(report.fetch, FetchStatus::Failed { .. }));
    assert_eq!(report.published[0].id, "7");
    assert!(paths.output_dir.join("post-7-7.html").exists());
    assert_eq!(Corpus::load(&paths.state_dir).len(), 1);
}

#[test]
fn failed_rewrite_publishes_censored_original() {
    let tmp = TempDir::new().unwrap();
    let paths = paths(&tmp);
    let mut config = SiteConfig::default();
    config
        .censor
        .words
        .insert("word3".into(), "[removed]".into());
    let body = format!("<p>{}</p>", words(80));
    let source = FixedSource {
        posts: Some(vec![post("1", "2024-01-01", &[], &body)]),
    };
    let generator = ScriptedGenerator::new(None);

    let report = publish::publish(
        Some(&source),
        Some(&generator),
        &config,
        &paths,
        SelectMode::One,
    )
    .unwrap();

    assert_eq!(generator.calls(), 1);
    assert!(matches!(
        report.published[0].rewrite,
        Some(RewriteOutcome::Failed(_))
    ));
    let cached = Corpus::load(&paths.state_dir);
    let enrichment = cached.get("1").unwrap().enrichment.clone().unwrap();
    let expected = words(80).replace("word3 ", "[removed] ");
    assert_eq!(enrichment.article_text(), expected);
    assert_eq!(enrichment.ai_edited_text, None);
}

#[test]
fn successful_rewrite_replaces_only_the_lead() {
    let tmp = TempDir::new().unwrap();
    let paths = paths(&tmp);
    let config = SiteConfig::default();
    let body = format!("<p>{}</p>", words(320));
    let source = FixedSource {
        posts: Some(vec![post("1", "2024-01-01", &[], &body)]),
    };
    let generator = ScriptedGenerator::new(Some("A brand new opening."));

    publish::publish(
        Some(&source),
        Some(&generator),
        &config,
        &paths,
        SelectMode::One,
    )
    .unwrap();

    let page = fs::read_to_string(paths.output_dir.join("post-1-1.html")).unwrap();
    assert!(page.contains("<p>A brand new opening. word300"));
    assert!(page.contains("word319</p>"));
    assert!(!page.contains("word299 "));
}

#[test]
fn short_post_never_reaches_the_model() {
    let tmp = TempDir::new().unwrap();
    let paths = paths(&tmp);
    let source = FixedSource {
        posts: Some(vec![post("1", "2024-01-01", &[], &format!("<p>{}</p>", words(49)))]),
    };
    let generator = ScriptedGenerator::new(Some("unused"));

    let report = publish::publish(
        Some(&source),
        Some(&generator),
        &SiteConfig::default(),
        &paths,
        SelectMode::One,
    )
    .unwrap();

    assert_eq!(generator.calls(), 0);
    assert_eq!(
        report.published[0].rewrite,
        Some(RewriteOutcome::TooShort { words: 49 })
    );
}

#[test]
fn corrupt_state_files_do_not_stop_a_run() {
    let tmp = TempDir::new().unwrap();
    let paths = paths(&tmp);
    fs::create_dir_all(&paths.state_dir).unwrap();
    fs::write(paths.state_dir.join("posts_cache.json"), "[{\"id\": ").unwrap();
    fs::write(paths.state_dir.join("published_posts.json"), "nope").unwrap();
    let source = FixedSource {
        posts: Some(vec![post("1", "2024-01-01", &[], "<p>Hi</p>")]),
    };

    let report =
        publish::publish(Some(&source), None, &SiteConfig::default(), &paths, SelectMode::One)
            .unwrap();

    assert_eq!(report.published[0].id, "1");
    assert_eq!(ledger_ids(&paths), vec!["1"]);
}
