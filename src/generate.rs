//! HTML site generation.
//!
//! Renders every published post in the corpus into a flat static site. The
//! renderer is a pure function of (corpus, live ids, config): running it
//! twice over the same state produces byte-identical files.
//!
//! ## Generated Pages
//!
//! - **Article pages** (`/{slug}-{id}.html`): title, date, labels, body,
//!   related posts, breadcrumb and `BlogPosting` JSON-LD
//! - **Index pages** (`/index.html`, `/index_p2.html`, ...): newest first,
//!   `posts_per_page` entries each, with prev/next links
//! - **Label pages** (`/{label-slug}.html`): published posts carrying a label
//!
//! Every page carries a sidebar listing all labels in the corpus. Label file
//! names are assigned once per render, after the article names are known, so
//! a label page never overwrites an index or article page, and two labels
//! never share a file.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── index_p2.html
//! ├── my-first-post-4213.html
//! ├── travel.html                # Label page
//! └── logo.png                   # Copied from assets_dir
//! ```
//!
//! ## Article Body
//!
//! When the lead of a post was paraphrased, the recomposed text is rendered
//! as paragraphs. Otherwise the censored markup is used as is. A published
//! post that was never enriched (for example one recorded by an older run)
//! is censored on the fly here, without any model call.
//!
//! ## CSS
//!
//! `static/style.css` is embedded at compile time and inlined into every
//! page after the color custom properties generated from config.

use crate::cache::Corpus;
use crate::config::{self, SiteConfig};
use crate::enrich;
use crate::markup::Fragment;
use crate::naming::{article_filename, index_filename, label_filenames};
use crate::rewrite::paragraphs_to_html;
use crate::sanitize::Censor;
use crate::select::recency_order;
use crate::types::{Enrichment, Post};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde_json::json;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot read assets: {0}")]
    Assets(#[from] walkdir::Error),
}

const CSS_STATIC: &str = include_str!("../static/style.css");

/// Files written by one render.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    pub articles: usize,
    pub index_pages: usize,
    pub label_pages: usize,
    pub assets: usize,
}

/// A published post with everything the templates need.
struct Entry<'a> {
    post: &'a Post,
    text: Cow<'a, Enrichment>,
    href: String,
    snippet: String,
    thumbnail: Option<String>,
}

impl Entry<'_> {
    fn title(&self) -> &str {
        &self.text.processed_title
    }

    fn date(&self) -> String {
        display_date(self.post)
    }
}

/// Shared inputs of every page.
struct Site<'a> {
    config: &'a SiteConfig,
    css: String,
    /// Label → output file, for every label in the corpus.
    labels: BTreeMap<String, String>,
}

impl Site<'_> {
    /// `None` for a label with no page (blank labels).
    fn label_href(&self, label: &str) -> Option<&str> {
        self.labels.get(label).map(String::as_str)
    }
}

pub fn generate(
    corpus: &Corpus,
    live_ids: &BTreeSet<String>,
    censor: &Censor,
    config: &SiteConfig,
    output_dir: &Path,
    assets_dir: &Path,
) -> Result<RenderSummary, GenerateError> {
    let entries = published_entries(corpus, live_ids, censor, config.site.snippet_words);
    let articles: BTreeSet<String> = entries.iter().map(|e| e.href.clone()).collect();
    let label_index = corpus.label_index();
    let site = Site {
        config,
        css: format!(
            "{}\n\n{}",
            config::generate_color_css(&config.colors),
            CSS_STATIC
        ),
        labels: label_filenames(label_index.iter().map(String::as_str), &articles),
    };

    fs::create_dir_all(output_dir)?;
    let mut summary = RenderSummary {
        assets: copy_assets(assets_dir, output_dir)?,
        ..RenderSummary::default()
    };

    for entry in &entries {
        let related = related_entries(entry, &entries, config.site.related_posts);
        let page = render_article(&site, entry, &related)?;
        write_page(output_dir, &entry.href, page)?;
        summary.articles += 1;
    }

    let per_page = config.site.posts_per_page.max(1);
    let total_pages = entries.len().div_ceil(per_page).max(1);
    for page_num in 1..=total_pages {
        let start = (page_num - 1) * per_page;
        let chunk = &entries[start.min(entries.len())..(start + per_page).min(entries.len())];
        let page = render_index(&site, chunk, page_num, total_pages);
        write_page(output_dir, &index_filename(page_num), page)?;
        summary.index_pages += 1;
    }

    for (label, file) in &site.labels {
        let tagged: Vec<&Entry> = entries.iter().filter(|e| e.post.has_label(label)).collect();
        let page = render_label_page(&site, label, file, &tagged);
        write_page(output_dir, file, page)?;
        summary.label_pages += 1;
    }

    info!(
        articles = summary.articles,
        index_pages = summary.index_pages,
        label_pages = summary.label_pages,
        assets = summary.assets,
        output = %output_dir.display(),
        "site generated"
    );
    Ok(summary)
}

fn published_entries<'a>(
    corpus: &'a Corpus,
    live_ids: &BTreeSet<String>,
    censor: &Censor,
    snippet_words: usize,
) -> Vec<Entry<'a>> {
    let mut posts: Vec<&Post> = live_ids
        .iter()
        .filter_map(|id| {
            let post = corpus.get(id);
            if post.is_none() {
                warn!(id = %id, "published post missing from cache, skipping");
            }
            post
        })
        .collect();
    posts.sort_by(|a, b| recency_order(a, b));

    posts
        .into_iter()
        .map(|post| {
            let text = match &post.enrichment {
                Some(e) => Cow::Borrowed(e),
                None => Cow::Owned(enrich::censored(post, censor)),
            };
            Entry {
                href: article_filename(&text.processed_title, &post.id),
                snippet: snippet(text.article_text(), snippet_words),
                thumbnail: thumbnail(post),
                text,
                post,
            }
        })
        .collect()
}

/// Up to `limit` other posts sharing a label, in label order then recency.
fn related_entries<'e, 'a>(
    entry: &Entry<'a>,
    entries: &'e [Entry<'a>],
    limit: usize,
) -> Vec<&'e Entry<'a>> {
    let mut related: Vec<&Entry> = Vec::new();
    for label in &entry.post.labels {
        for other in entries {
            if related.len() >= limit {
                return related;
            }
            if other.post.id != entry.post.id
                && other.post.has_label(label)
                && !related.iter().any(|r| r.post.id == other.post.id)
            {
                related.push(other);
            }
        }
    }
    related
}

fn write_page(output_dir: &Path, filename: &str, page: Markup) -> Result<(), GenerateError> {
    fs::write(output_dir.join(filename), page.into_string())?;
    debug!(file = filename, "wrote page");
    Ok(())
}

/// Copy every file under `assets_dir` into `output_dir`, keeping relative
/// paths. A missing assets directory copies nothing.
fn copy_assets(assets_dir: &Path, output_dir: &Path) -> Result<usize, GenerateError> {
    if !assets_dir.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(assets_dir).sort_by_file_name() {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(assets_dir) else {
            continue;
        };
        let target = output_dir.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

// ============================================================================
// Text helpers
// ============================================================================

/// First `limit` words of `text`, with `...` appended when cut.
pub fn snippet(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > limit {
        format!("{}...", words[..limit].join(" "))
    } else {
        words.join(" ")
    }
}

/// First source image, else the first `<img>` in the content.
pub fn thumbnail(post: &Post) -> Option<String> {
    post.images
        .first()
        .map(|img| img.url.clone())
        .filter(|url| !url.is_empty())
        .or_else(|| Fragment::parse(&post.content).first_image_src())
}

fn display_date(post: &Post) -> String {
    post.published_at()
        .map(|dt| dt.format("%-d %B %Y").to_string())
        .unwrap_or_else(|| post.published.clone())
}

fn absolute_url(config: &SiteConfig, filename: &str) -> String {
    format!("{}/{}", config.site.base_url.trim_end_matches('/'), filename)
}

/// Serialize JSON-LD for embedding in a `<script>` element.
fn json_ld(value: &serde_json::Value) -> Result<Markup, GenerateError> {
    let json = serde_json::to_string(value)?;
    Ok(html! {
        script type="application/ld+json" { (PreEscaped(json.replace("</", "<\\/"))) }
    })
}

fn breadcrumb_json(site: &Site, entry: &Entry) -> serde_json::Value {
    let config = site.config;
    let mut items = vec![json!({
        "@type": "ListItem",
        "position": 1,
        "name": "Home",
        "item": absolute_url(config, &index_filename(1)),
    })];
    if let Some((label, href)) = primary_label_link(site, entry) {
        items.push(json!({
            "@type": "ListItem",
            "position": 2,
            "name": label,
            "item": absolute_url(config, href),
        }));
    }
    items.push(json!({
        "@type": "ListItem",
        "position": items.len() + 1,
        "name": entry.title(),
        "item": absolute_url(config, &entry.href),
    }));
    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": items,
    })
}

fn primary_label_link<'s>(site: &'s Site, entry: &'s Entry) -> Option<(&'s str, &'s str)> {
    let label = entry.post.primary_label()?;
    Some((label, site.label_href(label)?))
}

fn blog_posting_json(config: &SiteConfig, entry: &Entry) -> serde_json::Value {
    let mut posting = json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": entry.title(),
        "datePublished": entry.post.published,
        "url": absolute_url(config, &entry.href),
        "mainEntityOfPage": absolute_url(config, &entry.href),
        "keywords": entry.post.labels.join(", "),
        "publisher": { "@type": "Organization", "name": config.site.title },
    });
    if !entry.post.updated.is_empty() {
        posting["dateModified"] = json!(entry.post.updated);
    }
    if let Some(image) = &entry.thumbnail {
        posting["image"] = json!(image);
    }
    posting
}

// ============================================================================
// HTML Components
// ============================================================================

struct Head<'a> {
    title: &'a str,
    description: &'a str,
    canonical: Option<String>,
    structured_data: Markup,
}

/// Renders the base HTML document structure
fn base_document(site: &Site, head: Head, current_label: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(site.config.site.language) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (head.title) }
                @if !head.description.is_empty() {
                    meta name="description" content=(head.description);
                }
                @if let Some(url) = &head.canonical {
                    link rel="canonical" href=(url);
                }
                style { (PreEscaped(&site.css)) }
                (head.structured_data)
            }
            body {
                (site_header(site))
                div.layout {
                    main { (content) }
                    (label_sidebar(site, current_label))
                }
                footer.site-footer {
                    p { "© " (site.config.site.title) }
                }
            }
        }
    }
}

fn site_header(site: &Site) -> Markup {
    html! {
        header.site-header {
            a.site-title href=(index_filename(1)) {
                @if let Some(logo) = &site.config.site.logo {
                    img.site-logo src=(logo) alt=(site.config.site.title);
                }
                span { (site.config.site.title) }
            }
            @if !site.config.site.description.is_empty() {
                p.site-description { (site.config.site.description) }
            }
        }
    }
}

/// Sidebar navigation listing every label.
fn label_sidebar(site: &Site, current: Option<&str>) -> Markup {
    html! {
        aside.sidebar {
            h2 { "Labels" }
            ul.label-list {
                @for (label, href) in &site.labels {
                    @let is_current = current == Some(label.as_str());
                    li class=[is_current.then_some("current")] {
                        a href=(href) { (label) }
                    }
                }
            }
        }
    }
}

fn post_card(entry: &Entry) -> Markup {
    html! {
        article.post-card {
            @if let Some(src) = &entry.thumbnail {
                a.post-thumb href=(entry.href) {
                    img src=(src) alt=(entry.title()) loading="lazy";
                }
            }
            div.post-summary {
                h2 { a href=(entry.href) { (entry.title()) } }
                p.post-date { (entry.date()) }
                p.post-snippet { (entry.snippet) }
            }
        }
    }
}

fn post_list(entries: &[&Entry]) -> Markup {
    html! {
        @if entries.is_empty() {
            p.empty { "No posts yet." }
        } @else {
            div.post-list {
                @for entry in entries {
                    (post_card(entry))
                }
            }
        }
    }
}

fn pagination(page_num: usize, total_pages: usize) -> Markup {
    let prev = (page_num > 1).then(|| index_filename(page_num - 1));
    let next = (page_num < total_pages).then(|| index_filename(page_num + 1));
    html! {
        @if prev.is_some() || next.is_some() {
            nav.pagination {
                @if let Some(href) = prev {
                    a.prev href=(href) { "« Newer" }
                }
                span.page-count { "Page " (page_num) " of " (total_pages) }
                @if let Some(href) = next {
                    a.next href=(href) { "Older »" }
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_article(site: &Site, entry: &Entry, related: &[&Entry]) -> Result<Markup, GenerateError> {
    let config = site.config;
    let breadcrumb_ld = json_ld(&breadcrumb_json(site, entry))?;
    let posting_ld = json_ld(&blog_posting_json(config, entry))?;
    let structured_data = html! {
        (breadcrumb_ld)
        (posting_ld)
    };
    let body = match &entry.text.ai_edited_text {
        Some(text) => paragraphs_to_html(text),
        None => PreEscaped(entry.text.content_html.clone()),
    };

    let content = html! {
        nav.breadcrumb {
            a href=(index_filename(1)) { "Home" }
            @if let Some((label, href)) = primary_label_link(site, entry) {
                " › "
                a href=(href) { (label) }
            }
            " › "
            span { (entry.title()) }
        }
        article.post {
            header.post-header {
                h1 { (entry.title()) }
                p.post-date { time datetime=(entry.post.published) { (entry.date()) } }
                @if !entry.post.labels.is_empty() {
                    ul.post-labels {
                        @for label in &entry.post.labels {
                            @if let Some(href) = site.label_href(label) {
                                li { a href=(href) { (label) } }
                            }
                        }
                    }
                }
            }
            div.post-body { (body) }
        }
        @if !related.is_empty() {
            section.related-posts {
                h2 { "Related posts" }
                ul {
                    @for other in related {
                        li {
                            a href=(other.href) {
                                @if let Some(src) = &other.thumbnail {
                                    img src=(src) alt=(other.title()) loading="lazy";
                                }
                                span { (other.title()) }
                            }
                        }
                    }
                }
            }
        }
    };

    let head = Head {
        title: &format!("{} | {}", entry.title(), config.site.title),
        description: &snippet(&entry.snippet, 30),
        canonical: Some(absolute_url(config, &entry.href)),
        structured_data,
    };
    Ok(base_document(site, head, entry.post.primary_label(), content))
}

fn render_index(site: &Site, entries: &[Entry], page_num: usize, total_pages: usize) -> Markup {
    let refs: Vec<&Entry> = entries.iter().collect();
    let content = html! {
        (post_list(&refs))
        (pagination(page_num, total_pages))
    };
    let title = if page_num > 1 {
        format!("{} | Page {}", site.config.site.title, page_num)
    } else {
        site.config.site.title.clone()
    };
    let head = Head {
        title: &title,
        description: &site.config.site.description,
        canonical: Some(absolute_url(site.config, &index_filename(page_num))),
        structured_data: html! {},
    };
    base_document(site, head, None, content)
}

fn render_label_page(site: &Site, label: &str, file: &str, entries: &[&Entry]) -> Markup {
    let content = html! {
        nav.breadcrumb {
            a href=(index_filename(1)) { "Home" }
            " › "
            span { (label) }
        }
        h1.label-title { (label) }
        (post_list(entries))
    };
    let head = Head {
        title: &format!("{} | {}", label, site.config.site.title),
        description: &site.config.site.description,
        canonical: Some(absolute_url(site.config, file)),
        structured_data: html! {},
    };
    base_document(site, head, Some(label), content)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::post;
    use crate::types::PostImage;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn live(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn render(corpus: &Corpus, ids: &[&str], config: &SiteConfig) -> (TempDir, RenderSummary) {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("dist");
        let summary = generate(
            corpus,
            &live(ids),
            &Censor::disabled(),
            config,
            &out,
            &tmp.path().join("assets"),
        )
        .unwrap();
        (tmp, summary)
    }

    fn read(tmp: &TempDir, file: &str) -> String {
        fs::read_to_string(tmp.path().join("dist").join(file)).unwrap()
    }

    // =========================================================================
    // Text helpers
    // =========================================================================

    #[test]
    fn snippet_truncates_with_ellipsis() {
        assert_eq!(snippet("a b c d", 2), "a b...");
        assert_eq!(snippet("a  b\n c", 3), "a b c");
        assert_eq!(snippet("", 3), "");
    }

    #[test]
    fn thumbnail_prefers_source_images() {
        let mut p = post("1", "2024-01-01", &[]);
        p.content = r#"<p><img src="inline.jpg"></p>"#.into();
        assert_eq!(thumbnail(&p).as_deref(), Some("inline.jpg"));

        p.images = vec![PostImage {
            url: "listed.jpg".into(),
        }];
        assert_eq!(thumbnail(&p).as_deref(), Some("listed.jpg"));
    }

    #[test]
    fn thumbnail_absent() {
        assert_eq!(thumbnail(&post("1", "2024-01-01", &[])), None);
    }

    #[test]
    fn json_ld_escapes_closing_tags() {
        let markup = json_ld(&json!({ "name": "</script><b>" })).unwrap().into_string();
        assert!(!markup.contains("</script><b>"));
        assert!(markup.contains(r"<\/script>"));
    }

    // =========================================================================
    // Site generation
    // =========================================================================

    #[test]
    fn writes_articles_index_and_labels() {
        let corpus = Corpus::from_posts(vec![
            post("1", "2024-01-01", &["x"]),
            post("2", "2024-02-01", &["x", "y"]),
            post("3", "2024-03-01", &["z"]),
        ]);
        let (tmp, summary) = render(&corpus, &["1", "2"], &SiteConfig::default());

        assert_eq!(
            summary,
            RenderSummary {
                articles: 2,
                index_pages: 1,
                label_pages: 3,
                assets: 0,
            }
        );
        let index = read(&tmp, "index.html");
        assert!(index.starts_with("<!DOCTYPE html>"));
        let newer = index.find("post-2-2.html").unwrap();
        let older = index.find("post-1-1.html").unwrap();
        assert!(newer < older);
        assert!(!index.contains("post-3-3.html"));

        assert!(read(&tmp, "post-2-2.html").contains("Body of post 2."));
        assert!(read(&tmp, "x.html").contains("post-1-1.html"));
        assert!(read(&tmp, "z.html").contains("No posts yet."));
    }

    #[test]
    fn every_page_lists_all_labels() {
        let corpus = Corpus::from_posts(vec![
            post("1", "2024-01-01", &["alpha"]),
            post("2", "2024-02-01", &["beta"]),
        ]);
        let (tmp, _) = render(&corpus, &["1"], &SiteConfig::default());
        for file in ["index.html", "post-1-1.html", "alpha.html"] {
            let page = read(&tmp, file);
            assert!(page.contains(r#"href="alpha.html""#), "{file}");
            assert!(page.contains(r#"href="beta.html""#), "{file}");
        }
    }

    #[test]
    fn paginates_index() {
        let posts: Vec<Post> = (1..=5)
            .map(|i| post(&i.to_string(), &format!("2024-01-0{i}"), &[]))
            .collect();
        let ids: Vec<String> = (1..=5).map(|i| i.to_string()).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut config = SiteConfig::default();
        config.site.posts_per_page = 2;

        let (tmp, summary) = render(&Corpus::from_posts(posts), &id_refs, &config);

        assert_eq!(summary.index_pages, 3);
        let first = read(&tmp, "index.html");
        assert!(first.contains("post-5-5.html"));
        assert!(first.contains(r#"href="index_p2.html""#));
        let second = read(&tmp, "index_p2.html");
        assert!(second.contains(r#"href="index.html">« Newer"#));
        assert!(second.contains(r#"href="index_p3.html""#));
        let third = read(&tmp, "index_p3.html");
        assert!(third.contains("post-1-1.html"));
        assert!(!third.contains("Older"));
    }

    #[test]
    fn empty_site_still_has_index() {
        let (tmp, summary) = render(&Corpus::new(), &[], &SiteConfig::default());
        assert_eq!(summary.index_pages, 1);
        assert!(read(&tmp, "index.html").contains("No posts yet."));
    }

    #[test]
    fn unknown_live_id_is_skipped() {
        let corpus = Corpus::from_posts(vec![post("1", "2024-01-01", &[])]);
        let (_tmp, summary) = render(&corpus, &["1", "ghost"], &SiteConfig::default());
        assert_eq!(summary.articles, 1);
    }

    #[test]
    fn output_is_deterministic() {
        let corpus = Corpus::from_posts(vec![
            post("1", "2024-01-01", &["x"]),
            post("2", "2024-01-01", &["x"]),
        ]);
        let (a, _) = render(&corpus, &["1", "2"], &SiteConfig::default());
        let (b, _) = render(&corpus, &["1", "2"], &SiteConfig::default());
        for file in ["index.html", "post-1-1.html", "x.html"] {
            assert_eq!(read(&a, file), read(&b, file));
        }
    }

    #[test]
    fn label_named_index_keeps_the_home_page() {
        let corpus = Corpus::from_posts(vec![
            post("1", "2024-01-01", &["x"]),
            post("2", "2024-02-01", &["Index"]),
        ]);
        let (tmp, summary) = render(&corpus, &["1"], &SiteConfig::default());

        assert_eq!(summary.label_pages, 2);
        let index = read(&tmp, "index.html");
        assert!(index.contains("post-1-1.html"));
        assert!(!index.contains("label-title"));
        assert!(read(&tmp, "index-label.html").contains("label-title"));
        assert!(index.contains(r#"href="index-label.html""#));
    }

    #[test]
    fn label_named_like_an_article_keeps_the_article() {
        let corpus = Corpus::from_posts(vec![post("1", "2024-01-01", &["Post 1 1"])]);
        let (tmp, _) = render(&corpus, &["1"], &SiteConfig::default());

        let article = read(&tmp, "post-1-1.html");
        assert!(article.contains("Body of post 1."));
        assert!(article.contains(r#"href="post-1-1-label.html""#));
        assert!(read(&tmp, "post-1-1-label.html").contains("label-title"));
    }

    #[test]
    fn labels_sharing_a_slug_each_get_a_page() {
        let corpus = Corpus::from_posts(vec![
            post("1", "2024-01-01", &["News"]),
            post("2", "2024-02-01", &["news"]),
        ]);
        let (tmp, summary) = render(&corpus, &["1", "2"], &SiteConfig::default());

        assert_eq!(summary.label_pages, 2);
        let upper = read(&tmp, "news.html");
        let lower = read(&tmp, "news-2.html");
        assert!(upper.contains("post-1-1.html") && !upper.contains("post-2-2.html"));
        assert!(lower.contains("post-2-2.html") && !lower.contains("post-1-1.html"));
        assert!(read(&tmp, "post-2-2.html").contains(r#"href="news-2.html""#));
    }

    // =========================================================================
    // Article page
    // =========================================================================

    #[test]
    fn article_uses_edited_text_when_present() {
        let mut p = post("1", "2024-01-01", &["x"]);
        p.enrichment = Some(Enrichment {
            processed_title: "Clean Title".into(),
            content_html: "<p>censored markup</p>".into(),
            plain_text: "censored markup".into(),
            ai_edited_text: Some("Fresh lead.\n\nSecond para".into()),
        });
        let (tmp, _) = render(&Corpus::from_posts(vec![p]), &["1"], &SiteConfig::default());
        let page = read(&tmp, "clean-title-1.html");
        assert!(page.contains("<p>Fresh lead.</p><p>Second para</p>"));
        assert!(!page.contains("censored markup</p>"));
    }

    #[test]
    fn article_falls_back_to_censored_markup() {
        let mut p = post("1", "2024-01-01", &[]);
        p.content = r#"<p>See <a href="https://spam.test">darn site</a></p>"#.into();
        let tmp = TempDir::new().unwrap();
        let censor =
            Censor::new(&BTreeMap::from([("darn".to_string(), "d*rn".to_string())])).unwrap();
        generate(
            &Corpus::from_posts(vec![p]),
            &live(&["1"]),
            &censor,
            &SiteConfig::default(),
            &tmp.path().join("dist"),
            &tmp.path().join("assets"),
        )
        .unwrap();
        let page = read(&tmp, "post-1-1.html");
        assert!(page.contains("<p>See d*rn site</p>"));
        assert!(!page.contains("spam.test"));
    }

    #[test]
    fn article_drops_upstream_scripts_and_styles() {
        let mut p = post("1", "2024-01-01", &[]);
        p.content = r#"<p>hi</p><script>alert(1)</script><p style="color:red">x</p>"#.into();
        let (tmp, _) = render(&Corpus::from_posts(vec![p]), &["1"], &SiteConfig::default());
        let page = read(&tmp, "post-1-1.html");
        assert!(page.contains("<p>hi</p><p>x</p>"));
        assert!(!page.contains("alert(1)"));
        assert!(!page.contains("color:red"));
    }

    #[test]
    fn article_has_breadcrumb_and_posting_json_ld() {
        let corpus = Corpus::from_posts(vec![post("1", "2024-01-01", &["News Items"])]);
        let mut config = SiteConfig::default();
        config.site.base_url = "https://blog.test/".into();
        let (tmp, _) = render(&corpus, &["1"], &config);
        let page = read(&tmp, "post-1-1.html");
        assert!(page.contains(r#""@type":"BreadcrumbList""#));
        assert!(page.contains(r#""item":"https://blog.test/news-items.html""#));
        assert!(page.contains(r#""@type":"BlogPosting""#));
        assert!(page.contains(r#"<link rel="canonical" href="https://blog.test/post-1-1.html">"#));
    }

    #[test]
    fn unlabelled_breadcrumb_has_two_items() {
        let corpus = Corpus::from_posts(vec![post("1", "2024-01-01", &[])]);
        let config = SiteConfig::default();
        let site = Site {
            config: &config,
            css: String::new(),
            labels: BTreeMap::new(),
        };
        let entries = published_entries(&corpus, &live(&["1"]), &Censor::disabled(), 10);
        let crumbs = breadcrumb_json(&site, &entries[0]);
        let items = crumbs["itemListElement"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["position"], 2);
        assert_eq!(items[1]["name"], "Post 1");
    }

    #[test]
    fn related_posts_share_a_label_and_are_capped() {
        let corpus = Corpus::from_posts(vec![
            post("1", "2024-01-01", &["x"]),
            post("2", "2024-01-02", &["x"]),
            post("3", "2024-01-03", &["x"]),
            post("4", "2024-01-04", &["x"]),
            post("5", "2024-01-05", &["y"]),
        ]);
        let entries = published_entries(
            &corpus,
            &live(&["1", "2", "3", "4", "5"]),
            &Censor::disabled(),
            10,
        );
        let first = entries.iter().find(|e| e.post.id == "1").unwrap();
        let related: Vec<&str> = related_entries(first, &entries, 2)
            .iter()
            .map(|e| e.post.id.as_str())
            .collect();
        assert_eq!(related, vec!["4", "3"]);
    }

    // =========================================================================
    // Assets
    // =========================================================================

    #[test]
    fn copies_assets_into_output_root() {
        let tmp = TempDir::new().unwrap();
        let assets = tmp.path().join("assets");
        fs::create_dir_all(assets.join("img")).unwrap();
        fs::write(assets.join("logo.png"), b"png").unwrap();
        fs::write(assets.join("img/bg.jpg"), b"jpg").unwrap();
        let mut config = SiteConfig::default();
        config.site.logo = Some("logo.png".into());

        let summary = generate(
            &Corpus::new(),
            &BTreeSet::new(),
            &Censor::disabled(),
            &config,
            &tmp.path().join("dist"),
            &assets,
        )
        .unwrap();

        assert_eq!(summary.assets, 2);
        assert!(tmp.path().join("dist/logo.png").exists());
        assert!(tmp.path().join("dist/img/bg.jpg").exists());
        assert!(read(&tmp, "index.html").contains(r#"src="logo.png""#));
    }
}
