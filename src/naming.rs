//! Output file naming.
//!
//! Every generated page lives flat in the output directory:
//!
//! - Article: `{slug(title)}-{id}.html`, e.g. `my-first-post-4213.html`.
//!   The id suffix keeps names unique when titles repeat.
//! - Index: `index.html`, then `index_p2.html`, `index_p3.html`, ...
//! - Label: `{slug(label)}.html`, e.g. `Travel Notes` → `travel-notes.html`.
//!
//! Titles passed here are the display titles (already censored), so banned
//! words never end up in a URL.
//!
//! Label names are the only ones that can clash: `Index` slugs to the home
//! page, `Post 1 1` to the article `post-1-1.html`, and `News`/`news` to the
//! same file. [`label_filenames`] hands out one unique file per label:
//!
//! | Label | File |
//! |-------|------|
//! | `Index` | `index-label.html` |
//! | `News` | `news.html` |
//! | `news` | `news-2.html` |

use std::collections::{BTreeMap, BTreeSet};

/// Slug used when a title or label has no sluggable characters.
const FALLBACK_ARTICLE_SLUG: &str = "post";
const FALLBACK_LABEL_SLUG: &str = "label";

pub fn article_filename(title: &str, id: &str) -> String {
    let slug = slug::slugify(title);
    let slug = if slug.is_empty() {
        FALLBACK_ARTICLE_SLUG
    } else {
        slug.as_str()
    };
    format!("{slug}-{}.html", slug::slugify(id))
}

/// Index page file for a 1-based page number.
pub fn index_filename(page: usize) -> String {
    if page <= 1 {
        "index.html".to_string()
    } else {
        format!("index_p{page}.html")
    }
}

fn label_stem(label: &str) -> String {
    let slug = slug::slugify(label);
    if slug.is_empty() {
        FALLBACK_LABEL_SLUG.to_string()
    } else {
        slug
    }
}

/// `index` or `index_p{N}`.
fn is_index_stem(stem: &str) -> bool {
    stem == "index"
        || stem
            .strip_prefix("index_p")
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Assign every label its own output file, keyed by label.
///
/// Labels are named in the order given. A name that would hit an index page
/// or a file in `reserved` gets a `-label` suffix; a name an earlier label
/// already took gets `-2`, `-3`, ... The result is deterministic for a given
/// label order and reserved set.
pub fn label_filenames<'a>(
    labels: impl IntoIterator<Item = &'a str>,
    reserved: &BTreeSet<String>,
) -> BTreeMap<String, String> {
    let clashes = |stem: &str, taken: &BTreeSet<String>| {
        is_index_stem(stem) || taken.contains(stem) || reserved.contains(&format!("{stem}.html"))
    };

    let mut taken: BTreeSet<String> = BTreeSet::new();
    let mut names = BTreeMap::new();
    for label in labels {
        let mut base = label_stem(label);
        if is_index_stem(&base) || reserved.contains(&format!("{base}.html")) {
            base.push_str("-label");
        }
        let mut stem = base.clone();
        let mut n = 2;
        while clashes(&stem, &taken) {
            stem = format!("{base}-{n}");
            n += 1;
        }
        names.insert(label.to_string(), format!("{stem}.html"));
        taken.insert(stem);
    }
    names
}
