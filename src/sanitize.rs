//! Deterministic word substitution and link removal.
//!
//! [`Censor`] compiles the configured banned-term table into a single
//! case-insensitive, whole-word regex. Alternatives are ordered longest
//! first, and the regex engine takes the first alternative that matches at a
//! position, so a multi-word phrase always wins over any single word inside
//! it (`"abc"` never becomes `replace("ab") + "c"`).
//!
//! "Whole word" means a match is never glued to a letter, digit or
//! underscore on either side. Terms that begin or end with punctuation
//! (`c++`, `.net`) match too: `c++` is found in `"I like c++ a lot"` but not
//! in `"c++x"`.
//!
//! Substitution is idempotent. [`Censor::new`] rejects a table where
//!
//! - a replacement itself contains a banned term, or
//! - a replacement contains a word of a multi-word banned term, since the
//!   replacement could then combine with its neighbours into that phrase
//!   (`crimson` → `red` next to `scalding` → `hot` spells `red hot`).
//!
//! With both excluded, a second pass finds nothing to do.
//!
//! [`sanitize`] applies the censor to every text node of a markup fragment,
//! unwraps `<a>` elements (keeping their text), removes `<script>` elements
//! other than JSON-LD, and strips inline `style` attributes.

use crate::markup::{ElementAction, Fragment, NodeRewriter};
use regex::{Captures, Regex, RegexBuilder};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CensorError {
    #[error("banned term must not be empty")]
    EmptyTerm,
    #[error("replacement {replacement:?} for {term:?} contains a banned term")]
    SelfMatchingReplacement { term: String, replacement: String },
    #[error("replacement {replacement:?} for {term:?} contains {word:?}, part of banned phrase {phrase:?}")]
    ComposableReplacement {
        term: String,
        replacement: String,
        word: String,
        phrase: String,
    },
    #[error("invalid banned-term pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Compiled banned-term table.
#[derive(Debug, Clone)]
pub struct Censor {
    /// `None` when the table is empty.
    pattern: Option<Regex>,
    /// Lower-cased term (inner whitespace collapsed) → replacement.
    replacements: HashMap<String, String>,
}

impl Censor {
    pub fn new(table: &BTreeMap<String, String>) -> Result<Self, CensorError> {
        if table.is_empty() {
            return Ok(Self::disabled());
        }

        let mut terms: Vec<&str> = Vec::with_capacity(table.len());
        let mut replacements = HashMap::with_capacity(table.len());
        for (term, replacement) in table {
            let term = term.trim();
            if term.is_empty() {
                return Err(CensorError::EmptyTerm);
            }
            terms.push(term);
            replacements.insert(match_key(term), replacement.clone());
        }
        // Longest first; ties alphabetically so the pattern is stable.
        terms.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });

        let alternatives: Vec<String> = terms.iter().map(|t| term_pattern(t)).collect();
        let pattern = whole_word(&alternatives.join("|"))?;

        for (term, replacement) in table {
            if pattern.is_match(replacement) {
                return Err(CensorError::SelfMatchingReplacement {
                    term: term.clone(),
                    replacement: replacement.clone(),
                });
            }
        }
        check_phrase_words(table, &terms)?;

        Ok(Self {
            pattern: Some(pattern),
            replacements,
        })
    }

    /// A censor that changes nothing.
    pub fn disabled() -> Self {
        Self {
            pattern: None,
            replacements: HashMap::new(),
        }
    }

    /// Replace every banned term in plain text.
    pub fn apply(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };
        pattern
            .replace_all(text, |caps: &Captures| {
                let matched = &caps[0];
                self.replacements
                    .get(&match_key(matched))
                    .cloned()
                    .unwrap_or_else(|| matched.to_string())
            })
            .into_owned()
    }
}

/// Reject replacements sharing a word with any multi-word term.
fn check_phrase_words(table: &BTreeMap<String, String>, terms: &[&str]) -> Result<(), CensorError> {
    for phrase in terms.iter().filter(|t| t.split_whitespace().nth(1).is_some()) {
        for word in phrase.split_whitespace() {
            let word_pattern = whole_word(&regex::escape(word))?;
            if let Some((term, replacement)) =
                table.iter().find(|(_, replacement)| word_pattern.is_match(replacement))
            {
                return Err(CensorError::ComposableReplacement {
                    term: term.clone(),
                    replacement: replacement.clone(),
                    word: word.to_string(),
                    phrase: phrase.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Case-insensitive regex matching `alternatives` only where no word
/// character touches the match on either side.
fn whole_word(alternatives: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!(r"\b{{start-half}}(?:{alternatives})\b{{end-half}}"))
        .case_insensitive(true)
        .build()
}

/// Regex for one term: escaped, with any run of inner whitespace matching
/// any run of whitespace in the text.
fn term_pattern(term: &str) -> String {
    term.split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

fn match_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

const JSON_LD_TYPE: &str = "application/ld+json";

/// Rewriter used by [`sanitize`].
struct Sanitizer<'a> {
    censor: &'a Censor,
}

impl NodeRewriter for Sanitizer<'_> {
    fn element(&mut self, name: &str, attrs: &[(&str, &str)]) -> ElementAction {
        match name {
            "a" => ElementAction::Unwrap,
            "script" if is_json_ld(attrs) => ElementAction::Keep,
            "script" => ElementAction::Drop,
            _ => ElementAction::Keep,
        }
    }

    fn keep_attribute(&mut self, _element: &str, attr: &str) -> bool {
        attr != "style"
    }

    fn text(&mut self, text: &str) -> String {
        self.censor.apply(text)
    }
}

fn is_json_ld(attrs: &[(&str, &str)]) -> bool {
    attrs
        .iter()
        .any(|(attr, value)| *attr == "type" && value.trim().eq_ignore_ascii_case(JSON_LD_TYPE))
}

/// Censor all text nodes of `markup`, remove outbound links, executable
/// scripts and inline styles. Other tags and attributes are preserved.
pub fn sanitize(markup: &str, censor: &Censor) -> String {
    Fragment::parse(markup).rewrite(&mut Sanitizer { censor })
}
