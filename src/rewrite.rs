//! Best-effort paraphrasing of a post's opening passage.
//!
//! The first `lead_words` words of the censored plain text are sent to a
//! generative text service with an instruction to paraphrase while keeping
//! the meaning. The reply replaces that lead span; the rest of the text is
//! kept untouched. Posts shorter than `min_words` are left alone.
//!
//! Nothing in here is allowed to fail a run. Every error from the service is
//! folded into [`RewriteOutcome::Failed`] and the caller keeps the original
//! text.

use crate::config::RewriteConfig;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("service returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("prompt blocked: {0}")]
    Blocked(String),
    #[error("response contained no text")]
    EmptyResponse,
    #[error("{0}")]
    Service(String),
}

/// A generative text service: one prompt in, one plain-text reply out.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, RewriteError>;
}

/// Result of trying to rewrite one post's lead span.
#[derive(Debug, Clone, PartialEq)]
pub enum RewriteOutcome {
    /// The service answered; holds the full recomposed article text.
    Edited(String),
    /// Fewer words than the configured minimum.
    TooShort { words: usize },
    /// Rewriting is turned off in config.
    Disabled,
    /// The service failed; the original text is kept.
    Failed(String),
}

impl RewriteOutcome {
    pub fn edited_text(&self) -> Option<&str> {
        match self {
            Self::Edited(text) => Some(text),
            _ => None,
        }
    }
}

/// Try to paraphrase the lead of `text`.
pub fn rewrite_lead(
    text: &str,
    generator: Option<&dyn TextGenerator>,
    config: &RewriteConfig,
) -> RewriteOutcome {
    let Some(generator) = generator.filter(|_| config.enabled) else {
        return RewriteOutcome::Disabled;
    };

    let words = text.split_whitespace().count();
    if words < config.min_words {
        return RewriteOutcome::TooShort { words };
    }

    let (lead, rest) = split_at_word(text, config.lead_words);
    let prompt = config.prompt.replace("{text}", lead.trim_end());
    debug!(lead_words = config.lead_words.min(words), "requesting rewrite");

    match generator.generate(&prompt) {
        Ok(reply) if !reply.trim().is_empty() => {
            let separator = &lead[lead.trim_end().len()..];
            RewriteOutcome::Edited(compose(reply.trim(), separator, rest))
        }
        Ok(_) => {
            warn!("rewrite returned empty text, keeping original");
            RewriteOutcome::Failed(RewriteError::EmptyResponse.to_string())
        }
        Err(err) => {
            warn!(error = %err, "rewrite failed, keeping original");
            RewriteOutcome::Failed(err.to_string())
        }
    }
}

fn compose(edited_lead: &str, separator: &str, rest: &str) -> String {
    if rest.is_empty() {
        return edited_lead.to_string();
    }
    let separator = if separator.is_empty() { " " } else { separator };
    format!("{edited_lead}{separator}{rest}")
}

/// Split `text` before its `(n + 1)`th word.
///
/// The lead keeps the whitespace that followed its last word, so
/// `lead + rest == text` always holds.
pub fn split_at_word(text: &str, n: usize) -> (&str, &str) {
    let mut count = 0;
    let mut in_word = false;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            if count == n {
                return text.split_at(idx);
            }
            count += 1;
            in_word = true;
        }
    }
    (text, "")
}

/// Wrap each blank-line-delimited paragraph in `<p>`, turning single
/// newlines into `<br>`.
pub fn paragraphs_to_html(text: &str) -> Markup {
    let paragraphs: Vec<Vec<&str>> = text
        .split("\n\n")
        .map(|para| {
            para.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|lines| !lines.is_empty())
        .collect();

    html! {
        @for lines in &paragraphs {
            p {
                @for (i, line) in lines.iter().enumerate() {
                    @if i > 0 { br; }
                    (line)
                }
            }
        }
    }
}

// ============================================================================
// Gemini client
// ============================================================================

const HARM_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// [`TextGenerator`] backed by the Gemini `generateContent` endpoint.
pub struct GeminiGenerator {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
    safety_threshold: String,
    generation: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    safety_settings: Vec<SafetySetting<'a>>,
    generation_config: &'a GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SafetySetting<'a> {
    category: &'a str,
    threshold: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiGenerator {
    pub fn new(api_key: &str, config: &RewriteConfig) -> Result<Self, RewriteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!(
                "{}/models/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            api_key: api_key.to_string(),
            safety_threshold: config.safety_threshold.clone(),
            generation: GenerationConfig {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                max_output_tokens: config.max_output_tokens,
            },
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: &self.safety_threshold,
                })
                .collect(),
            generation_config: &self.generation,
        }
    }
}

impl TextGenerator for GeminiGenerator {
    fn generate(&self, prompt: &str) -> Result<String, RewriteError> {
        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(prompt))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RewriteError::Status { status, body });
        }
        extract_text(response.json()?)
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, RewriteError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(RewriteError::Blocked(reason));
    }
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(RewriteError::EmptyResponse);
    }
    Ok(text)
}
