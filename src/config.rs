//! Site configuration and credentials.
//!
//! Two sources feed a run:
//!
//! - **`config.toml`** (optional): everything that shapes the output and
//!   the transforms. Loaded once, merged over stock defaults, validated,
//!   then passed by reference to every component.
//! - **Environment**: the three API credentials. They are never read from
//!   the config file so the file can be committed alongside the site.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "My Blog"
//! base_url = "https://example.github.io"
//! description = ""
//! language = "en"
//! posts_per_page = 10       # Entries per index page
//! related_posts = 3         # Related links under each article
//! snippet_words = 100       # Words in index/label page snippets
//! # logo = "logo.png"       # Relative to paths.assets_dir
//!
//! [paths]
//! output_dir = "dist"
//! state_dir = ".state"      # Corpus cache + publication ledger
//! assets_dir = "assets"     # Copied verbatim into output_dir
//!
//! [source]
//! api_base = "https://www.googleapis.com/blogger/v3"
//! max_results = 500
//! timeout_secs = 30
//!
//! [rewrite]
//! enabled = true
//! lead_words = 300
//! min_words = 50
//! # ... model, prompt and sampling settings, see `gen-config`
//!
//! [censor.words]
//! "banned phrase" = "replacement"
//!
//! [colors.light]
//! background = "#ffffff"
//! # ...
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::sanitize::Censor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const ENV_BLOGGER_API_KEY: &str = "BLOGGER_API_KEY";
pub const ENV_BLOGGER_BLOG_ID: &str = "BLOGGER_BLOG_ID";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("environment variable {0} is missing or empty")]
    MissingEnv(&'static str),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site identity and page layout.
    pub site: SiteSection,
    /// Output, state and asset directories.
    pub paths: PathsConfig,
    /// Content API settings.
    pub source: SourceConfig,
    /// Lead-span paraphrasing.
    pub rewrite: RewriteConfig,
    /// Banned-term substitution table.
    pub censor: CensorConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.posts_per_page == 0 {
            return Err(ConfigError::Validation(
                "site.posts_per_page must be at least 1".into(),
            ));
        }
        if self.rewrite.lead_words == 0 {
            return Err(ConfigError::Validation(
                "rewrite.lead_words must be at least 1".into(),
            ));
        }
        if self.rewrite.min_words > self.rewrite.lead_words {
            return Err(ConfigError::Validation(
                "rewrite.min_words must not exceed rewrite.lead_words".into(),
            ));
        }
        if !self.rewrite.prompt.contains("{text}") {
            return Err(ConfigError::Validation(
                "rewrite.prompt must contain the {text} placeholder".into(),
            ));
        }
        self.censor()?;
        Ok(())
    }

    /// Compile the banned-term table.
    pub fn censor(&self) -> Result<Censor, ConfigError> {
        Censor::new(&self.censor.words)
            .map_err(|e| ConfigError::Validation(format!("censor.words: {e}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    pub title: String,
    /// Absolute URL of the published site root, without trailing slash.
    pub base_url: String,
    pub description: String,
    /// `lang` attribute of generated pages.
    pub language: String,
    pub posts_per_page: usize,
    pub related_posts: usize,
    pub snippet_words: usize,
    /// Logo file name inside the assets directory.
    pub logo: Option<String>,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            base_url: "https://example.github.io".to_string(),
            description: String::new(),
            language: "en".to_string(),
            posts_per_page: 10,
            related_posts: 3,
            snippet_words: 100,
            logo: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub output_dir: String,
    pub state_dir: String,
    pub assets_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: "dist".to_string(),
            state_dir: ".state".to_string(),
            assets_dir: "assets".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub api_base: String,
    /// Page size requested from the API.
    pub max_results: u32,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/blogger/v3".to_string(),
            max_results: 500,
            timeout_secs: 30,
        }
    }
}

pub const DEFAULT_PROMPT: &str = "Paraphrase the following passage. Keep its meaning, facts, \
names and language exactly; change sentence structure and word choice. Reply with the \
rewritten passage only, as plain text without headings, lists or commentary.\n\n{text}";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewriteConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Instruction sent to the model; `{text}` is replaced by the lead span.
    pub prompt: String,
    /// Words at the start of a post that are paraphrased.
    pub lead_words: usize,
    /// Posts with fewer words are not sent at all.
    pub min_words: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    /// Applied to every harm category.
    pub safety_threshold: String,
    pub timeout_secs: u64,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            lead_words: 300,
            min_words: 50,
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 2048,
            safety_threshold: "BLOCK_NONE".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CensorConfig {
    /// Banned term (case-insensitive, whole word) → replacement.
    pub words: BTreeMap<String, String>,
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub light: ColorScheme,
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Dates, breadcrumbs, snippets.
    pub text_muted: String,
    pub border: String,
    pub link: String,
    pub accent: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#1d1d1f".to_string(),
            text_muted: "#6b6b70".to_string(),
            border: "#e3e3e6".to_string(),
            link: "#1a56a8".to_string(),
            accent: "#c2410c".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#111113".to_string(),
            text: "#ececef".to_string(),
            text_muted: "#9a9aa2".to_string(),
            border: "#2c2c31".to_string(),
            link: "#7fb0ff".to_string(),
            accent: "#fb923c".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// API credentials, read from the environment at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub blogger_api_key: String,
    pub blog_id: String,
    pub gemini_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("blog_id", &self.blog_id)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Read all three credentials from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`. Every value is required and must
    /// be non-blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };
        Ok(Self {
            blogger_api_key: require(ENV_BLOGGER_API_KEY)?,
            blog_id: require(ENV_BLOGGER_BLOG_ID)?,
            gemini_api_key: require(ENV_GEMINI_API_KEY)?,
        })
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value. `Ok(None)` when it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load the config file at `path`, merged over stock defaults and validated.
///
/// A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let merged = match load_raw_config(path)? {
        Some(overlay) => merge_toml(stock_defaults_value(), overlay),
        None => stock_defaults_value(),
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# blog-trickle configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
#
# Credentials are NOT read from this file. Set them in the environment:
#   BLOGGER_API_KEY, BLOGGER_BLOG_ID, GEMINI_API_KEY

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
title = "My Blog"
# Absolute URL the site is served from (canonical links, JSON-LD).
base_url = "https://example.github.io"
description = ""
language = "en"
# Entries per index page (index.html, index_p2.html, ...).
posts_per_page = 10
# Related posts (sharing a label) listed under each article.
related_posts = 3
# Words shown in index and label page snippets.
snippet_words = 100
# Logo file inside assets_dir, shown in the page header.
# logo = "logo.png"

# ---------------------------------------------------------------------------
# Paths
# ---------------------------------------------------------------------------
[paths]
output_dir = "dist"
# Holds posts_cache.json and published_posts.json between runs.
state_dir = ".state"
# Copied verbatim into output_dir on every render.
assets_dir = "assets"

# ---------------------------------------------------------------------------
# Content source (Blogger API v3)
# ---------------------------------------------------------------------------
[source]
api_base = "https://www.googleapis.com/blogger/v3"
max_results = 500
timeout_secs = 30

# ---------------------------------------------------------------------------
# Lead paraphrasing (Gemini)
# ---------------------------------------------------------------------------
[rewrite]
enabled = true
endpoint = "https://generativelanguage.googleapis.com/v1beta"
model = "gemini-1.5-flash"
# Words at the start of each post sent for paraphrasing.
lead_words = 300
# Posts with fewer words are published unchanged.
min_words = 50
temperature = 0.7
top_p = 0.95
top_k = 40
max_output_tokens = 2048
# BLOCK_NONE | BLOCK_ONLY_HIGH | BLOCK_MEDIUM_AND_ABOVE | BLOCK_LOW_AND_ABOVE
safety_threshold = "BLOCK_NONE"
timeout_secs = 60
# Must contain {text}, which is replaced by the lead passage.
# prompt = "..."

# ---------------------------------------------------------------------------
# Word substitution
# ---------------------------------------------------------------------------
# Whole-word, case-insensitive; longer terms win over shorter ones.
# A replacement may not contain a banned term, nor any word of a
# multi-word banned term.
[censor.words]
# "banned phrase" = "replacement"

# ---------------------------------------------------------------------------
# Colors
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#1d1d1f"
text_muted = "#6b6b70"
border = "#e3e3e6"
link = "#1a56a8"
accent = "#c2410c"

[colors.dark]
background = "#111113"
text = "#ececef"
text_muted = "#9a9aa2"
border = "#2c2c31"
link = "#7fb0ff"
accent = "#fb923c"
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --color-bg: {light_bg};
    --color-text: {light_text};
    --color-text-muted: {light_text_muted};
    --color-border: {light_border};
    --color-link: {light_link};
    --color-accent: {light_accent};
}}

@media (prefers-color-scheme: dark) {{
    :root {{
        --color-bg: {dark_bg};
        --color-text: {dark_text};
        --color-text-muted: {dark_text_muted};
        --color-border: {dark_border};
        --color-link: {dark_link};
        --color-accent: {dark_accent};
    }}
}}"#,
        light_bg = colors.light.background,
        light_text = colors.light.text,
        light_text_muted = colors.light.text_muted,
        light_border = colors.light.border,
        light_link = colors.light.link,
        light_accent = colors.light.accent,
        dark_bg = colors.dark.background,
        dark_text = colors.dark.text,
        dark_text_muted = colors.dark.text_muted,
        dark_border = colors.dark.border,
        dark_link = colors.dark.link,
        dark_accent = colors.dark.accent,
    )
}
