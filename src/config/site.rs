//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub author_role: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub content_dir: String,
    pub blog_dir: String,

    /// Optional metadata file (relative to the base dir); built-in table when unset
    pub registry: Option<String>,

    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Deep Lekhak".to_string(),
            subtitle: "Backend Developer & Code Crusader".to_string(),
            author: "Deep Lekhak".to_string(),
            author_role: "Backend Developer & Code Crusader".to_string(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            content_dir: "public".to_string(),
            blog_dir: "blog".to_string(),

            registry: None,

            store: StoreConfig::default(),
            highlight: HighlightConfig::default(),
            markdown: MarkdownConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Where post bodies are fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Read from `content_dir` on the local filesystem
    Fs,
    /// GET from `store.base_url`
    Http,
}

/// Content store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Fs,
            base_url: "http://localhost:4000".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// Markdown rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Pass raw HTML in post bodies through to the page.
    /// Only safe while every post comes from the site's own store.
    pub allow_raw_html: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            allow_raw_html: true,
        }
    }
}
