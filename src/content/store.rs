//! Content stores - where raw post bodies live
//!
//! A store answers `fetch(path)` with the body, `None` when the store says the
//! file does not exist, or a [`StoreError`] for anything else. Callers decide
//! how to degrade; the store never invents content.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::config::{SiteConfig, StoreKind};

/// Failures talking to a content store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store answered {status} for {path}")]
    Status { status: u16, path: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("content at {0} is not valid UTF-8")]
    Malformed(String),

    #[error("invalid content path: {0}")]
    InvalidPath(String),
}

/// A source of raw post bodies addressed by relative path (e.g. `blog/my-post.md`)
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch the body at `path`. `Ok(None)` means the store reported it absent.
    async fn fetch(&self, path: &str) -> Result<Option<String>, StoreError>;

    /// Human-readable location of `path`, used in logs and placeholder text
    fn locate(&self, path: &str) -> String {
        path.to_string()
    }
}

/// Build the store selected by the site configuration
pub fn from_config(config: &SiteConfig, base_dir: &Path) -> anyhow::Result<Box<dyn ContentStore>> {
    let store: Box<dyn ContentStore> = match config.store.kind {
        StoreKind::Fs => Box::new(FsStore::new(base_dir.join(&config.content_dir))),
        StoreKind::Http => Box::new(HttpStore::new(
            &config.store.base_url,
            Duration::from_secs(config.store.timeout_secs),
        )?),
    };
    Ok(store)
}

/// Reject absolute paths and any `..` segment
fn check_path(path: &str) -> Result<(), StoreError> {
    let relative = Path::new(path);
    let ok = !path.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidPath(path.to_string()))
    }
}

/// Store reached over HTTP, e.g. the site's own static file server
pub struct HttpStore {
    http: Client,
    base_url: String,
}

impl HttpStore {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ContentStore for HttpStore {
    async fn fetch(&self, path: &str) -> Result<Option<String>, StoreError> {
        check_path(path)?;
        let url = self.locate(path);

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                path: url,
            });
        }

        let bytes = response.bytes().await?;
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|_| StoreError::Malformed(url))
    }

    fn locate(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Store backed by a local directory
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContentStore for FsStore {
    async fn fetch(&self, path: &str) -> Result<Option<String>, StoreError> {
        check_path(path)?;
        let full = self.root.join(path);

        match tokio::fs::read(&full).await {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StoreError::Malformed(full.display().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn locate(&self, path: &str) -> String {
        self.root.join(path).display().to_string()
    }
}

/// In-memory store, for fixtures and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: HashMap<String, String>,
    failing: HashMap<String, u16>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file
    pub fn with(mut self, path: impl Into<String>, body: impl Into<String>) -> Self {
        self.files.insert(path.into(), body.into());
        self
    }

    /// Make `path` answer with an error status instead of content
    pub fn failing(mut self, path: impl Into<String>, status: u16) -> Self {
        self.failing.insert(path.into(), status);
        self
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn fetch(&self, path: &str) -> Result<Option<String>, StoreError> {
        check_path(path)?;
        if let Some(&status) = self.failing.get(path) {
            return Err(StoreError::Status {
                status,
                path: path.to_string(),
            });
        }
        Ok(self.files.get(path).cloned())
    }
}
