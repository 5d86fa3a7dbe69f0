//! Post detail view - resolves a slug into what the reader sees
//!
//! [`PostView`] owns a single [`ViewState`]. Navigating to a slug bumps a
//! generation counter and hands back a [`PendingLoad`] tagged with it; the
//! load may finish in any order relative to later navigations, and
//! [`PostView::apply`] drops every result whose tag is no longer current.

pub mod share;

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::content::{ContentDocument, ContentLoader, MarkdownRenderer, RenderedContent};
use crate::helpers::post_url;
use crate::registry::{MetadataRegistry, PostMetadata};
use share::{ShareHost, ShareOutcome, ShareRequest};

/// Collaborators shared by every view instance
pub struct BlogContext {
    pub config: SiteConfig,
    pub registry: Arc<dyn MetadataRegistry>,
    pub loader: Arc<ContentLoader>,
    pub renderer: MarkdownRenderer,
}

impl BlogContext {
    pub fn new(
        config: SiteConfig,
        registry: Arc<dyn MetadataRegistry>,
        loader: Arc<ContentLoader>,
    ) -> Self {
        let renderer = MarkdownRenderer::from_config(&config);
        Self {
            config,
            registry,
            loader,
            renderer,
        }
    }
}

/// A post that is ready to display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadyPost {
    pub metadata: PostMetadata,
    pub document: ContentDocument,
    pub content: RenderedContent,
    /// Canonical URL of the detail page
    pub url: String,
}

impl ReadyPost {
    pub fn share_request(&self) -> ShareRequest {
        ShareRequest {
            title: self.metadata.title.clone(),
            url: self.url.clone(),
        }
    }
}

/// What the detail view is showing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewState {
    Loading,
    NotFound,
    Ready(ReadyPost),
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ViewState::NotFound)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::Ready(_))
    }

    pub fn ready(&self) -> Option<&ReadyPost> {
        match self {
            ViewState::Ready(post) => Some(post),
            _ => None,
        }
    }
}

/// An in-flight content fetch, tagged with the navigation that issued it
pub struct PendingLoad {
    generation: u64,
    id: String,
    metadata: PostMetadata,
    loader: Arc<ContentLoader>,
}

impl PendingLoad {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run the fetch. Never fails; see [`ContentLoader::load`].
    pub async fn resolve(self) -> Resolution {
        let document = self.loader.load(&self.id, &self.metadata).await;
        Resolution {
            generation: self.generation,
            id: self.id,
            metadata: self.metadata,
            document,
        }
    }
}

/// A finished fetch, waiting to be applied
#[derive(Debug)]
pub struct Resolution {
    generation: u64,
    id: String,
    metadata: PostMetadata,
    document: ContentDocument,
}

impl Resolution {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Detail view controller for a single viewer
pub struct PostView {
    ctx: Arc<BlogContext>,
    current: Option<String>,
    generation: u64,
    state: ViewState,
}

impl PostView {
    pub fn new(ctx: Arc<BlogContext>) -> Self {
        Self {
            ctx,
            current: None,
            generation: 0,
            state: ViewState::Loading,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Slug most recently navigated to
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn registry(&self) -> &dyn MetadataRegistry {
        self.ctx.registry.as_ref()
    }

    /// Switch to `id`.
    ///
    /// Unknown slugs go straight to `NotFound` and return `None`; no fetch is
    /// made. Otherwise the view is `Loading` until the returned load is applied.
    /// Content is never cached, so navigating to the current slug fetches again.
    pub fn navigate(&mut self, id: &str) -> Option<PendingLoad> {
        self.generation += 1;
        self.current = Some(id.to_string());
        self.state = ViewState::Loading;

        let Some(metadata) = self.ctx.registry.lookup(id) else {
            tracing::debug!("No metadata for {:?}", id);
            self.state = ViewState::NotFound;
            return None;
        };

        Some(PendingLoad {
            generation: self.generation,
            id: id.to_string(),
            metadata,
            loader: self.ctx.loader.clone(),
        })
    }

    /// Apply a finished load. Returns `false` when it was superseded and dropped.
    pub fn apply(&mut self, resolution: Resolution) -> bool {
        let current = self.current.as_deref() == Some(resolution.id.as_str());
        if resolution.generation != self.generation || !current {
            tracing::debug!(
                "Dropping stale load for {:?} (generation {}, current {})",
                resolution.id,
                resolution.generation,
                self.generation
            );
            return false;
        }
        if !self.state.is_loading() {
            return false;
        }

        let content = self.ctx.renderer.render(&resolution.document.body);
        let url = post_url(&self.ctx.config, &resolution.id);
        self.state = ViewState::Ready(ReadyPost {
            metadata: resolution.metadata,
            document: resolution.document,
            content,
            url,
        });
        true
    }

    /// Navigate to `id` and wait for its content
    pub async fn open(&mut self, id: &str) -> &ViewState {
        if let Some(pending) = self.navigate(id) {
            let resolution = pending.resolve().await;
            self.apply(resolution);
        }
        &self.state
    }

    /// Share the displayed post. `None` unless the view is `Ready`.
    pub fn share(&self, host: &dyn ShareHost) -> Result<Option<ShareOutcome>> {
        match &self.state {
            ViewState::Ready(post) => share::share(host, &post.share_request()).map(Some),
            _ => Ok(None),
        }
    }
}
