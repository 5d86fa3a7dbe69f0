//! Content loader - fetches a post body from the content store
//!
//! Once the registry has confirmed a post exists, loading never fails: a
//! missing file, an error status or a dead store all come back as a
//! placeholder document.

use std::sync::Arc;

use super::store::ContentStore;
use super::ContentDocument;
use crate::config::SiteConfig;
use crate::registry::PostMetadata;

/// Loads post bodies for the detail view
pub struct ContentLoader {
    store: Arc<dyn ContentStore>,
    blog_dir: String,
    content_dir: String,
}

impl ContentLoader {
    /// Create a new content loader
    pub fn new(store: Arc<dyn ContentStore>, config: &SiteConfig) -> Self {
        Self {
            store,
            blog_dir: config.blog_dir.trim_matches('/').to_string(),
            content_dir: config.content_dir.trim_matches('/').to_string(),
        }
    }

    /// Store path of a post body, e.g. `blog/my-post.md`
    pub fn store_path(&self, id: &str) -> String {
        format!("{}/{}.md", self.blog_dir, id)
    }

    /// Path an author should create to give the post content, e.g. `public/blog/my-post.md`
    pub fn authoring_path(&self, id: &str) -> String {
        if self.content_dir.is_empty() {
            self.store_path(id)
        } else {
            format!("{}/{}", self.content_dir, self.store_path(id))
        }
    }

    /// Load the body of `id`, falling back to a placeholder built from `metadata`
    pub async fn load(&self, id: &str, metadata: &PostMetadata) -> ContentDocument {
        let path = self.store_path(id);

        match self.store.fetch(&path).await {
            Ok(Some(body)) => {
                tracing::debug!("Loaded {} ({} bytes)", self.store.locate(&path), body.len());
                ContentDocument::from_store(id, body)
            }
            Ok(None) => {
                tracing::debug!("No content at {}, using placeholder", self.store.locate(&path));
                ContentDocument::placeholder(metadata, &self.authoring_path(id))
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", self.store.locate(&path), e);
                ContentDocument::placeholder(metadata, &self.authoring_path(id))
            }
        }
    }
}
