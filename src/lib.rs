//! folio: a portfolio blog engine
//!
//! Post metadata lives in a registry, post bodies live in a content store
//! (a local directory or a remote static host), and the detail view ties them
//! together: unknown slugs are "not found", known slugs always render, falling
//! back to a placeholder body when the store has nothing usable.

pub mod commands;
pub mod config;
pub mod content;
pub mod helpers;
pub mod registry;
pub mod server;
pub mod templates;
pub mod view;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use content::ContentLoader;
use registry::{MetadataRegistry, StaticRegistry};
use view::BlogContext;

/// The main application
#[derive(Clone)]
pub struct Folio {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Directory holding static files and post bodies
    pub content_dir: std::path::PathBuf,
}

impl Folio {
    /// Create a new instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let content_dir = base_dir.join(&config.content_dir);

        Ok(Self {
            config,
            base_dir,
            content_dir,
        })
    }

    /// Load the metadata registry named in the config, or the built-in table
    pub fn registry(&self) -> Result<StaticRegistry> {
        match &self.config.registry {
            Some(path) => StaticRegistry::load(self.base_dir.join(path)),
            None => Ok(StaticRegistry::builtin()),
        }
    }

    /// Assemble the registry, content store, loader and renderer
    pub fn blog_context(&self) -> Result<Arc<BlogContext>> {
        let registry: Arc<dyn MetadataRegistry> = Arc::new(self.registry()?);
        let store = content::store::from_config(&self.config, &self.base_dir)?;
        let loader = Arc::new(ContentLoader::new(Arc::from(store), &self.config));

        Ok(Arc::new(BlogContext::new(
            self.config.clone(),
            registry,
            loader,
        )))
    }
}
