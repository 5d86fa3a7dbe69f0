//! Content module - post bodies, content stores, loading and markdown rendering

mod document;
pub mod loader;
mod markdown;
pub mod store;

pub use document::{ContentDocument, Origin};
pub use loader::ContentLoader;
pub use markdown::{Block, MarkdownRenderer, RenderedContent};
pub use store::{ContentStore, FsStore, HttpStore, MemoryStore, StoreError};
