//! Post bodies as fetched from the content store

use serde::Serialize;

use crate::registry::PostMetadata;

/// Where a document's body came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Returned unmodified by the content store
    Store,
    /// Generated because the store had nothing usable
    Placeholder,
}

/// Raw markdown body of a single post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentDocument {
    /// Slug the body belongs to
    pub id: String,

    /// Raw markdown
    pub body: String,

    pub origin: Origin,
}

impl ContentDocument {
    pub fn from_store(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            origin: Origin::Store,
        }
    }

    /// Stand-in body for a post whose content cannot be retrieved.
    ///
    /// Deterministic in `metadata` and `content_path` (the file the author
    /// should create, e.g. `public/blog/my-post.md`).
    pub fn placeholder(metadata: &PostMetadata, content_path: &str) -> Self {
        let body = format!(
            r#"# {title}

This blog post is coming soon!

To add content for this post, create a markdown file at `{path}`.

## Getting Started

1. Create the file `{path}`
2. Write your content in Markdown format
3. The content will automatically appear here

## Markdown Features Supported

- **Bold text**
- *Italic text*
- `Inline code`
- [Links](https://example.com)
- Lists
- Code blocks with syntax highlighting
- Tables
- And much more!

```javascript
// Example code block
function hello() {{
  console.log("Hello, World!");
}}
```

Happy writing! 🚀
"#,
            title = metadata.title,
            path = content_path,
        );

        Self {
            id: metadata.id.clone(),
            body,
            origin: Origin::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.origin == Origin::Placeholder
    }
}
