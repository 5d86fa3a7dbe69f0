//! Built-in page templates using the Tera template engine
//!
//! Templates are embedded in the binary. HTML autoescaping stays on; rendered
//! post bodies are inserted with `| safe`.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::helpers::url::post_path;
use crate::helpers::url_for;
use crate::registry::PostMetadata;
use crate::view::ReadyPost;

/// Template renderer with the embedded terminal theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("terminal/layout.html")),
            ("post.html", include_str!("terminal/post.html")),
            ("not_found.html", include_str!("terminal/not_found.html")),
            ("blog.html", include_str!("terminal/blog.html")),
        ])?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Detail page of a ready post
    pub fn render_post(&self, config: &SiteConfig, post: &ReadyPost) -> Result<String> {
        let mut context = base_context(config);
        context.insert("post", post);
        context.insert("date", &post.metadata.display_date());
        self.render("post.html", &context)
    }

    /// Page shown for an unknown slug
    pub fn render_not_found(&self, config: &SiteConfig) -> Result<String> {
        self.render("not_found.html", &base_context(config))
    }

    /// Plain listing of every known post
    pub fn render_listing(&self, config: &SiteConfig, posts: &[PostMetadata]) -> Result<String> {
        let posts: Vec<ListedPost> = posts
            .iter()
            .map(|p| ListedPost {
                title: p.title.clone(),
                path: post_path(config, &p.id),
                date: p.display_date(),
                read_time: p.read_time.clone(),
            })
            .collect();

        let mut context = base_context(config);
        context.insert("posts", &posts);
        self.render("blog.html", &context)
    }
}

/// Context values every page needs
fn base_context(config: &SiteConfig) -> Context {
    let mut context = Context::new();
    context.insert("site", config);
    context.insert("root", &url_for(config, ""));
    context.insert("blog_url", &url_for(config, &config.blog_dir));
    context
}

#[derive(Debug, Clone, Serialize)]
struct ListedPost {
    title: String,
    path: String,
    date: String,
    read_time: String,
}

/// Tera filter: strip HTML tags and decode entities, leaving plain text for
/// the template's own escaping
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    let mut result = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    let text = result.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(tera::Value::String(decode_entities(&text)))
}

/// Undo the entity escaping done by the markdown renderer and syntect
fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!("{}...", truncated.trim_end())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentDocument, MarkdownRenderer};
    use crate::registry::{MetadataRegistry, StaticRegistry};

    fn ready_post(body: &str) -> ReadyPost {
        let metadata = StaticRegistry::builtin().lookup("peer-circle").unwrap();
        ReadyPost {
            content: MarkdownRenderer::new().render(body),
            document: ContentDocument::from_store("peer-circle", body),
            url: "http://localhost:4000/blog/peer-circle".to_string(),
            metadata,
        }
    }

    #[test]
    fn test_render_post_page() {
        let renderer = TemplateRenderer::new().unwrap();
        let html = renderer
            .render_post(&SiteConfig::default(), &ready_post("# Hello\n\n<kbd>x</kbd>"))
            .unwrap();

        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<kbd>x</kbd>"));
        assert!(html.contains("Building a Secure File Transfer Web App"));
        assert!(html.contains("July 14, 2025"));
        assert!(html.contains("10 min read"));
        assert!(html.contains("Peer-to-Peer"));
        assert!(html.contains("Back to blog"));
        assert!(html.contains(r#"content="Hello x""#));
    }

    #[test]
    fn test_description_is_escaped_once() {
        let renderer = TemplateRenderer::new().unwrap();
        let html = renderer
            .render_post(&SiteConfig::default(), &ready_post("Rock & roll <3"))
            .unwrap();
        assert!(html.contains(r#"content="Rock &amp; roll &lt;3""#));
        assert!(!html.contains("&amp;amp;"));
    }

    #[test]
    fn test_strip_html_decodes_entities() {
        let out = strip_html_filter(
            &tera::Value::from("<p>a &amp; b &lt;c&gt;</p>\n<p>&quot;d&quot;</p>"),
            &HashMap::new(),
        )
        .unwrap();
        assert_eq!(out, tera::Value::from("a & b <c> \"d\""));
    }

    #[test]
    fn test_render_not_found_page() {
        let renderer = TemplateRenderer::new().unwrap();
        let html = renderer.render_not_found(&SiteConfig::default()).unwrap();
        assert!(html.contains("Blog post not found"));
        assert!(html.contains(r#"href="&#x2F;blog""#) || html.contains(r#"href="/blog""#));
    }

    #[test]
    fn test_render_listing() {
        let renderer = TemplateRenderer::new().unwrap();
        let posts = StaticRegistry::builtin().posts();
        let html = renderer
            .render_listing(&SiteConfig::default(), &posts)
            .unwrap();
        assert!(html.contains("Implementing Face Net Model From Scratch"));
        assert!(html.contains("March 15, 2024"));
    }

    #[test]
    fn test_truncate_filter() {
        let mut args = HashMap::new();
        args.insert("length".to_string(), tera::Value::from(5));
        let out = truncate_chars_filter(&tera::Value::from("hello world"), &args).unwrap();
        assert_eq!(out, tera::Value::from("hello..."));
    }
}
