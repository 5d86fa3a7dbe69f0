//! Render a single post to stdout

use anyhow::Result;

use crate::templates::TemplateRenderer;
use crate::view::{PostView, ViewState};
use crate::Folio;

/// Output format of `show`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Full HTML page
    Page,
    /// View state as JSON
    Json,
    /// The markdown body that would be rendered
    Raw,
}

/// Render `slug` and return the output
pub async fn render(folio: &Folio, slug: &str, format: Format) -> Result<String> {
    let ctx = folio.blog_context()?;
    let mut view = PostView::new(ctx.clone());
    let state = view.open(slug).await;

    if format == Format::Json {
        return Ok(serde_json::to_string_pretty(state)?);
    }

    match state {
        ViewState::Ready(post) if format == Format::Raw => Ok(post.document.body.clone()),
        ViewState::Ready(post) => TemplateRenderer::new()?.render_post(&ctx.config, post),
        ViewState::NotFound => anyhow::bail!("Blog post not found: {}", slug),
        ViewState::Loading => anyhow::bail!("Post {} is still loading", slug),
    }
}

/// Run the show command
pub async fn run(folio: &Folio, slug: &str, format: Format) -> Result<()> {
    println!("{}", render(folio, slug, format).await?);
    Ok(())
}
