//! Share a post's link from the terminal

use anyhow::Result;

use crate::view::share::{ShareOutcome, TerminalShareHost};
use crate::view::PostView;
use crate::Folio;

/// Copy the canonical URL of `slug` to the terminal clipboard
pub async fn run(folio: &Folio, slug: &str) -> Result<()> {
    let mut view = PostView::new(folio.blog_context()?);
    let url = match view.open(slug).await.ready() {
        Some(post) => post.url.clone(),
        None => anyhow::bail!("Blog post not found: {}", slug),
    };

    match view.share(&TerminalShareHost::stdout())? {
        Some(ShareOutcome::Copied) => println!("Copied link: {}", url),
        Some(ShareOutcome::Shared) => println!("Shared: {}", url),
        None => {}
    }
    Ok(())
}
