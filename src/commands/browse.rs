//! Interactive browsing: type slugs, see posts
//!
//! A single-threaded event loop owns the [`PostView`]. Each slug typed starts
//! a fetch on a spawned task; finished fetches come back over a channel and
//! are applied in arrival order, so a slow fetch for an earlier slug can
//! never overwrite the post that was asked for last.

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::view::share::TerminalShareHost;
use crate::view::{PostView, Resolution, ViewState};
use crate::Folio;

/// Run the browse loop on stdin/stdout
pub async fn run(folio: &Folio) -> Result<()> {
    let view = PostView::new(folio.blog_context()?);
    println!("Type a post slug to open it. Other commands: list, share, quit");
    let stdin = BufReader::new(tokio::io::stdin());
    event_loop(view, stdin, std::io::stdout()).await
}

/// Drive `view` from lines of `input`, writing every visible state to `out`.
///
/// Returns once input is exhausted (or `quit`) and no fetch is in flight.
pub async fn event_loop<R, W>(mut view: PostView, input: R, mut out: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Resolution>();
    let mut lines = input.lines();
    let mut input_open = true;
    let mut in_flight = 0usize;

    while input_open || in_flight > 0 {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    input_open = false;
                    continue;
                };
                match line.trim() {
                    "" => {}
                    "quit" | "exit" => input_open = false,
                    "list" => {
                        for post in view_posts(&view) {
                            writeln!(out, "  {}", post)?;
                        }
                    }
                    "share" => {
                        let shared = view.share(&TerminalShareHost::new(&mut out));
                        match shared {
                            Ok(Some(_)) => writeln!(out, "Link copied")?,
                            Ok(None) => writeln!(out, "Nothing to share yet")?,
                            Err(e) => writeln!(out, "Share failed: {}", e)?,
                        }
                    }
                    slug => {
                        if let Some(pending) = view.navigate(slug) {
                            in_flight += 1;
                            let tx = tx.clone();
                            tokio::spawn(async move {
                                let _ = tx.send(pending.resolve().await);
                            });
                        }
                        print_state(&mut out, &view)?;
                    }
                }
            }
            Some(resolution) = rx.recv() => {
                in_flight -= 1;
                if view.apply(resolution) {
                    print_state(&mut out, &view)?;
                }
            }
        }
    }

    Ok(())
}

fn view_posts(view: &PostView) -> Vec<String> {
    view.registry()
        .posts()
        .into_iter()
        .map(|p| format!("{} - {}", p.id, p.title))
        .collect()
}

fn print_state<W: Write>(out: &mut W, view: &PostView) -> Result<()> {
    let slug = view.current().unwrap_or_default();
    match view.state() {
        ViewState::Loading => writeln!(out, "Loading {}...", slug)?,
        ViewState::NotFound => writeln!(out, "Blog post not found: {}", slug)?,
        ViewState::Ready(post) => {
            let meta = &post.metadata;
            writeln!(out, "== {} ==", meta.title)?;
            writeln!(
                out,
                "{} · {} · {}",
                meta.display_date(),
                meta.read_time,
                meta.tags.join(", ")
            )?;
            writeln!(out, "{}", post.url)?;
            writeln!(out)?;
            writeln!(out, "{}", post.document.body.trim_end())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::store::MemoryStore;
    use crate::content::ContentLoader;
    use crate::registry::StaticRegistry;
    use crate::view::BlogContext;
    use base64::Engine;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    fn view() -> PostView {
        let config = SiteConfig::default();
        let store = MemoryStore::new()
            .with("blog/peer-circle.md", "# Peer body")
            .with("blog/rsa-encryption-from-scratch.md", "# RSA body");
        let loader = Arc::new(ContentLoader::new(Arc::new(store), &config));
        PostView::new(Arc::new(BlogContext::new(
            config,
            Arc::new(StaticRegistry::builtin()),
            loader,
        )))
    }

    async fn drive(input: &str) -> String {
        let mut out = Vec::new();
        event_loop(view(), input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_last_slug_wins() {
        let out = drive("peer-circle\nrsa-encryption-from-scratch\n").await;

        let last_ready = out.rfind("== ").unwrap();
        assert!(out[last_ready..].starts_with("== Building RSA Encryption from Scratch in Java =="));
        assert!(out.trim_end().ends_with("# RSA body"));
    }

    #[tokio::test]
    async fn test_unknown_slug_and_list() {
        let out = drive("unknown-post\nlist\nquit\npeer-circle\n").await;
        assert!(out.contains("Blog post not found: unknown-post"));
        assert!(out.contains("  peer-circle - Building a Secure File Transfer"));
        assert!(!out.contains("Peer body"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_share_writes_clipboard_sequence_to_output() {
        let (reader, mut writer) = tokio::io::duplex(64);
        tokio::spawn(async move {
            writer
                .write_all(b"rsa-encryption-from-scratch\n")
                .await
                .unwrap();
            // Let the load land before asking to share
            tokio::time::sleep(Duration::from_millis(50)).await;
            writer.write_all(b"share\n").await.unwrap();
        });

        let mut out = Vec::new();
        event_loop(view(), BufReader::new(reader), &mut out)
            .await
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        let url = "http://localhost:4000/blog/rsa-encryption-from-scratch";
        let payload = base64::engine::general_purpose::STANDARD.encode(url);
        assert!(out.contains(&format!("\x1b]52;c;{}\x07", payload)));
        assert!(out.contains("Link copied"));
    }

    #[tokio::test]
    async fn test_share_before_anything_loaded() {
        let out = drive("share\n").await;
        assert!(out.contains("Nothing to share yet"));
    }
}
