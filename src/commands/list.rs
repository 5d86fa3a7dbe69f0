//! List posts and their content status

use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::StoreKind;
use crate::registry::MetadataRegistry;
use crate::Folio;

/// List every known post, and markdown files that have no metadata
pub fn run(folio: &Folio) -> Result<()> {
    let registry = folio.registry()?;
    let posts = registry.posts();
    let local = folio.config.store.kind == StoreKind::Fs;
    let blog_dir = folio.content_dir.join(folio.config.blog_dir.trim_matches('/'));

    println!("Posts ({}):", posts.len());
    for post in &posts {
        let status = if !local {
            ""
        } else if blog_dir.join(format!("{}.md", post.id)).is_file() {
            " [content]"
        } else {
            " [placeholder]"
        };
        println!(
            "  {} - {} ({}){}",
            post.date.format("%Y-%m-%d"),
            post.title,
            post.id,
            status
        );
    }

    if local {
        let known: HashSet<String> = posts.into_iter().map(|p| p.id).collect();
        let orphans = orphan_files(&blog_dir, &known);
        if !orphans.is_empty() {
            println!("Markdown files without metadata ({}):", orphans.len());
            for id in orphans {
                println!("  {}", id);
            }
        }
    }

    Ok(())
}

/// Slugs of `*.md` files directly under `blog_dir` that the registry does not know
fn orphan_files(blog_dir: &Path, known: &HashSet<String>) -> Vec<String> {
    let mut orphans: Vec<String> = WalkDir::new(blog_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map(|ext| ext == "md").unwrap_or(false))
        .filter_map(|e| {
            e.path()
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        })
        .filter(|id| !known.contains(id))
        .collect();
    orphans.sort();
    orphans
}
