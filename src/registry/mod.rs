//! Post metadata registry
//!
//! Maps a post slug to the descriptive fields shown on the detail page.
//! Lookup is synchronous and total: an unknown slug is a valid answer, not an error.

use anyhow::Result;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Descriptive fields of a single post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetadata {
    /// Slug (URL-safe key)
    pub id: String,

    /// Post title
    pub title: String,

    /// Publication date
    pub date: NaiveDate,

    /// Estimated read time, e.g. "7 min read"
    pub read_time: String,

    /// Post tags, in display order
    #[serde(default)]
    pub tags: Vec<String>,

    /// Author name
    pub author: String,
}

impl PostMetadata {
    /// Publication date in long form, like "June 28, 2025"
    pub fn display_date(&self) -> String {
        crate::helpers::date::long_date(&self.date)
    }
}

/// Read-only source of post metadata
pub trait MetadataRegistry: Send + Sync {
    /// Look up a post by slug
    fn lookup(&self, id: &str) -> Option<PostMetadata>;

    /// All known posts, in registry order
    fn posts(&self) -> Vec<PostMetadata>;
}

/// Registry backed by a fixed, ordered table
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    posts: IndexMap<String, PostMetadata>,
}

impl StaticRegistry {
    /// Build a registry from a list of posts. Later duplicates are rejected.
    pub fn from_posts<I>(posts: I) -> Result<Self>
    where
        I: IntoIterator<Item = PostMetadata>,
    {
        let mut table = IndexMap::new();
        for post in posts {
            if slug::slugify(&post.id) != post.id {
                anyhow::bail!("Post id is not a valid slug: {:?}", post.id);
            }
            if table.contains_key(&post.id) {
                anyhow::bail!("Duplicate post id: {}", post.id);
            }
            table.insert(post.id.clone(), post);
        }
        Ok(Self { posts: table })
    }

    /// Load a registry from a YAML list of posts
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let posts: Vec<PostMetadata> = serde_yaml::from_str(&content)?;
        let registry = Self::from_posts(posts)?;
        tracing::debug!(
            "Loaded {} posts from {:?}",
            registry.len(),
            path.as_ref()
        );
        Ok(registry)
    }

    /// The site's built-in post table
    pub fn builtin() -> Self {
        const AUTHOR: &str = "Deep Lekhak";
        let table: [(&str, &str, (i32, u32, u32), &str, &[&str]); 7] = [
            (
                "building-scalable-backend-systems",
                "Building Scalable Backend Systems: Lessons from the Trenches",
                (2024, 3, 15),
                "8 min read",
                &["Backend", "Scalability", "Architecture"],
            ),
            (
                "rsa-encryption-from-scratch",
                "Building RSA Encryption from Scratch in Java",
                (2025, 6, 28),
                "7 min read",
                &["Java", "Cryptography", "Security"],
            ),
            (
                "facenet-model-implementation",
                "Implementing Face Net Model From Scratch",
                (2025, 6, 28),
                "7 min read",
                &["FaceNet", "CNN", "Image Recognition", "Machine Learning"],
            ),
            (
                "simple-python-http-server",
                "An Introduction To Building HTTP Server In Python",
                (2025, 6, 28),
                "5 min read",
                &["Network", "HTTP", "Sockets"],
            ),
            (
                "automate-spotify-playlist-downloads-python",
                "Automate Spotify Playlist Downloads Using YouTube and Python",
                (2024, 4, 20),
                "9 min read",
                &["Python", "Spotify", "YouTube", "Automation", "Audio Processing"],
            ),
            (
                "automating-email-sorting-gmail-api",
                "Automating Email Sorting with Gmail API and Python",
                (2025, 7, 14),
                "8 min read",
                &["Email", "Gmail API", "Python", "Automation"],
            ),
            (
                "peer-circle",
                "Building a Secure File Transfer Web App with React, Node.js, and PeerJS",
                (2025, 7, 14),
                "10 min read",
                &["File Sharing", "Peer-to-Peer", "React", "Node.js", "MongoDB"],
            ),
        ];

        let posts = table
            .into_iter()
            .filter_map(|(id, title, (y, m, d), read_time, tags)| {
                Some(PostMetadata {
                    id: id.to_string(),
                    title: title.to_string(),
                    date: NaiveDate::from_ymd_opt(y, m, d)?,
                    read_time: read_time.to_string(),
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                    author: AUTHOR.to_string(),
                })
            })
            .map(|post| (post.id.clone(), post))
            .collect();

        Self { posts }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

impl MetadataRegistry for StaticRegistry {
    fn lookup(&self, id: &str) -> Option<PostMetadata> {
        self.posts.get(id).cloned()
    }

    fn posts(&self) -> Vec<PostMetadata> {
        self.posts.values().cloned().collect()
    }
}
