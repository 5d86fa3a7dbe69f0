//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::SiteConfig;

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/blog/") // -> "/portfolio/blog/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Site-relative path of a post's detail page
pub fn post_path(config: &SiteConfig, id: &str) -> String {
    url_for(
        config,
        &format!(
            "{}/{}",
            config.blog_dir.trim_matches('/'),
            utf8_percent_encode(id, SEGMENT)
        ),
    )
}

/// Canonical (absolute) URL of a post's detail page
pub fn post_url(config: &SiteConfig, id: &str) -> String {
    format!("{}{}", config.url.trim_end_matches('/'), post_path(config, id))
}
