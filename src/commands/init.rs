//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::registry::{MetadataRegistry, StaticRegistry};

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("Site already initialized: {:?}", config_path);
    }

    fs::create_dir_all(target_dir.join("public/blog"))?;

    let config_content = r#"# Site
title: Deep Lekhak
subtitle: Backend Developer & Code Crusader
author: Deep Lekhak
author_role: Backend Developer & Code Crusader

# URL
url: http://localhost:4000
root: /

# Directory
content_dir: public
blog_dir: blog

# Post metadata
registry: posts.yml

# Where post bodies come from: fs (content_dir) or http (base_url)
store:
  kind: fs
  base_url: http://localhost:4000
  timeout_secs: 10

highlight:
  theme: base16-ocean.dark
  line_number: false

# Raw HTML in posts is passed through. Turn this off if posts ever come
# from anywhere but this site's own store.
markdown:
  allow_raw_html: true
"#;

    fs::write(&config_path, config_content)?;

    let posts = StaticRegistry::builtin().posts();
    fs::write(target_dir.join("posts.yml"), serde_yaml::to_string(&posts)?)?;

    Ok(())
}
