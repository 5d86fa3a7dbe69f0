//! HTTP server for the blog
//!
//! Routes:
//! - `GET /blog` - listing of known posts
//! - `GET /blog/:slug` - post detail page (`/blog/:slug.md` serves the raw markdown)
//! - `GET /api/posts` and `GET /api/posts/:slug` - JSON metadata and view state
//! - anything else - static files from the content directory

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode, Uri},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::helpers::url_for;
use crate::templates::TemplateRenderer;
use crate::view::{BlogContext, PostView, ViewState};
use crate::Folio;

/// Server state
struct ServerState {
    ctx: Arc<BlogContext>,
    templates: TemplateRenderer,
    content_dir: PathBuf,
    /// Site root without the trailing slash, empty when served at `/`
    root: String,
}

/// Build the application router
pub fn router(folio: &Folio) -> Result<Router> {
    let state = Arc::new(ServerState {
        ctx: folio.blog_context()?,
        templates: TemplateRenderer::new()?,
        content_dir: folio.content_dir.clone(),
        root: folio.config.root.trim_end_matches('/').to_string(),
    });

    let blog = url_for(&folio.config, &folio.config.blog_dir);
    let blog = blog.trim_end_matches('/');

    Ok(Router::new()
        .route(blog, get(listing_handler))
        .route(&format!("{}/:slug", blog), get(post_handler))
        .route("/api/posts", get(api_posts_handler))
        .route("/api/posts/:slug", get(api_post_handler))
        .fallback(static_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the server
pub async fn start(folio: &Folio, ip: &str, port: u16, open: bool) -> Result<()> {
    let app = router(folio)?;

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn listing_handler(State(state): State<Arc<ServerState>>) -> Response {
    let posts = state.ctx.registry.posts();
    page(
        StatusCode::OK,
        state.templates.render_listing(&state.ctx.config, &posts),
    )
}

/// Detail page, or the raw markdown body when the slug ends in `.md`
async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    request: Request<Body>,
) -> Response {
    if slug.ends_with(".md") {
        return serve_file(&state, request).await;
    }

    let mut view = PostView::new(state.ctx.clone());
    let config = &state.ctx.config;
    match view.open(&slug).await {
        ViewState::Ready(post) => page(StatusCode::OK, state.templates.render_post(config, post)),
        ViewState::NotFound => page(
            StatusCode::NOT_FOUND,
            state.templates.render_not_found(config),
        ),
        ViewState::Loading => (StatusCode::SERVICE_UNAVAILABLE, "Loading...").into_response(),
    }
}

async fn api_posts_handler(State(state): State<Arc<ServerState>>) -> Response {
    Json(state.ctx.registry.posts()).into_response()
}

async fn api_post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    let mut view = PostView::new(state.ctx.clone());
    let view_state = view.open(&slug).await;
    let status = if view_state.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    (status, Json(view_state)).into_response()
}

async fn static_handler(State(state): State<Arc<ServerState>>, request: Request<Body>) -> Response {
    serve_file(&state, request).await
}

/// Serve a file from the content directory
async fn serve_file(state: &ServerState, request: Request<Body>) -> Response {
    let Some(request) = strip_root(request, &state.root) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mut service = ServeDir::new(&state.content_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::error!("Failed to serve file: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// Rewrite `{root}/path` to `/path` so the path maps onto the content directory.
/// `None` for paths outside the site root.
fn strip_root(mut request: Request<Body>, root: &str) -> Option<Request<Body>> {
    if root.is_empty() {
        return Some(request);
    }

    let uri = request.uri();
    let rest = match uri.path().strip_prefix(root)? {
        "" => "/",
        rest if rest.starts_with('/') => rest,
        _ => return None,
    };
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", rest, query),
        None => rest.to_string(),
    };

    match path_and_query.parse::<Uri>() {
        Ok(stripped) => *request.uri_mut() = stripped,
        Err(e) => {
            tracing::debug!("Cannot strip root from {}: {}", request.uri(), e);
            return None;
        }
    }
    Some(request)
}

/// Turn a rendered template into a response
fn page(status: StatusCode, rendered: Result<String>) -> Response {
    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Template error: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    async fn spawn(folio: &Folio) -> String {
        let app = router(folio).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn site() -> (tempfile::TempDir, Folio) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("public/blog")).unwrap();
        fs::write(
            dir.path().join("public/blog/rsa-encryption-from-scratch.md"),
            "# Hello\n\n```java\nclass Rsa {}\n```\n",
        )
        .unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        (dir, folio)
    }

    #[tokio::test]
    async fn test_detail_page() {
        let (_dir, folio) = site();
        let base = spawn(&folio).await;

        let response = reqwest::get(format!("{}/blog/rsa-encryption-from-scratch", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body = response.text().await.unwrap();
        assert!(body.contains("<h1>Hello</h1>"));
        assert!(body.contains("Building RSA Encryption from Scratch in Java"));
        assert!(body.contains("highlight java"));
    }

    #[tokio::test]
    async fn test_placeholder_page() {
        let (_dir, folio) = site();
        let base = spawn(&folio).await;

        let body = reqwest::get(format!("{}/blog/peer-circle", base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("This blog post is coming soon!"));
        assert!(body.contains("public/blog/peer-circle.md"));
    }

    #[tokio::test]
    async fn test_unknown_post_is_404() {
        let (_dir, folio) = site();
        let base = spawn(&folio).await;

        let response = reqwest::get(format!("{}/blog/unknown-post", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        assert!(response.text().await.unwrap().contains("Blog post not found"));
    }

    #[tokio::test]
    async fn test_raw_markdown_is_served() {
        let (_dir, folio) = site();
        let base = spawn(&folio).await;

        let response = reqwest::get(format!("{}/blog/rsa-encryption-from-scratch.md", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert!(response.text().await.unwrap().starts_with("# Hello"));

        let missing = reqwest::get(format!("{}/blog/peer-circle.md", base))
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);
    }

    #[tokio::test]
    async fn test_raw_markdown_under_site_root() {
        let (dir, _) = site();
        fs::write(dir.path().join("_config.yml"), "root: /site/\n").unwrap();
        fs::write(dir.path().join("public/blog/peer-circle.md"), "# Peer").unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        let base = spawn(&folio).await;

        let page = reqwest::get(format!("{}/site/blog/peer-circle", base))
            .await
            .unwrap();
        assert_eq!(page.status(), 200);

        let raw = reqwest::get(format!("{}/site/blog/peer-circle.md", base))
            .await
            .unwrap();
        assert_eq!(raw.status(), 200);
        assert_eq!(raw.text().await.unwrap(), "# Peer");

        let outside = reqwest::get(format!("{}/blog/peer-circle.md", base))
            .await
            .unwrap();
        assert_eq!(outside.status(), 404);
    }

    #[test]
    fn test_strip_root() {
        let strip = |uri: &str, root: &str| {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            strip_root(request, root).map(|r| r.uri().to_string())
        };
        assert_eq!(
            strip("/site/blog/a.md?x=1", "/site").as_deref(),
            Some("/blog/a.md?x=1")
        );
        assert_eq!(strip("/site", "/site").as_deref(), Some("/"));
        assert_eq!(strip("/sitemap.xml", "/site"), None);
        assert_eq!(strip("/blog/a.md", "/site"), None);
        assert_eq!(strip("/blog/a.md", "").as_deref(), Some("/blog/a.md"));
    }

    #[tokio::test]
    async fn test_api() {
        let (_dir, folio) = site();
        let base = spawn(&folio).await;

        let posts: serde_json::Value = serde_json::from_str(
            &reqwest::get(format!("{}/api/posts", base))
                .await
                .unwrap()
                .text()
                .await
                .unwrap(),
        )
        .unwrap();
        assert_eq!(posts.as_array().map(Vec::len), Some(7));

        let response = reqwest::get(format!("{}/api/posts/unknown-post", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        let state: serde_json::Value =
            serde_json::from_str(&response.text().await.unwrap()).unwrap();
        assert_eq!(state["status"], "not_found");
    }
}
