//! Static file server with single-page fallback
//!
//! Any request path that does not name a file under the root is answered with
//! the entry document, so client-side routes load the app.

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StaticServerConfig {
    pub root: PathBuf,
    pub entry: String,
    pub port: u16,
}

#[derive(Debug)]
struct StaticRoot {
    root: PathBuf,
    entry: PathBuf,
}

pub fn router(root: impl Into<PathBuf>, entry: &str) -> Router {
    let root = root.into();
    let state = Arc::new(StaticRoot {
        entry: root.join(entry),
        root,
    });
    Router::new().fallback(serve_static).with_state(state)
}

pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))
}

pub async fn serve_on(listener: TcpListener, root: PathBuf, entry: &str) -> Result<()> {
    let addr = listener
        .local_addr()
        .context("failed to read listener address")?;
    info!(root = %root.display(), "serving static files on http://{addr}");

    axum::serve(listener, router(root, entry))
        .await
        .context("static file server failed")
}

async fn serve_static(
    State(state): State<Arc<StaticRoot>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    if let Some(path) = resolve_request_path(&state.root, uri.path()) {
        let candidate = if path.is_dir() {
            path.join("index.html")
        } else {
            path
        };
        if candidate.is_file() {
            match tokio::fs::read(&candidate).await {
                Ok(bytes) => return file_response(&candidate, bytes),
                Err(err) => warn!("failed to read '{}': {}", candidate.display(), err),
            }
        }
    }

    debug!(path = uri.path(), "falling back to entry document");
    match tokio::fs::read(&state.entry).await {
        Ok(bytes) => file_response(&state.entry, bytes),
        Err(err) => {
            warn!(
                "entry document '{}' unavailable: {}",
                state.entry.display(),
                err
            );
            (StatusCode::NOT_FOUND, "entry document not found").into_response()
        }
    }
}

/// Maps a URL path onto the root; `None` if it would escape the root.
fn resolve_request_path(root: &Path, raw_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(raw_path).ok()?;
    let mut resolved = root.to_path_buf();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

fn file_response(path: &Path, bytes: Vec<u8>) -> Response {
    let mut response = Response::new(Body::from(bytes));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(path)),
    );
    response
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase());
    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
