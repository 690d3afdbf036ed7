use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tokio_util::sync::CancellationToken;

/// Static file server rooted at a single directory. The listener is bound
/// eagerly so a bind failure surfaces before anything is advertised.
pub struct FileServer {
    listener: tokio::net::TcpListener,
    root: PathBuf,
}

impl FileServer {
    /// Bind the listener. There is no fallback port: a bind failure (port in
    /// use, permission denied) propagates as a fatal startup error.
    pub async fn bind(addr: SocketAddr, root: PathBuf) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        Ok(Self { listener, root })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read listener address")
    }

    /// Serve until the token is cancelled, then release the socket. In-flight
    /// requests may complete or be aborted; no drain guarantee is made.
    pub async fn serve(self, cancel: CancellationToken) -> Result<()> {
        let app = router(self.root);
        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await
            .context("HTTP server error")
    }
}

/// Every path goes through the same file handler; there are no named routes.
pub fn router(root: PathBuf) -> Router {
    Router::new()
        .route("/", get(serve_path))
        .route("/*path", get(serve_path))
        .with_state(root)
}

async fn serve_path(State(root): State<PathBuf>, uri: Uri) -> Response {
    let Some(rel) = sanitize(uri.path()) else {
        return not_found();
    };
    let full = root.join(rel);

    let Ok(metadata) = tokio::fs::metadata(&full).await else {
        return not_found();
    };

    if metadata.is_dir() {
        // A directory with an index.html is served as that file, otherwise
        // it gets a generated listing.
        let index = full.join("index.html");
        if tokio::fs::metadata(&index).await.is_ok() {
            return serve_file(&index).await;
        }
        return directory_listing(uri.path(), &full).await;
    }

    serve_file(&full).await
}

async fn serve_file(path: &Path) -> Response {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string();
            ([(header::CONTENT_TYPE, mime)], bytes).into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            not_found()
        }
    }
}

async fn directory_listing(request_path: &str, dir: &Path) -> Response {
    let mut reader = match tokio::fs::read_dir(dir).await {
        Ok(reader) => reader,
        Err(e) => {
            tracing::warn!("Failed to list {}: {}", dir.display(), e);
            return not_found();
        }
    };

    let mut entries = Vec::new();
    while let Ok(Some(entry)) = reader.next_entry().await {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort();

    let title = format!("Directory listing for {}", escape(request_path));
    let mut body = String::new();
    body.push_str("<!DOCTYPE HTML>\n<html>\n<head>\n");
    body.push_str(&format!("<title>{}</title>\n", title));
    body.push_str("</head>\n<body>\n");
    body.push_str(&format!("<h1>{}</h1>\n<hr>\n<ul>\n", title));
    for name in &entries {
        body.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape(name),
            escape(name)
        ));
    }
    body.push_str("</ul>\n<hr>\n</body>\n</html>\n");

    Html(body).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

/// Map a request path onto a path relative to the served root. Traversal
/// components are rejected so the server cannot escape the root.
fn sanitize(path: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for part in path.trim_start_matches('/').split('/') {
        match part {
            "" | "." => {}
            ".." => return None,
            part => clean.push(part),
        }
    }
    Some(clean)
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_empty_and_dot_components() {
        assert_eq!(sanitize("/a//b/./c"), Some(PathBuf::from("a/b/c")));
        assert_eq!(sanitize("/"), Some(PathBuf::new()));
    }

    #[test]
    fn sanitize_rejects_traversal() {
        assert_eq!(sanitize("/../etc/passwd"), None);
        assert_eq!(sanitize("/a/../../b"), None);
    }
}
