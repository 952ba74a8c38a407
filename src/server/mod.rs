//! Preview server for the generated site

use anyhow::Result;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::Comet;

/// Server state
struct ServerState {
    public_dir: PathBuf,
}

/// Start the local server over the public directory
pub async fn start(app: &Comet, ip: &str, port: u16, open: bool) -> Result<()> {
    let state = Arc::new(ServerState {
        public_dir: app.public_dir.clone(),
    });

    let router = Router::new()
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

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
    axum::serve(listener, router).await?;

    Ok(())
}

/// Map a request path to a file under the public directory
///
/// `/` and directory paths resolve to their `index.html`, so the pretty
/// post URLs (`/post/<uid>/`) work locally exactly as they do deployed.
/// A path with no matching file is retried with an `.html` extension.
/// Paths carrying `..` segments resolve to nothing, keeping every served
/// file inside the public directory.
fn resolve_path(public_dir: &Path, request_path: &str) -> Option<PathBuf> {
    if request_path
        .split(['/', '\\'])
        .any(|segment| segment == "..")
    {
        return None;
    }
    if request_path == "/" {
        return Some(public_dir.join("index.html"));
    }

    let clean_path = request_path.trim_start_matches('/');
    let candidate = public_dir.join(clean_path);
    if candidate.is_dir() {
        return Some(candidate.join("index.html"));
    }
    if candidate.exists() {
        return Some(candidate);
    }

    let with_html = public_dir.join(format!("{}.html", clean_path));
    if with_html.exists() {
        Some(with_html)
    } else {
        Some(candidate)
    }
}

/// Fallback handler resolving pretty URLs to files on disk
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let file_path = match resolve_path(&state.public_dir, request.uri().path()) {
        Some(path) => path,
        None => return (StatusCode::NOT_FOUND, "Not found").into_response(),
    };

    let is_html = file_path
        .extension()
        .map(|ext| ext == "html" || ext == "htm")
        .unwrap_or(false);

    if is_html {
        match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => Html(content).into_response(),
            Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        }
    } else {
        // Serve static files (css, images) through tower-http
        let mut service = ServeDir::new(&state.public_dir);
        match service.try_call(request).await {
            Ok(response) => response.into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
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
