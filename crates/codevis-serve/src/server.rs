//! Router and lifecycle for the timeline server.

use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{middleware, Json, Router};
use codevis_core::CodevisError;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    data: Arc<PathBuf>,
}

impl AppState {
    /// State serving the document at `data`.
    pub fn new(data: PathBuf) -> Self {
        Self {
            data: Arc::new(data),
        }
    }
}

/// Build the router: `/api/timeline` and `/api/health`, with a permissive
/// CORS origin header on every response.
pub fn router(data: PathBuf) -> Router {
    Router::new()
        .route("/api/timeline", get(timeline))
        .route("/api/health", get(health))
        .layer(middleware::map_response(allow_any_origin))
        .with_state(AppState::new(data))
}

/// Return the timeline document verbatim, or a JSON 404 when it is missing.
pub async fn timeline(State(state): State<AppState>) -> Response {
    match tokio::fs::read(state.data.as_ref()).await {
        Ok(bytes) => {
            debug!(path = %state.data.display(), bytes = bytes.len(), "served timeline");
            ([(CONTENT_TYPE, "application/json")], bytes).into_response()
        }
        Err(e) if e.kind() == ErrorKind::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Timeline data not found" })),
        )
            .into_response(),
        Err(e) => {
            warn!(path = %state.data.display(), error = %e, "failed to read timeline");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn allow_any_origin(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`CodevisError::Io`] if the server fails while accepting
/// connections.
pub async fn serve<F>(listener: TcpListener, data: PathBuf, shutdown: F) -> Result<(), CodevisError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(data))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Bind `bind:port` and serve `data` until Ctrl-C.
///
/// A missing document is not an error at startup; requests simply get a 404
/// until it appears.
///
/// # Errors
///
/// Returns [`CodevisError::Io`] if the address cannot be bound.
///
/// # Examples
///
/// ```no_run
/// use std::path::PathBuf;
///
/// # async fn example() -> Result<(), codevis_core::CodevisError> {
/// codevis_serve::server::run_server("0.0.0.0", 8080, PathBuf::from("out/timeline.json")).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server(bind: &str, port: u16, data: PathBuf) -> Result<(), CodevisError> {
    let listener = TcpListener::bind((bind, port)).await?;
    let addr = listener.local_addr()?;
    if !data.exists() {
        warn!(path = %data.display(), "timeline document does not exist yet");
    }
    info!(%addr, path = %data.display(), "serving timeline");

    serve(listener, data, async {
        tokio::signal::ctrl_c().await.ok();
        info!("shutting down");
    })
    .await
}
