//! HTTP front end for the search pipeline.
//!
//! ## Endpoints
//!
//! - `POST /search`: run a query, returns a [`SearchResponse`]
//! - `GET /health`: liveness probe
//!
//! Every business outcome of a search (no URLs, partial failure, timeout)
//! is reported with HTTP 200 and `success` in the body. Only requests that
//! cannot be turned into a query are rejected, with 422.

use crate::config::ServerConfig;
use crate::error::{Result, ServiceError};
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use scout_search::{PageRenderer, Query, SearchOrchestrator, SearchResponse};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text sent to the search backend.
    pub query: String,
    /// Number of result pages to scrape. Defaults to the server setting.
    #[serde(default)]
    pub max_results: Option<usize>,
}

/// Body of a rejected request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Why the request was rejected.
    pub error: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"` while the server is up.
    pub status: String,
}

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

struct AppState<R> {
    orchestrator: Arc<SearchOrchestrator<R>>,
    limits: ServerConfig,
}

// Manual impl: deriving would require `R: Clone`.
impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            limits: self.limits.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// SearchServer
// ---------------------------------------------------------------------------

/// HTTP server exposing a [`SearchOrchestrator`].
pub struct SearchServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl SearchServer {
    /// Start the search HTTP server.
    ///
    /// Binds to `{config.host}:{config.port}` (use port `0` for auto-assign)
    /// and begins serving in a background tokio task.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start<R>(orchestrator: Arc<SearchOrchestrator<R>>, config: &ServerConfig) -> Result<Self>
    where
        R: PageRenderer + 'static,
    {
        let state = AppState {
            orchestrator,
            limits: config.clone(),
        };

        let app = Router::new()
            .route("/search", post(handle_search::<R>))
            .route("/health", get(handle_health))
            .with_state(state);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| ServiceError::Server(format!("bind to {bind_addr} failed: {e}")))?;

        let addr = listener
            .local_addr()
            .map_err(|e| ServiceError::Server(format!("failed to get local addr: {e}")))?;

        info!("search server listening on http://{addr}");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("search server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for SearchServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// `POST /search`
async fn handle_search<R: PageRenderer + 'static>(
    State(state): State<AppState<R>>,
    payload: std::result::Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return reject(rejection.body_text()),
    };
    if request.query.trim().is_empty() {
        return reject("query must not be empty".to_owned());
    }
    if request.max_results == Some(0) {
        return reject("max_results must be at least 1".to_owned());
    }

    let max_results = state.limits.effective_max_results(request.max_results);
    let query = Query::new(request.query, max_results);
    tracing::info!(max_results, "search request");

    let response: SearchResponse = state.orchestrator.handle(&query).await;
    Json(response).into_response()
}

/// `GET /health`
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_owned(),
    })
}

fn reject(error: String) -> Response {
    tracing::warn!(%error, "rejected search request");
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            success: false,
            error,
        }),
    )
        .into_response()
}
