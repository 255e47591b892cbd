//! HTTP relay endpoints
//!
//! The boundary between the browser-facing world and the
//! writing-assistance operations:
//! - validate the request (empty text is rejected before any upstream call)
//! - dispatch to the matching operation
//! - respond with a single JSON payload, or stream fragments as they arrive
//!
//! Failure policy per route follows the operations: a failed rewrite is a
//! 500, a failed analyze is an empty list, a failed stream is a 500 only
//! while no bytes have been written.

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::Response,
    routing::{get, post},
};
use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Mutex as TokioMutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::assist::{AssistEngine, DEFAULT_TONE, Suggestion};
use crate::config::ServerConfig;
use crate::error::{Result, ScribeError};
use crate::storage::{Store, User};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Writing-assistance operations
    pub engine: Arc<AssistEngine>,
    /// Relational store backing the listing endpoint
    pub store: Arc<TokioMutex<Store>>,
}

/// The relay server
pub struct RelayServer {
    config: ServerConfig,
    state: AppState,
}

impl RelayServer {
    /// Create a new relay server over the given engine and store
    pub fn new(config: ServerConfig, engine: Arc<AssistEngine>, store: Arc<TokioMutex<Store>>) -> Self {
        Self {
            config,
            state: AppState { engine, store },
        }
    }

    /// Start the server and listen for requests
    pub async fn serve(&self) -> Result<()> {
        let app = create_router(self.state.clone());

        let addr: SocketAddr = self
            .config
            .listen_addr
            .parse()
            .map_err(|e| ScribeError::Config(format!("Invalid listen address: {e}")))?;

        tracing::info!("Starting relay server on {addr}");

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ScribeError::Server(format!("Failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ScribeError::Server(format!("Server error: {e}")))?;

        tracing::info!("Relay server shut down gracefully");
        Ok(())
    }
}

/// Create the router with all routes configured
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/openai/suggest", post(suggest))
        .route("/openai/analyze", post(analyze))
        .route("/openai/analyze-stream", post(analyze_stream))
        .route("/users", get(list_users))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Request body shared by the three assist endpoints
#[derive(Debug, Deserialize)]
pub struct AssistRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
}

#[derive(Debug, Serialize)]
struct SuggestResponse {
    suggestion: String,
}

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    suggestions: Vec<Suggestion>,
}

/// Reject empty or whitespace-only text before anything is dispatched
fn validate(req: &AssistRequest) -> std::result::Result<(String, String), (StatusCode, &'static str)> {
    let text = req.text.as_deref().unwrap_or("");
    if text.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Missing text input"));
    }
    let tone = req
        .tone
        .clone()
        .unwrap_or_else(|| DEFAULT_TONE.to_string());
    Ok((text.to_string(), tone))
}

/// Health check endpoint - returns JSON status
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Rewrite the submitted text in the requested tone
async fn suggest(
    State(state): State<AppState>,
    Json(req): Json<AssistRequest>,
) -> std::result::Result<Json<SuggestResponse>, (StatusCode, &'static str)> {
    let (text, tone) = validate(&req)?;

    match state.engine.rewrite(&text, &tone).await {
        Ok(suggestion) => Ok(Json(SuggestResponse { suggestion })),
        Err(e) => {
            tracing::error!("Error in /openai/suggest: {e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to get suggestion"))
        }
    }
}

/// Analyze the submitted text into structured suggestions
///
/// The operation itself never fails; an empty array is a normal response.
async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AssistRequest>,
) -> std::result::Result<Json<AnalyzeResponse>, (StatusCode, &'static str)> {
    let (text, tone) = validate(&req)?;

    let suggestions = state.engine.analyze(&text, &tone).await;
    Ok(Json(AnalyzeResponse { suggestions }))
}

/// Stream a live plain-text analysis of the submitted text
///
/// Fragments are written to the open response as they arrive, no
/// batching. Once the first byte is out the headers are committed, so a
/// mid-stream failure closes the response without an error body. Client
/// disconnects drop the body, which tears down the upstream stream.
async fn analyze_stream(State(state): State<AppState>, Json(req): Json<AssistRequest>) -> Response {
    let (text, tone) = match validate(&req) {
        Ok(v) => v,
        Err((status, message)) => return plain_response(status, message),
    };

    let mut stream = match state.engine.open_analysis_stream(&text, &tone).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("Error in /openai/analyze-stream: {e}");
            return plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to stream analysis");
        }
    };

    // Await the first fragment before committing the response, so
    // failures and blank output can still produce a clean 500.
    let first = match stream.next().await {
        Some(Ok(fragment)) => fragment,
        Some(Err(e)) => {
            tracing::error!("Error in /openai/analyze-stream: {e}");
            return plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to stream analysis");
        }
        None => {
            tracing::error!("Error in /openai/analyze-stream: upstream stream produced no output");
            return plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to stream analysis");
        }
    };

    let rest = stream
        .inspect(|item| {
            if let Err(e) = item {
                tracing::error!("Error in /openai/analyze-stream: {e}");
            }
        })
        .take_while(|item| std::future::ready(item.is_ok()))
        .filter_map(|item| std::future::ready(item.ok()));

    let fragments = futures::stream::once(std::future::ready(first)).chain(rest);
    let body = Body::from_stream(
        fragments.map(|fragment| Ok::<_, std::convert::Infallible>(Bytes::from(fragment))),
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .unwrap_or_else(|_| plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to stream analysis"))
}

/// List all users in the system
async fn list_users(
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<User>>, (StatusCode, &'static str)> {
    let store = state.store.lock().await;
    match store.list_users() {
        Ok(users) => Ok(Json(users)),
        Err(e) => {
            tracing::error!("Error in /users: {e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

/// Build a plain-text response with a fixed message
fn plain_response(status: StatusCode, message: &'static str) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(message))
        .unwrap_or_else(|_| {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
