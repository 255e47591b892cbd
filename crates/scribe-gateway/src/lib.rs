//! Browser-facing gateway for the Scribe backend
//!
//! A strictly request/response relay: it forwards `/api/suggest` calls to
//! the backend and hands the JSON answer back. Backend failures are
//! normalized into a uniform client-visible error shape; the backend's
//! error detail is logged here and never leaks to the browser.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::env;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to listen on
    pub listen_addr: String,
    /// Base URL of the Scribe backend
    pub backend_url: String,
}

impl GatewayConfig {
    /// Read configuration from the environment, with local defaults
    pub fn from_env() -> Self {
        Self {
            listen_addr: env::var("SCRIBE_GATEWAY_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:3000".to_string()),
            backend_url: env::var("SCRIBE_BACKEND_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:3001".to_string()),
        }
    }
}

/// Shared state for all handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// HTTP client for backend requests
    pub client: reqwest::Client,
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/suggest", post(suggest))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint - returns JSON status
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Forward a suggest request to the backend and relay its JSON answer
async fn suggest(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let url = format!(
        "{}/openai/suggest",
        state.config.backend_url.trim_end_matches('/')
    );

    let backend_response = match state.client.post(&url).json(&body).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Failed to reach backend at {url}: {e}");
            return error_response("Proxy server error");
        }
    };

    let status = backend_response.status();
    if !status.is_success() {
        let detail = backend_response.text().await.unwrap_or_default();
        tracing::error!("Backend {url} returned {status}: {detail}");
        return error_response("Backend failed");
    }

    match backend_response.json::<serde_json::Value>().await {
        Ok(json) => (StatusCode::OK, Json(json)).into_response(),
        Err(e) => {
            tracing::error!("Backend {url} returned unreadable body: {e}");
            error_response("Backend failed")
        }
    }
}

/// Uniform client-visible error shape
fn error_response(message: &'static str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}
