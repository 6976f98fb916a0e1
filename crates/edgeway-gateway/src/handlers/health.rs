//! Liveness endpoint
//!
//! GET /health - always 200 while the process is alive

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde_json::json;

use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "edgeway",
            "routes": state.router.routes().len(),
        })),
    )
}

/// Build the health router sub-tree
pub fn health_router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
