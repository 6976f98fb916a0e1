//! Gateway runtime error types

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use edgeway_kernel::{GatewayError, StoreError};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the admin API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error("route already exists: {0}")]
    RouteAlreadyExists(String),

    #[error("invalid route: {0}")]
    InvalidRoute(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::RouteNotFound(id) => ApiError::RouteNotFound(id),
            GatewayError::DuplicateRoute(id) => ApiError::RouteAlreadyExists(id),
            invalid @ (GatewayError::EmptyRouteId
            | GatewayError::InvalidPathPattern(..)
            | GatewayError::InvalidDestination(..)) => ApiError::InvalidRoute(invalid.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::RouteNotFound(id) => (
                StatusCode::NOT_FOUND,
                "ROUTE_NOT_FOUND",
                format!("route '{}' not found", id),
            ),
            ApiError::RouteAlreadyExists(id) => (
                StatusCode::CONFLICT,
                "ROUTE_ALREADY_EXISTS",
                format!("route '{}' already exists", id),
            ),
            ApiError::InvalidRoute(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_ROUTE", msg.clone())
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors raised while assembling or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] GatewayError),

    #[error("bucket store: {0}")]
    Store(#[from] StoreError),

    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
