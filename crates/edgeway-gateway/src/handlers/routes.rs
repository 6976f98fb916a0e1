//! Route management endpoints
//!
//! GET    /admin/routes        - list routes in match order
//! POST   /admin/routes        - add a route
//! GET    /admin/routes/{id}   - fetch one route
//! PUT    /admin/routes/{id}   - apply a partial update
//! DELETE /admin/routes/{id}   - remove a route
//!
//! Changes take effect for the next request; in-flight requests keep the
//! snapshot they matched against.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use edgeway_kernel::{Route, RoutePatch};
use serde_json::json;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /admin/routes
pub async fn list_routes(State(state): State<AppState>) -> impl IntoResponse {
    let routes: Vec<Route> = state
        .router
        .routes()
        .iter()
        .map(|r| r.as_ref().clone())
        .collect();
    let total = routes.len();
    Json(json!({ "routes": routes, "total": total }))
}

/// GET /admin/routes/{id}
pub async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Route>> {
    state
        .router
        .find_by_id(&id)
        .map(|r| Json(r.as_ref().clone()))
        .ok_or(ApiError::RouteNotFound(id))
}

/// POST /admin/routes
pub async fn create_route(
    State(state): State<AppState>,
    Json(route): Json<Route>,
) -> ApiResult<impl IntoResponse> {
    let id = route.id.clone();
    state.router.insert(route)?;
    let created = state
        .router
        .find_by_id(&id)
        .ok_or_else(|| ApiError::Internal(format!("route '{id}' vanished after insert")))?;
    info!(route_id = %id, "route created via admin api");
    Ok((StatusCode::CREATED, Json(created.as_ref().clone())))
}

/// PUT /admin/routes/{id}
pub async fn update_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<RoutePatch>,
) -> ApiResult<Json<Route>> {
    let updated = state.router.update(&id, patch)?;
    info!(route_id = %id, "route updated via admin api");
    Ok(Json(updated.as_ref().clone()))
}

/// DELETE /admin/routes/{id}
pub async fn delete_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.router.remove(&id)?;
    info!(route_id = %id, "route removed via admin api");
    Ok(Json(json!({ "id": id, "status": "removed" })))
}

/// Build the route-management router sub-tree
pub fn routes_router() -> Router<AppState> {
    Router::new()
        .route("/admin/routes", get(list_routes).post(create_route))
        .route(
            "/admin/routes/{id}",
            get(get_route).put(update_route).delete(delete_route),
        )
}
