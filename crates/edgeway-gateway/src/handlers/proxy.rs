//! Catch-all proxy handler.
//!
//! Converts the axum request into a [`GatewayContext`], runs the filter
//! pipeline, forwards accepted requests upstream and merges the headers
//! collected by filters into whatever response goes back, rejections
//! included. Unsupported methods never reach the pipeline but still echo a
//! correlation id.

use axum::{
    body::{Body, to_bytes},
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use edgeway_kernel::{
    FilterAction, ForwardRequest, GatewayContext, GatewayRequest, GatewayResponse, HttpMethod,
};
use serde_json::json;
use std::net::SocketAddr;
use tracing::warn;

use crate::filter::{CORRELATION_ID_HEADER, resolve_correlation_id};
use crate::state::AppState;

/// Any method, any path not claimed by the gateway's own endpoints.
pub async fn proxy(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let Some(method) = HttpMethod::from_str_ci(parts.method.as_str()) else {
        let supplied = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok());
        let resp = rejection(405, &format!("method '{}' is not supported", parts.method))
            .with_header(CORRELATION_ID_HEADER, resolve_correlation_id(supplied));
        return build_axum_response(resp);
    };

    let mut req = GatewayRequest::new(parts.uri.path(), method);
    if let Some(query) = parts.uri.query() {
        req = req.with_query(query);
    }
    for (name, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            req = req.with_header(name.as_str(), v);
        }
    }
    if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        req = req.with_remote_addr(addr.ip().to_string());
    }

    // The body is only buffered once the filters have admitted the request.
    let mut ctx = GatewayContext::new(req);
    let mut resp = match state.pipeline.run_request(&mut ctx).await {
        Ok(FilterAction::Continue) => match to_bytes(body, state.body_limit).await {
            Ok(bytes) => {
                ctx.request.body = bytes.to_vec();
                forward(&state, &ctx).await
            }
            Err(err) => {
                warn!(
                    correlation_id = %ctx.correlation_id,
                    error = %err,
                    limit = state.body_limit,
                    "request body rejected"
                );
                rejection(413, "request body too large")
            }
        },
        Ok(FilterAction::Reject(status, msg)) => rejection(status, &msg),
        Err(err) => {
            warn!(correlation_id = %ctx.correlation_id, error = %err, "request filter pipeline error");
            rejection(500, &err.to_string())
        }
    };

    for (name, value) in &ctx.response_headers {
        resp.headers.insert(name.clone(), value.clone());
    }

    if let Err(err) = state.pipeline.run_response(&ctx, &mut resp).await {
        warn!(
            correlation_id = %ctx.correlation_id,
            error = %err,
            "response filter pipeline error (response still returned)"
        );
    }

    build_axum_response(resp)
}

async fn forward(state: &AppState, ctx: &GatewayContext) -> GatewayResponse {
    let Some(route_match) = ctx.route_match.as_ref() else {
        return rejection(404, &format!("No route matches path '{}'", ctx.request.path));
    };

    let req = ForwardRequest {
        route: route_match.route.clone(),
        method: ctx.request.method.clone(),
        path: route_match.forward_path.clone(),
        query: ctx.request.query.clone(),
        headers: ctx.forward_headers.clone(),
        body: ctx.request.body.clone(),
        correlation_id: ctx.correlation_id.clone(),
    };

    match state.forwarder.forward(req).await {
        Ok(resp) => resp,
        Err(err) => {
            warn!(correlation_id = %ctx.correlation_id, error = %err, "upstream call failed");
            let mut resp = rejection(err.status(), &err.to_string());
            resp.route_id = route_match.route.id.clone();
            resp
        }
    }
}

/// Synthetic JSON error response.
fn rejection(status: u16, message: &str) -> GatewayResponse {
    GatewayResponse::new(status, "")
        .with_header("content-type", "application/json")
        .with_body(json!({ "error": message }).to_string().into_bytes())
}

fn build_axum_response(resp: GatewayResponse) -> Response {
    let mut out = Response::new(Body::from(resp.body));
    *out.status_mut() =
        StatusCode::from_u16(resp.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let headers = out.headers_mut();
    for (k, v) in &resp.headers {
        match (HeaderName::from_bytes(k.as_bytes()), HeaderValue::from_str(v)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %k, "dropping invalid response header"),
        }
    }
    out
}
