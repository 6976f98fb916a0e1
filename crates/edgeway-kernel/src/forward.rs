//! Upstream forwarding contract.
//!
//! The gateway core stops at the handoff: it resolves the route, rewrites the
//! path and headers, and passes a [`ForwardRequest`] to a [`Forwarder`].
//! Transport, timeouts and retries are the forwarder's business.

use super::router::Route;
use super::types::{GatewayResponse, HttpMethod};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Everything a forwarder needs to issue the upstream call.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    /// Matched route; carries destination, timeout and retry budget.
    pub route: Arc<Route>,
    pub method: HttpMethod,
    /// Rewritten path, always starting with `/`.
    pub path: String,
    pub query: Option<String>,
    /// Rewritten headers (lowercased names).
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub correlation_id: String,
}

/// Upstream call failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ForwardError {
    #[error("upstream '{route_id}' unreachable: {message}")]
    Network { route_id: String, message: String },

    #[error("upstream '{route_id}' timed out after {timeout:?}")]
    Timeout { route_id: String, timeout: Duration },
}

impl ForwardError {
    /// HTTP status the gateway answers with.
    pub fn status(&self) -> u16 {
        match self {
            ForwardError::Network { .. } => 502,
            ForwardError::Timeout { .. } => 504,
        }
    }
}

/// Transport collaborator that performs the upstream call.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, req: ForwardRequest) -> Result<GatewayResponse, ForwardError>;
}
