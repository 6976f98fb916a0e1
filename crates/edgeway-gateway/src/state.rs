//! Shared application state for the gateway server

use crate::filter::FilterPipeline;
use edgeway_kernel::{Forwarder, GatewayRouter};
use std::sync::Arc;

/// State shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Route table; read by the proxy, mutated by the admin API
    pub router: Arc<dyn GatewayRouter>,
    /// Request/response filter chain
    pub pipeline: Arc<FilterPipeline>,
    /// Upstream transport
    pub forwarder: Arc<dyn Forwarder>,
    /// Maximum buffered request body, in bytes
    pub body_limit: usize,
}

impl AppState {
    pub fn new(
        router: Arc<dyn GatewayRouter>,
        pipeline: Arc<FilterPipeline>,
        forwarder: Arc<dyn Forwarder>,
        body_limit: usize,
    ) -> Self {
        Self {
            router,
            pipeline,
            forwarder,
            body_limit,
        }
    }
}
