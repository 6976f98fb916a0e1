//! Route resolution filter.

use async_trait::async_trait;
use edgeway_kernel::{
    FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter, GatewayRouter,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves the request path against the route table and records the match.
/// Unmatched paths are rejected with `404`.
pub struct RouteFilter {
    router: Arc<dyn GatewayRouter>,
}

impl RouteFilter {
    pub fn new(router: Arc<dyn GatewayRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl GatewayFilter for RouteFilter {
    fn name(&self) -> &str {
        "route"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::ROUTING
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        match self.router.match_route(&ctx.request.path) {
            Some(m) => {
                debug!(
                    correlation_id = %ctx.correlation_id,
                    route = %m.route.id,
                    forward_path = %m.forward_path,
                    "route matched"
                );
                ctx.route_match = Some(m);
                Ok(FilterAction::Continue)
            }
            None => {
                info!(correlation_id = %ctx.correlation_id, path = %ctx.request.path, "no route matched");
                Ok(FilterAction::Reject(
                    404,
                    format!("No route matches path '{}'", ctx.request.path),
                ))
            }
        }
    }
}
