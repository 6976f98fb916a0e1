//! Filter module.

mod auth;
mod correlation;
mod logger;
mod rate_limit;
mod route;
mod transform;

pub use auth::JwtAuthFilter;
pub use correlation::{CORRELATION_ID_HEADER, CorrelationIdFilter, resolve_correlation_id};
pub use logger::LoggingFilter;
pub use rate_limit::{
    RATE_LIMIT_REMAINING_HEADER, RATE_LIMIT_RESET_HEADER, RETRY_AFTER_HEADER, RateLimitFilter,
};
pub use route::RouteFilter;
pub use transform::{TransformFilter, transform_headers, transform_path};

use edgeway_kernel::{FilterAction, GatewayContext, GatewayError, GatewayFilter, GatewayResponse};
use std::sync::Arc;

/// Ordered list of boxed filters executed as a pipeline.
///
/// Filters are sorted by [`FilterOrder`](edgeway_kernel::FilterOrder) in
/// ascending order (lowest value runs first on request path).  The sort is
/// stable, so equal orders keep registration order.
pub struct FilterPipeline {
    filters: Vec<Arc<dyn GatewayFilter>>,
}

impl FilterPipeline {
    /// Build a pipeline from a list of filters, sorted by their declared order.
    pub fn new(mut filters: Vec<Arc<dyn GatewayFilter>>) -> Self {
        filters.sort_by_key(|f| f.order());
        Self { filters }
    }

    /// Filter names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run all filters' `on_request` hooks in ascending order.
    ///
    /// Returns `Ok(FilterAction::Continue)` if all filters continue.
    /// Short-circuits on the first `Reject`.
    pub async fn run_request(
        &self,
        ctx: &mut GatewayContext,
    ) -> Result<FilterAction, GatewayError> {
        for filter in &self.filters {
            match filter.on_request(ctx).await? {
                FilterAction::Continue => {}
                other => return Ok(other),
            }
        }
        Ok(FilterAction::Continue)
    }

    /// Run all filters' `on_response` hooks in descending order
    /// (outermost filter last, so it can finalize latency, etc.).
    pub async fn run_response(
        &self,
        ctx: &GatewayContext,
        resp: &mut GatewayResponse,
    ) -> Result<(), GatewayError> {
        for filter in self.filters.iter().rev() {
            filter.on_response(ctx, resp).await?;
        }
        Ok(())
    }
}
