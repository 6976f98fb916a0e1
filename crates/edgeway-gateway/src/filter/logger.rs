//! Structured access-logging filter.
//!
//! Emits `tracing` events on both the request and response path, recording
//! correlation id, method, path, peer, subject, limiter key, route, status
//! and round-trip latency.

use async_trait::async_trait;
use edgeway_kernel::{
    FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter, GatewayResponse,
};
use tracing::{error, info, warn};

const START_ATTR: &str = "log.request_start_ms";

/// Logging filter; records inbound requests and outbound responses.
#[derive(Default)]
pub struct LoggingFilter;

impl LoggingFilter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GatewayFilter for LoggingFilter {
    fn name(&self) -> &str {
        "access-log"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::ACCESS_LOG
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        info!(
            correlation_id = %ctx.correlation_id,
            method         = ctx.request.method.as_str(),
            path           = %ctx.request.path,
            remote_addr    = ?ctx.request.remote_addr,
            "→ inbound request"
        );
        ctx.set_attr(START_ATTR, &now_ms());
        Ok(FilterAction::Continue)
    }

    async fn on_response(
        &self,
        ctx: &GatewayContext,
        resp: &mut GatewayResponse,
    ) -> Result<(), GatewayError> {
        let start_ms: u64 = ctx.get_attr(START_ATTR).unwrap_or_else(now_ms);
        let elapsed = now_ms().saturating_sub(start_ms);

        if resp.status >= 500 {
            error!(
                correlation_id = %ctx.correlation_id,
                path           = %ctx.request.path,
                status         = resp.status,
                route          = %resp.route_id,
                latency_ms     = elapsed,
                "← upstream error response"
            );
        } else if resp.status >= 400 {
            warn!(
                correlation_id = %ctx.correlation_id,
                path           = %ctx.request.path,
                status         = resp.status,
                subject        = ?ctx.auth_subject,
                limiter_key    = ?ctx.limiter_key,
                latency_ms     = elapsed,
                "← rejected request"
            );
        } else {
            info!(
                correlation_id = %ctx.correlation_id,
                path           = %ctx.request.path,
                status         = resp.status,
                route          = %resp.route_id,
                subject        = ?ctx.auth_subject,
                latency_ms     = elapsed,
                "← outbound response"
            );
        }

        resp.latency_ms = elapsed;
        Ok(())
    }
}

fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
    )
    .unwrap_or(u64::MAX)
}
