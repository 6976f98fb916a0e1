//! Correlation id filter.
//!
//! Reuses the caller's `X-Correlation-ID` when present and non-blank,
//! otherwise mints a UUID v4.  The id is forwarded upstream and echoed on
//! every response, rejections included.

use async_trait::async_trait;
use edgeway_kernel::{FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter};
use tracing::debug;
use uuid::Uuid;

/// Header carrying the correlation id.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// The caller's id when present and non-blank, otherwise a fresh UUID v4.
pub fn resolve_correlation_id(supplied: Option<&str>) -> String {
    match supplied {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => {
            let id = Uuid::new_v4().to_string();
            debug!(correlation_id = %id, "generated correlation id");
            id
        }
    }
}

#[derive(Default)]
pub struct CorrelationIdFilter;

impl CorrelationIdFilter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GatewayFilter for CorrelationIdFilter {
    fn name(&self) -> &str {
        "correlation-id"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::PRE_AUTH
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        let id = resolve_correlation_id(ctx.request.header(CORRELATION_ID_HEADER));

        ctx.forward_headers
            .insert(CORRELATION_ID_HEADER.to_string(), id.clone());
        ctx.set_response_header(CORRELATION_ID_HEADER, id.clone());
        ctx.correlation_id = id;
        Ok(FilterAction::Continue)
    }
}
