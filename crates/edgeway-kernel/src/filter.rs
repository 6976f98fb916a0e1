//! Gateway filter trait and filter-chain ordering.
//!
//! A filter chain is an ordered list of [`GatewayFilter`] instances applied
//! to every request and response.  Filters are sorted by their declared
//! [`FilterOrder`] and executed in ascending order on the request path
//! (lowest value first) and descending order on the response path.
//!
//! ```text
//! Request  ──► Correlation ──► AccessLog ──► Auth ──► RateLimit ──► Routing ──► Transform
//!                  (forwarder call happens here)
//! Response ◄── Correlation ◄── AccessLog ◄── Auth ◄── RateLimit ◄── Routing ◄── Transform
//! ```

use super::error::GatewayError;
use super::types::{GatewayContext, GatewayResponse};
use async_trait::async_trait;

// ─────────────────────────────────────────────────────────────────────────────
// Filter ordering
// ─────────────────────────────────────────────────────────────────────────────

/// Numeric ordering slot for a filter in the chain.
///
/// The well-known slots below act as guidelines; any `u32` value is accepted
/// so implementors can slot in custom filters between the standard phases.
/// Filters with equal order values are executed in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FilterOrder(pub u32);

impl FilterOrder {
    /// Executes before all authentication logic (correlation id injection).
    pub const PRE_AUTH: FilterOrder = FilterOrder(0);
    /// Access logging; runs early so rejected requests are logged too.
    pub const ACCESS_LOG: FilterOrder = FilterOrder(50);
    /// Authentication filter slot (JWT bearer tokens).
    pub const AUTH: FilterOrder = FilterOrder(100);
    /// Rate-limiting / throttling slot.
    pub const RATE_LIMIT: FilterOrder = FilterOrder(200);
    /// Route table lookup.
    pub const ROUTING: FilterOrder = FilterOrder(250);
    /// Request header / path transformation slot.
    pub const TRANSFORM: FilterOrder = FilterOrder(300);
}

// ─────────────────────────────────────────────────────────────────────────────
// Filter action
// ─────────────────────────────────────────────────────────────────────────────

/// Instruction returned by [`GatewayFilter::on_request`] controlling what
/// the gateway does with the request after the filter runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
    /// Pass the (possibly modified) request to the next filter or forwarder.
    Continue,
    /// Short-circuit the chain and return a synthetic error response with the
    /// given HTTP status and message.
    Reject(u16, String),
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayFilter trait
// ─────────────────────────────────────────────────────────────────────────────

/// Kernel contract for a single filter in the gateway pipeline.
///
/// Implementations must be `Send + Sync` so they can be shared across Tokio
/// tasks without additional synchronization by the caller.
#[async_trait]
pub trait GatewayFilter: Send + Sync {
    /// Stable, human-readable identifier for this filter (used in logs).
    fn name(&self) -> &str;

    /// Position in the filter chain.  Lower values execute first on the
    /// request path.
    fn order(&self) -> FilterOrder;

    /// Called with the inbound request *before* it is forwarded.
    ///
    /// Implementations may mutate `ctx` (attach the auth subject, record
    /// response headers, rewrite forward headers, …).  Return
    /// [`FilterAction::Continue`] to proceed, or [`FilterAction::Reject`] to
    /// short-circuit the chain.
    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError>;

    /// Called with the final response *before* it is returned to the caller.
    ///
    /// Runs for every filter in the chain, including requests that an earlier
    /// filter rejected, so implementations must tolerate missing context.
    async fn on_response(
        &self,
        _ctx: &GatewayContext,
        _resp: &mut GatewayResponse,
    ) -> Result<(), GatewayError> {
        Ok(())
    }
}
