//! Bearer-token authentication filter.
//!
//! - no `Authorization` header (or a blank one): the request continues
//!   unauthenticated; downstream routes decide whether that is acceptable
//! - `Authorization: Bearer <token>`: the token is verified and the subject
//!   recorded on the context
//! - anything else, or a token that fails verification: `401 Unauthorized`
//!
//! Verification failures of every kind reject the request, including a
//! verifier that panics.

use async_trait::async_trait;
use edgeway_kernel::{
    AuthFailure, FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter,
    TokenVerifier,
};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, error, warn};

const BEARER_PREFIX: &str = "Bearer ";

/// Authentication filter backed by a [`TokenVerifier`].
pub struct JwtAuthFilter {
    verifier: Arc<dyn TokenVerifier>,
}

impl JwtAuthFilter {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    fn verify(&self, token: &str) -> Result<String, AuthFailure> {
        catch_unwind(AssertUnwindSafe(|| self.verifier.verify(token))).unwrap_or_else(|_| {
            Err(AuthFailure::Undeterminable(
                "token verifier panicked".to_string(),
            ))
        })
    }
}

#[async_trait]
impl GatewayFilter for JwtAuthFilter {
    fn name(&self) -> &str {
        "jwt-auth"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::AUTH
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        let header = match ctx.request.header("authorization") {
            Some(h) if !h.trim().is_empty() => h,
            _ => {
                debug!(correlation_id = %ctx.correlation_id, "no credential presented");
                return Ok(FilterAction::Continue);
            }
        };

        let Some(token) = header.strip_prefix(BEARER_PREFIX) else {
            warn!(correlation_id = %ctx.correlation_id, "rejected request: unsupported authorization scheme");
            return Ok(FilterAction::Reject(
                401,
                "Invalid Authorization header format".to_string(),
            ));
        };

        match self.verify(token.trim()) {
            Ok(subject) => {
                debug!(correlation_id = %ctx.correlation_id, subject = %subject, "authenticated");
                ctx.auth_subject = Some(subject);
                Ok(FilterAction::Continue)
            }
            Err(AuthFailure::Invalid(reason)) => {
                warn!(correlation_id = %ctx.correlation_id, reason = %reason, "rejected request: invalid token");
                Ok(FilterAction::Reject(401, "Invalid or expired token".to_string()))
            }
            Err(AuthFailure::Undeterminable(reason)) => {
                error!(correlation_id = %ctx.correlation_id, reason = %reason, "rejected request: token could not be verified");
                Ok(FilterAction::Reject(401, "Authentication failed".to_string()))
            }
        }
    }
}
