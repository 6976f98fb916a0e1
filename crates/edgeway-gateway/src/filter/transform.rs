//! Request transformation filter.
//!
//! Applies the matched route's [`RequestTransformation`]: header removals,
//! then header additions (so an addition wins over a removal of the same
//! name), then the path prefix.

use async_trait::async_trait;
use edgeway_kernel::{
    FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter, RequestTransformation,
};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Rewrite `headers` according to `t`.  Names are compared case-insensitively.
pub fn transform_headers(
    headers: &HashMap<String, String>,
    t: &RequestTransformation,
) -> HashMap<String, String> {
    let removals: HashSet<String> = t
        .header_removals
        .iter()
        .flatten()
        .map(|name| name.to_ascii_lowercase())
        .collect();

    let mut out: HashMap<String, String> = headers
        .iter()
        .filter(|(name, _)| !removals.contains(&name.to_ascii_lowercase()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    for (name, value) in t.header_additions.iter().flatten() {
        out.insert(name.to_ascii_lowercase(), value.clone());
    }
    out
}

/// Prepend `t.path_prefix` to `path`. A prefix that is blank or only
/// slashes leaves the path untouched.
pub fn transform_path(path: &str, t: &RequestTransformation) -> String {
    let prefix = t
        .path_prefix
        .as_deref()
        .map(|p| p.trim().trim_end_matches('/'))
        .unwrap_or_default();
    if prefix.is_empty() {
        return path.to_string();
    }
    let slash = if prefix.starts_with('/') { "" } else { "/" };
    format!("{slash}{prefix}{path}")
}

#[derive(Default)]
pub struct TransformFilter;

impl TransformFilter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GatewayFilter for TransformFilter {
    fn name(&self) -> &str {
        "transform"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::TRANSFORM
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        let Some(m) = ctx.route_match.as_mut() else {
            return Ok(FilterAction::Continue);
        };
        let route = m.route.clone();
        if let Some(t) = &route.transformation {
            ctx.forward_headers = transform_headers(&ctx.forward_headers, t);
            m.forward_path = transform_path(&m.forward_path, t);
            debug!(
                correlation_id = %ctx.correlation_id,
                route = %route.id,
                forward_path = %m.forward_path,
                "request transformed"
            );
        }
        Ok(FilterAction::Continue)
    }
}
