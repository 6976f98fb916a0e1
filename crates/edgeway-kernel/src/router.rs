//! Gateway router trait and route model.
//!
//! The [`GatewayRouter`] trait is the single kernel-level abstraction for
//! request routing.  Implementations (the snapshot-swapping `RouteTable` in
//! `edgeway-gateway`) are loaded from configuration at startup, consulted on
//! every inbound request and mutated at runtime through the admin API.

use super::error::GatewayError;
use super::pattern::PathPattern;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Transformation
// ─────────────────────────────────────────────────────────────────────────────

/// Header / path rewrite applied to a request after its route matched.
///
/// Every field is optional; an absent field is a no-op.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RequestTransformation {
    /// Headers to add.  Applied after removals, so additions win.
    pub header_additions: Option<HashMap<String, String>>,
    /// Header names to remove (case-insensitive).
    pub header_removals: Option<Vec<String>>,
    /// Prefix prepended to the forwarded path.
    pub path_prefix: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Route
// ─────────────────────────────────────────────────────────────────────────────

fn default_enabled() -> bool {
    true
}

/// A single routing rule mapping a path pattern to an upstream destination.
///
/// Path patterns are glob-style and anchored:
/// ```text
/// /health           exact path
/// /users/*          exactly one segment after /users
/// /api/**           one or more segments after /api (trailing only)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    /// Unique stable identifier for this route.
    pub id: String,
    /// Optional human-readable label.
    #[serde(default)]
    pub name: Option<String>,
    /// Glob path pattern.  Must begin with `/`.
    pub path_pattern: String,
    /// Upstream base address, e.g. `http://user-service:8081`.
    pub destination: String,
    /// Disabled routes are never matched.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lower values are matched first; ties keep insertion order.
    #[serde(default)]
    pub priority: i32,
    /// Upstream timeout in milliseconds; `0` means the gateway default.
    #[serde(default)]
    pub timeout_ms: u64,
    /// Retry budget handed to the forwarder.
    #[serde(default)]
    pub max_retries: u32,
    /// Remove the pattern's literal prefix from the forwarded path.
    #[serde(default)]
    pub strip_path_prefix: bool,
    /// Optional rewrite applied after matching.
    #[serde(default)]
    pub transformation: Option<RequestTransformation>,
}

impl Route {
    /// Create an enabled, priority-0 route with just id, pattern and destination.
    pub fn new(
        id: impl Into<String>,
        path_pattern: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            path_pattern: path_pattern.into(),
            destination: destination.into(),
            enabled: true,
            priority: 0,
            timeout_ms: 0,
            max_retries: 0,
            strip_path_prefix: false,
            transformation: None,
        }
    }

    /// Builder: set a human-readable name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: set routing priority (lower = evaluated first).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Builder: set a per-route timeout.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Builder: set the retry budget.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Builder: enable or disable the route.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder: strip the literal pattern prefix before forwarding.
    pub fn with_strip_path_prefix(mut self, strip: bool) -> Self {
        self.strip_path_prefix = strip;
        self
    }

    /// Builder: attach a request transformation.
    pub fn with_transformation(mut self, transformation: RequestTransformation) -> Self {
        self.transformation = Some(transformation);
        self
    }

    /// Compile the route's path pattern.
    pub fn pattern(&self) -> Result<PathPattern, GatewayError> {
        PathPattern::parse(&self.path_pattern)
            .map_err(|reason| GatewayError::InvalidPathPattern(self.id.clone(), reason))
    }

    /// Structural checks run before a route enters a table.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.id.trim().is_empty() {
            return Err(GatewayError::EmptyRouteId);
        }
        self.pattern()?;
        if !(self.destination.starts_with("http://") || self.destination.starts_with("https://")) {
            return Err(GatewayError::InvalidDestination(
                self.id.clone(),
                "destination must start with http:// or https://".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial update for an existing route.  `None` fields keep their value;
/// the id is immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RoutePatch {
    pub name: Option<String>,
    pub path_pattern: Option<String>,
    pub destination: Option<String>,
    pub enabled: Option<bool>,
    pub priority: Option<i32>,
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub strip_path_prefix: Option<bool>,
    pub transformation: Option<RequestTransformation>,
}

impl RoutePatch {
    /// Apply the set fields of this patch to `route`.
    pub fn apply_to(&self, route: &mut Route) {
        if let Some(name) = &self.name {
            route.name = Some(name.clone());
        }
        if let Some(pattern) = &self.path_pattern {
            route.path_pattern = pattern.clone();
        }
        if let Some(destination) = &self.destination {
            route.destination = destination.clone();
        }
        if let Some(enabled) = self.enabled {
            route.enabled = enabled;
        }
        if let Some(priority) = self.priority {
            route.priority = priority;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            route.timeout_ms = timeout_ms;
        }
        if let Some(max_retries) = self.max_retries {
            route.max_retries = max_retries;
        }
        if let Some(strip) = self.strip_path_prefix {
            route.strip_path_prefix = strip;
        }
        if let Some(transformation) = &self.transformation {
            route.transformation = Some(transformation.clone());
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Route match
// ─────────────────────────────────────────────────────────────────────────────

/// The result of a successful route lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route, shared with the table snapshot it came from.
    pub route: Arc<Route>,
    /// Path to forward upstream (after prefix stripping, before transforms).
    pub forward_path: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Router trait
// ─────────────────────────────────────────────────────────────────────────────

/// Kernel contract for request routing.
///
/// All methods take `&self`: implementations own their synchronization so a
/// single instance can be shared across request tasks and the admin API.
/// Readers must never observe a partially-applied mutation.
///
/// The trait is synchronous: route lookups do no I/O.
pub trait GatewayRouter: Send + Sync {
    /// Return the first enabled route, in `(priority, insertion order)`,
    /// whose pattern matches `path`.
    fn match_route(&self, path: &str) -> Option<RouteMatch>;

    /// Look up a route by id, enabled or not.
    fn find_by_id(&self, id: &str) -> Option<Arc<Route>>;

    /// Add a route.  Returns [`GatewayError::DuplicateRoute`] if the id is taken.
    fn insert(&self, route: Route) -> Result<(), GatewayError>;

    /// Apply `patch` to the route with this id, returning the updated route.
    fn update(&self, id: &str, patch: RoutePatch) -> Result<Arc<Route>, GatewayError>;

    /// Remove the route with this id, returning it.
    fn remove(&self, id: &str) -> Result<Arc<Route>, GatewayError>;

    /// Snapshot of all routes in match order.
    fn routes(&self) -> Vec<Arc<Route>>;
}
