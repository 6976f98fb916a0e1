//! Priority-ordered route table implementing [`GatewayRouter`].
//!
//! The table is an immutable snapshot behind an `RwLock<Arc<_>>`.  Readers
//! clone the `Arc` and scan without holding any lock; writers build a new
//! sorted snapshot and swap it in, so a lookup never sees a half-applied
//! mutation.  Writers are serialized by a separate mutex to keep the swap
//! itself short.
//!
//! The scan is O(R × D) where R = number of routes and D = path depth, which
//! is fine for gateway route tables.

use edgeway_kernel::{GatewayError, GatewayRouter, PathPattern, Route, RouteMatch, RoutePatch};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// A route with its compiled pattern and insertion sequence number.
#[derive(Debug)]
struct Entry {
    route: Arc<Route>,
    pattern: PathPattern,
    seq: u64,
}

fn compile(route: Route, seq: u64) -> Result<Entry, GatewayError> {
    route.validate()?;
    let pattern = route.pattern()?;
    Ok(Entry {
        route: Arc::new(route),
        pattern,
        seq,
    })
}

type Snapshot = Arc<Vec<Arc<Entry>>>;

/// Concurrent route table.
#[derive(Default)]
pub struct RouteTable {
    snapshot: RwLock<Snapshot>,
    /// Next insertion sequence number; also serializes writers.
    writer: Mutex<u64>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `routes`, keeping their order for equal priorities.
    pub fn from_routes(routes: Vec<Route>) -> Result<Self, GatewayError> {
        let table = Self::new();
        table.replace_all(routes)?;
        Ok(table)
    }

    /// Atomically replace every route.  On error the table is unchanged.
    pub fn replace_all(&self, routes: Vec<Route>) -> Result<(), GatewayError> {
        let mut next_seq = self.writer.lock();
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(routes.len());
        let mut seq = *next_seq;
        for route in routes {
            if !seen.insert(route.id.clone()) {
                return Err(GatewayError::DuplicateRoute(route.id));
            }
            entries.push(Arc::new(compile(route, seq)?));
            seq += 1;
        }
        *next_seq = seq;
        let count = entries.len();
        self.publish(entries);
        info!(routes = count, "route table loaded");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    fn current(&self) -> Snapshot {
        self.snapshot.read().clone()
    }

    fn publish(&self, mut entries: Vec<Arc<Entry>>) {
        entries.sort_by_key(|e| (e.route.priority, e.seq));
        *self.snapshot.write() = Arc::new(entries);
    }
}

impl GatewayRouter for RouteTable {
    fn match_route(&self, path: &str) -> Option<RouteMatch> {
        let snapshot = self.current();
        snapshot
            .iter()
            .find(|e| e.route.enabled && e.pattern.matches(path))
            .map(|e| RouteMatch {
                route: e.route.clone(),
                forward_path: if e.route.strip_path_prefix {
                    e.pattern.strip_literal_prefix(path)
                } else {
                    path.to_string()
                },
            })
    }

    fn find_by_id(&self, id: &str) -> Option<Arc<Route>> {
        self.current()
            .iter()
            .find(|e| e.route.id == id)
            .map(|e| e.route.clone())
    }

    fn insert(&self, route: Route) -> Result<(), GatewayError> {
        let mut next_seq = self.writer.lock();
        let current = self.current();
        if current.iter().any(|e| e.route.id == route.id) {
            return Err(GatewayError::DuplicateRoute(route.id));
        }
        let entry = compile(route, *next_seq)?;
        *next_seq += 1;
        info!(
            route_id = %entry.route.id,
            pattern = %entry.route.path_pattern,
            priority = entry.route.priority,
            "route added"
        );

        let mut entries = current.as_ref().clone();
        entries.push(Arc::new(entry));
        self.publish(entries);
        Ok(())
    }

    fn update(&self, id: &str, patch: RoutePatch) -> Result<Arc<Route>, GatewayError> {
        let _writer = self.writer.lock();
        let current = self.current();
        let pos = current
            .iter()
            .position(|e| e.route.id == id)
            .ok_or_else(|| GatewayError::RouteNotFound(id.to_string()))?;

        let mut route = current[pos].route.as_ref().clone();
        patch.apply_to(&mut route);
        let entry = Arc::new(compile(route, current[pos].seq)?);
        let updated = entry.route.clone();

        let mut entries = current.as_ref().clone();
        entries[pos] = entry;
        self.publish(entries);
        info!(route_id = %id, "route updated");
        Ok(updated)
    }

    fn remove(&self, id: &str) -> Result<Arc<Route>, GatewayError> {
        let _writer = self.writer.lock();
        let current = self.current();
        let pos = current
            .iter()
            .position(|e| e.route.id == id)
            .ok_or_else(|| GatewayError::RouteNotFound(id.to_string()))?;

        let mut entries = current.as_ref().clone();
        let removed = entries.remove(pos);
        self.publish(entries);
        info!(route_id = %id, "route removed");
        Ok(removed.route.clone())
    }

    fn routes(&self) -> Vec<Arc<Route>> {
        self.current().iter().map(|e| e.route.clone()).collect()
    }
}
