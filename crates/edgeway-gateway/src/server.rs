//! Axum-based HTTP gateway server.
//!
//! [`GatewayServer`] wires together the route table, rate limiter, token
//! verifier, filter pipeline and forwarder into a running axum service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Liveness check, always `200 OK`. |
//! | `GET` `POST` | `/admin/routes` | List / add routes. |
//! | `GET` `PUT` `DELETE` | `/admin/routes/{id}` | Inspect / update / remove one route. |
//! | `ANY`  | everything else | Filter pipeline, then proxy to the matched route. |

use crate::backend::HttpForwarder;
use crate::error::ServerError;
use crate::filter::{
    CorrelationIdFilter, FilterPipeline, JwtAuthFilter, LoggingFilter, RateLimitFilter,
    RouteFilter, TransformFilter,
};
use crate::handlers::{health_router, proxy, routes_router};
use crate::jwt::{JwtVerifier, UnconfiguredVerifier};
use crate::ratelimit::{MemoryBucketStore, RedisBucketStore, SystemClock, build_rate_limiter};
use crate::router::RouteTable;
use crate::state::AppState;
use axum::Router;
use edgeway_kernel::{
    BucketStore, Clock, EdgewayConfig, Forwarder, GatewayFilter, GatewayRouter, TokenVerifier,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// High-level gateway server.
///
/// Collaborators default to what the configuration selects; the `with_*`
/// builders override them (tests inject in-memory stores, fixed clocks and
/// stub forwarders this way).
pub struct GatewayServer {
    config: EdgewayConfig,
    store: Option<Arc<dyn BucketStore>>,
    clock: Option<Arc<dyn Clock>>,
    verifier: Option<Arc<dyn TokenVerifier>>,
    forwarder: Option<Arc<dyn Forwarder>>,
}

impl GatewayServer {
    /// Create a new server from the given configuration.
    pub fn new(config: EdgewayConfig) -> Self {
        Self {
            config,
            store: None,
            clock: None,
            verifier: None,
            forwarder: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn BucketStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn TokenVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_forwarder(mut self, forwarder: Arc<dyn Forwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    async fn bucket_store(&self) -> Result<Arc<dyn BucketStore>, ServerError> {
        if let Some(store) = &self.store {
            return Ok(store.clone());
        }
        match &self.config.redis.url {
            Some(url) => Ok(Arc::new(RedisBucketStore::connect(url).await?)),
            None => {
                warn!("no redis url configured, rate limits are local to this instance");
                Ok(Arc::new(MemoryBucketStore::new()))
            }
        }
    }

    fn token_verifier(&self) -> Arc<dyn TokenVerifier> {
        if let Some(verifier) = &self.verifier {
            return verifier.clone();
        }
        match JwtVerifier::from_config(&self.config.auth) {
            Some(verifier) => Arc::new(verifier),
            None => {
                warn!("no jwt secret configured, bearer tokens will be rejected");
                Arc::new(UnconfiguredVerifier)
            }
        }
    }

    fn forwarder(&self) -> Result<Arc<dyn Forwarder>, ServerError> {
        if let Some(forwarder) = &self.forwarder {
            return Ok(forwarder.clone());
        }
        let timeout = Duration::from_millis(self.config.server.request_timeout_ms);
        Ok(Arc::new(HttpForwarder::new(timeout)?))
    }

    /// Build the axum [`Router`] wired to the server's [`EdgewayConfig`].
    ///
    /// This validates the config, loads the route table, connects the bucket
    /// store and constructs the filter pipeline.  Call
    /// [`start()`](Self::start) to bind and serve.
    pub async fn build_app(&self) -> Result<Router, ServerError> {
        self.config.validate()?;

        let router: Arc<dyn GatewayRouter> =
            Arc::new(RouteTable::from_routes(self.config.routes.clone())?);

        let mut filters: Vec<Arc<dyn GatewayFilter>> = vec![
            Arc::new(CorrelationIdFilter::new()),
            Arc::new(LoggingFilter::new()),
            Arc::new(JwtAuthFilter::new(self.token_verifier())),
            Arc::new(RouteFilter::new(router.clone())),
            Arc::new(TransformFilter::new()),
        ];

        let rate_limit = &self.config.rate_limit;
        if rate_limit.enabled {
            let clock: Arc<dyn Clock> = match &self.clock {
                Some(clock) => clock.clone(),
                None => Arc::new(SystemClock),
            };
            let limiter = build_rate_limiter(rate_limit, self.bucket_store().await?, clock);
            filters.push(Arc::new(RateLimitFilter::new(limiter, rate_limit.key_strategy)));
        } else {
            warn!("rate limiting is disabled");
        }

        let pipeline = FilterPipeline::new(filters);
        info!(filters = ?pipeline.names(), "filter pipeline ready");

        let state = AppState::new(
            router,
            Arc::new(pipeline),
            self.forwarder()?,
            self.config.server.body_limit_bytes,
        );

        Ok(Router::new()
            .merge(health_router())
            .merge(routes_router())
            .fallback(proxy)
            .layer(TraceLayer::new_for_http())
            .with_state(state))
    }

    /// Bind the server to `0.0.0.0:{port}` and serve until the process exits.
    pub async fn start(self) -> Result<(), ServerError> {
        let app = self.build_app().await?;
        let addr = format!("0.0.0.0:{}", self.config.server.port);
        info!(addr = %addr, routes = self.config.routes.len(), "Edgeway gateway starting");
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }
}
