//! Request handlers for the gateway's own endpoints

pub mod health;
pub mod proxy;
pub mod routes;

pub use health::health_router;
pub use proxy::proxy;
pub use routes::routes_router;
