//! Edgeway gateway entry point.
//!
//! Loads configuration and starts the axum-based HTTP gateway.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EDGEWAY_CONFIG` | *(none)* | Path to a YAML / TOML / JSON config file. |
//! | `EDGEWAY__<SECTION>__<FIELD>` | *(none)* | Override any config field, e.g. `EDGEWAY__RATE_LIMIT__ENABLED=false`. |
//! | `EDGEWAY_PORT` | `8080` | TCP port to listen on. |
//! | `EDGEWAY_REDIS_URL` | *(none)* | Shared bucket store; in-process store when unset. |
//! | `EDGEWAY_JWT_SECRET` | *(none)* | HMAC secret for bearer tokens. |
//! | `EDGEWAY_LOG_FORMAT` | `text` | `json` for structured log lines. |
//! | `RUST_LOG` | `edgeway_gateway=info,tower_http=info` | Log filter. |

use edgeway_gateway::server::GatewayServer;
use edgeway_kernel::EdgewayConfig;
use edgeway_kernel::config::{ConfigError, load_with_env};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("edgeway_gateway=info,tower_http=info"));
    let json = std::env::var("EDGEWAY_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_config() -> Result<EdgewayConfig, ConfigError> {
    let mut config = match std::env::var("EDGEWAY_CONFIG") {
        Ok(path) => {
            info!(path = %path, "loading configuration file");
            load_with_env(&path, "EDGEWAY")?
        }
        Err(_) => {
            warn!("EDGEWAY_CONFIG is not set, starting with defaults and no routes");
            EdgewayConfig::default()
        }
    };

    if let Some(port) = std::env::var("EDGEWAY_PORT").ok().and_then(|v| v.parse().ok()) {
        config.server.port = port;
    }
    if let Ok(url) = std::env::var("EDGEWAY_REDIS_URL") {
        config.redis.url = Some(url);
    }
    if let Ok(secret) = std::env::var("EDGEWAY_JWT_SECRET") {
        config.auth.jwt_secret = Some(secret);
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    info!(
        port = config.server.port,
        routes = config.routes.len(),
        rate_limit = config.rate_limit.enabled,
        algorithm = ?config.rate_limit.algorithm,
        shared_store = config.redis.url.is_some(),
        auth_configured = config.auth.jwt_secret.is_some(),
        "Edgeway configuration loaded"
    );

    if let Err(e) = GatewayServer::new(config).start().await {
        eprintln!("Gateway error: {e}");
        std::process::exit(1);
    }
}
