//! # recon-rest - Reconciliation Service API
//!
//! This crate serves a [`recon_persistence`] entity store over HTTP using the
//! reconciliation service protocol spoken by OpenRefine and similar clients.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use recon_persistence::backends::open_store;
//! use recon_rest::{ServerConfig, create_app};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = open_store("data/authors.sqlite")?;
//!     let config = ServerConfig::default();
//!     let app = create_app(store, config.clone());
//!
//!     let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Endpoint | HTTP Method | Parameters |
//! |----------|-------------|------------|
//! | `{prefix}` | GET/POST | `queries`, `extend`, or none for the manifest |
//! | `{prefix}/auto/entities` | GET | `prefix` |
//! | `{prefix}/auto/types` | GET | `prefix` |
//! | `{prefix}/auto/properties` | GET | `prefix` |
//! | `{prefix}/properties` | GET | `type`, `limit` |
//!
//! Every endpoint accepts a `callback` parameter for JSONP.
//!
//! ## Architecture
//!
//! - [`error`] - Error types and their HTTP mapping
//! - [`config`] - Server configuration
//! - [`state`] - Application state (store, configuration, manifest)
//! - [`manifest`] - The service manifest
//! - [`handlers`] - HTTP request handlers
//! - [`responses`] - JSON and JSONP response building
//! - [`routing`] - Route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod manifest;
pub mod responses;
pub mod routing;
pub mod state;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use recon_persistence::core::EntityStore;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application for a store.
///
/// This sets up the reconciliation routes under the configured prefix with
/// request tracing, a request timeout and, when enabled, CORS.
///
/// # Example
///
/// ```rust,ignore
/// use recon_rest::{ServerConfig, create_app};
///
/// let config = ServerConfig {
///     port: 3000,
///     prefix: "/reconcile".to_string(),
///     ..Default::default()
/// };
/// let app = create_app(store, config);
/// ```
pub fn create_app(store: Arc<dyn EntityStore>, config: ServerConfig) -> Router {
    info!(
        backend = store.backend_name(),
        name = %store.name(),
        prefix = %config.route_prefix(),
        "Creating reconciliation API"
    );

    let state = AppState::new(store, config.clone());
    let router = routing::create_routes(state);

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    // Add CORS if enabled
    let router = if config.enable_cors {
        router.layer(build_cors_layer(&config))
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins == "*" {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG`, when set,
/// takes precedence over `level`. Logs go to stderr so that commands writing
/// data to stdout stay clean.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "recon_rest={level},recon_persistence={level},recon={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
