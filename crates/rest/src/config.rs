//! Server configuration for the reconciliation API.
//!
//! This module provides configuration types for the HTTP service, supporting
//! both programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RECON_SERVER_PORT` | 8080 | Server port |
//! | `RECON_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `RECON_LOG_LEVEL` | info | Log level |
//! | `RECON_PUBLIC_URL` | http://127.0.0.1:8080 | Publicly reachable address root |
//! | `RECON_PREFIX` | /api | URL prefix of every route |
//! | `RECON_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `RECON_ENABLE_CORS` | true | Enable CORS |
//! | `RECON_CORS_ORIGINS` | * | Allowed origins |
//! | `RECON_SUGGEST_LIMIT` | 25 | Entities returned by entity suggest |
//!
//! # Example
//!
//! ```rust
//! use recon_rest::ServerConfig;
//!
//! let config = ServerConfig {
//!     port: 3000,
//!     prefix: "/reconcile".to_string(),
//!     ..Default::default()
//! };
//! assert_eq!(config.service_url(), "http://127.0.0.1:8080/reconcile");
//! ```

use clap::Parser;

/// Server configuration for the reconciliation API.
///
/// This struct can be built from command line arguments and environment
/// variables with [`ServerConfig::parse`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "recon-server")]
#[command(about = "Reconciliation service API server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "RECON_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "RECON_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "RECON_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Publicly reachable address root, used in the service manifest.
    #[arg(long, env = "RECON_PUBLIC_URL", default_value = "http://127.0.0.1:8080")]
    pub public_url: String,

    /// URL prefix to serve requests from.
    #[arg(long, env = "RECON_PREFIX", default_value = "/api")]
    pub prefix: String,

    /// Request timeout in seconds.
    #[arg(long, env = "RECON_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "RECON_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "RECON_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Maximum number of entities returned by entity suggest.
    #[arg(long, env = "RECON_SUGGEST_LIMIT", default_value = "25")]
    pub suggest_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            public_url: "http://127.0.0.1:8080".to_string(),
            prefix: "/api".to_string(),
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            suggest_limit: 25,
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the prefix without a trailing slash; `/` becomes empty.
    pub fn route_prefix(&self) -> &str {
        self.prefix.trim_end_matches('/')
    }

    /// Returns the public URL of the service root, as advertised in the
    /// manifest.
    pub fn service_url(&self) -> String {
        format!(
            "{}{}",
            self.public_url.trim_end_matches('/'),
            self.route_prefix()
        )
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.suggest_limit == 0 {
            errors.push("Suggest limit cannot be 0".to_string());
        }

        if !self.prefix.is_empty() && !self.prefix.starts_with('/') {
            errors.push(format!("Prefix must start with '/': {}", self.prefix));
        }

        if !(self.public_url.starts_with("http://") || self.public_url.starts_with("https://")) {
            errors.push(format!(
                "Public URL must be an http(s) URL: {}",
                self.public_url
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// This uses ephemeral port 0 and a short timeout.
    pub fn for_testing() -> Self {
        Self {
            port: 0, // Let OS assign port
            host: "127.0.0.1".to_string(),
            log_level: "debug".to_string(),
            public_url: "http://localhost:8080".to_string(),
            prefix: "/api".to_string(),
            request_timeout: 5,
            enable_cors: true,
            cors_origins: "*".to_string(),
            suggest_limit: 10,
        }
    }
}
