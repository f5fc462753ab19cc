//! Application state for the reconciliation API.
//!
//! The state is shared by all request handlers: the entity store, the
//! server configuration and the manifest built from both at startup.

use std::sync::Arc;

use recon_persistence::core::EntityStore;

use crate::config::ServerConfig;
use crate::manifest::Manifest;

/// Shared application state for the reconciliation API.
///
/// # Example
///
/// ```rust,ignore
/// use recon_rest::{AppState, ServerConfig};
/// use recon_persistence::backends::open_store;
///
/// let store = open_store("data/authors.sqlite")?;
/// let state = AppState::new(store, ServerConfig::default());
/// ```
pub struct AppState {
    /// The entity store.
    store: Arc<dyn EntityStore>,

    /// Server configuration.
    config: Arc<ServerConfig>,

    /// Manifest served at the API root.
    manifest: Arc<Manifest>,
}

// Manually implement Clone since the store is a trait object behind an Arc
impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
            manifest: Arc::clone(&self.manifest),
        }
    }
}

impl AppState {
    /// Creates the state and builds the manifest.
    pub fn new(store: Arc<dyn EntityStore>, config: ServerConfig) -> Self {
        let manifest = Manifest::build(store.as_ref(), &config);
        Self {
            store,
            config: Arc::new(config),
            manifest: Arc::new(manifest),
        }
    }

    /// Returns a reference to the entity store.
    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the service manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Returns the number of entities returned by entity suggest.
    pub fn suggest_limit(&self) -> usize {
        self.config.suggest_limit
    }
}
