//! Route configuration for the reconciliation API.
//!
//! This module contains the routing configuration that maps HTTP paths
//! to handlers.

pub mod recon_routes;

pub use recon_routes::create_routes;
