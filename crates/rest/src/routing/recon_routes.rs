//! Reconciliation route configuration.

use axum::{Router, routing::get};

use crate::handlers;
use crate::state::AppState;

/// Creates all reconciliation routes under the configured prefix.
///
/// # Routes
///
/// - `GET|POST {prefix}` - manifest, `queries` or `extend`
/// - `GET {prefix}/auto/entities` - entity suggest
/// - `GET {prefix}/auto/types` - type suggest
/// - `GET {prefix}/auto/properties` - property suggest
/// - `GET {prefix}/properties` - properties of a type
pub fn create_routes(state: AppState) -> Router {
    let prefix = state.config().route_prefix().to_string();
    let root = if prefix.is_empty() { "/" } else { prefix.as_str() };

    Router::new()
        .route(
            root,
            get(handlers::reconcile_handler).post(handlers::reconcile_handler),
        )
        .route(
            &format!("{prefix}/auto/entities"),
            get(handlers::suggest_entities_handler),
        )
        .route(
            &format!("{prefix}/auto/types"),
            get(handlers::suggest_types_handler),
        )
        .route(
            &format!("{prefix}/auto/properties"),
            get(handlers::suggest_properties_handler),
        )
        .route(
            &format!("{prefix}/properties"),
            get(handlers::properties_handler),
        )
        .with_state(state)
}
