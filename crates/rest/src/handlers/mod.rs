//! HTTP request handlers for the reconciliation API.
//!
//! - [`reconcile`] - manifest, query batches and data extension
//! - [`suggest`] - entity, type and property auto-completion
//! - [`properties`] - properties of a type

pub mod properties;
pub mod reconcile;
pub mod suggest;

// Re-export handlers for convenience
pub use properties::properties_handler;
pub use reconcile::reconcile_handler;
pub use suggest::{suggest_entities_handler, suggest_properties_handler, suggest_types_handler};
