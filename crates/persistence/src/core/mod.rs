//! Core abstractions shared by all backends.
//!
//! - [`EntityStore`] - the read-only capability every backend implements
//! - [`scoring`] - match threshold, heuristic scoring and score normalization
//! - [`constraints`] - property constraints resolved into comparable filters
//!
//! Backends differ only in how they store and search entities. Scoring
//! rules live here so the in-memory and relational engines cannot drift
//! apart.

pub mod constraints;
pub mod scoring;
mod store;

pub use constraints::{PropertyFilter, resolve_filters};
pub use store::{EntityStore, StoreMetadata};
