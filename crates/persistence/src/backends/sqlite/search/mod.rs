//! Full-text search support for the SQLite store.

pub mod fts;
pub mod query_builder;

pub use fts::match_expression;
pub use query_builder::{EntitySearchBuilder, SqlFragment, SqlParam, table_alias};
