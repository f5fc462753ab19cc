//! Response formatting for the reconciliation API.
//!
//! - [`jsonp`] - JSON bodies with optional JSONP wrapping

pub mod jsonp;

pub use jsonp::{CallbackParam, is_valid_callback, jsonp_response};
