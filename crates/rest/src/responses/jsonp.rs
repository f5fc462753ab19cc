//! JSON and JSONP response building.
//!
//! Every endpoint honours a `callback` query parameter. With a callback the
//! JSON payload is wrapped as `/**/callback(<json>);` and served as
//! `application/javascript`; without one it is plain `application/json`.

use axum::response::{IntoResponse, Response};
use http::{StatusCode, header};
use serde::{Deserialize, Serialize};

use crate::error::{RestError, RestResult};

/// The `callback` query parameter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParam {
    /// JSONP callback name; empty means none.
    #[serde(default)]
    pub callback: Option<String>,
}

impl CallbackParam {
    /// Returns the callback, treating an empty value as absent.
    pub fn name(&self) -> Option<&str> {
        self.callback.as_deref().filter(|c| !c.is_empty())
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Checks that a callback is a JavaScript identifier, or a dotted path of
/// identifiers such as `jQuery.cb`.
///
/// # Examples
///
/// ```
/// use recon_rest::responses::jsonp::is_valid_callback;
///
/// assert!(is_valid_callback("jQuery3110_1700000000"));
/// assert!(is_valid_callback("ns.handle"));
/// assert!(!is_valid_callback("alert(1)"));
/// ```
pub fn is_valid_callback(callback: &str) -> bool {
    callback.split('.').all(is_identifier)
}

/// Serializes a payload as JSON, or as JSONP when a callback is given.
///
/// An invalid callback is rejected with 400 before anything is serialized.
pub fn jsonp_response<T: Serialize>(callback: Option<&str>, payload: &T) -> RestResult<Response> {
    if let Some(cb) = callback {
        if !is_valid_callback(cb) {
            return Err(RestError::bad_request(format!(
                "invalid callback name: {}",
                cb
            )));
        }
    }

    let json = serde_json::to_string(payload).map_err(|e| RestError::InternalError {
        message: format!("Failed to serialize response: {}", e),
    })?;

    let response = match callback {
        Some(cb) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime::APPLICATION_JAVASCRIPT.to_string())],
            format!("/**/{}({});", cb, json),
        )
            .into_response(),
        None => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
            json,
        )
            .into_response(),
    };
    Ok(response)
}
