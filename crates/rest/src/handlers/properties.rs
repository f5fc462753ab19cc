//! Property listing handler.
//!
//! `GET [prefix]/properties?type=&limit=` lists the properties declared for
//! a type. Data extension clients call it to propose properties to fetch.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Response,
};
use recon_persistence::types::Property;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RestResult;
use crate::responses::jsonp_response;
use crate::state::AppState;

/// Query parameters of the property listing.
#[derive(Debug, Default, Deserialize)]
pub struct PropertiesParams {
    /// The type whose properties are listed.
    #[serde(rename = "type", default)]
    pub type_id: String,

    /// Maximum number of properties. Unparsable values count as no limit.
    #[serde(default)]
    pub limit: Option<String>,

    /// JSONP callback.
    #[serde(default)]
    pub callback: Option<String>,
}

/// The property listing.
#[derive(Debug, Serialize)]
pub struct PropertiesResponse {
    /// The applied limit, 0 when none.
    pub limit: i64,

    /// The requested type.
    #[serde(rename = "type")]
    pub type_id: String,

    /// Properties of the type, in declaration order.
    pub properties: Vec<Arc<Property>>,
}

/// Handler for the property listing.
///
/// Unknown types yield an empty list.
pub async fn properties_handler(
    State(state): State<AppState>,
    Query(params): Query<PropertiesParams>,
) -> RestResult<Response> {
    let limit = params
        .limit
        .as_deref()
        .and_then(|l| l.trim().parse::<i64>().ok())
        .unwrap_or(0);

    let mut properties = state.store().properties_for(&params.type_id);
    if let Ok(max) = usize::try_from(limit) {
        if max > 0 {
            properties.truncate(max);
        }
    }
    debug!(
        type_id = %params.type_id,
        limit,
        count = properties.len(),
        "Listing properties"
    );

    let callback = params.callback.as_deref().filter(|c| !c.is_empty());
    jsonp_response(
        callback,
        &PropertiesResponse {
            limit,
            type_id: params.type_id,
            properties,
        },
    )
}
