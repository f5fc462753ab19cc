//! The service manifest advertised at the API root.
//!
//! The manifest tells reconciliation clients which protocol versions the
//! service speaks and where its suggest and extend endpoints live.

use std::sync::Arc;

use recon_persistence::core::EntityStore;
use recon_persistence::types::Type;
use serde::Serialize;

use crate::config::ServerConfig;

/// Protocol versions this service implements.
pub const VERSIONS: &[&str] = &["0.1", "0.2"];

/// Placeholder for the entity id in URL templates.
pub const ID_PLACEHOLDER: &str = "{{id}}";

/// Rewrites the placeholder spellings a dataset may use (`%s`, `${id}`)
/// to `{{id}}`.
///
/// # Examples
///
/// ```
/// use recon_rest::manifest::normalize_url_template;
///
/// assert_eq!(
///     normalize_url_template("https://example.org/view/%s"),
///     "https://example.org/view/{{id}}"
/// );
/// assert_eq!(
///     normalize_url_template("https://example.org/view/${id}"),
///     "https://example.org/view/{{id}}"
/// );
/// ```
pub fn normalize_url_template(template: &str) -> String {
    template
        .replace("${id}", ID_PLACEHOLDER)
        .replace("%s", ID_PLACEHOLDER)
}

/// Location of a service endpoint: a root URL plus a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDefinition {
    /// Root URL of the service.
    pub service_url: String,
    /// Path appended to the root URL.
    pub service_path: String,
}

impl ServiceDefinition {
    fn new(service_url: &str, service_path: &str) -> Self {
        Self {
            service_url: service_url.to_string(),
            service_path: service_path.to_string(),
        }
    }
}

/// Suggest endpoints for auto-completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggest {
    /// Entity suggestions.
    pub entity: ServiceDefinition,
    /// Type suggestions.
    #[serde(rename = "type")]
    pub type_: ServiceDefinition,
    /// Property suggestions.
    pub property: ServiceDefinition,
}

/// Data extension settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extend {
    /// Endpoint proposing properties to fetch for a type.
    pub propose_properties: ServiceDefinition,
}

/// Template turning an entity id into a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    /// URL template with a `{{id}}` placeholder.
    pub url: String,
}

/// The reconciliation service manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Supported protocol versions.
    pub versions: Vec<String>,
    /// Human-readable name of the dataset.
    pub name: String,
    /// Namespace URI of entity identifiers.
    pub identifier_space: String,
    /// Namespace URI of the schema.
    pub schema_space: String,
    /// Types offered for reconciliation.
    pub default_types: Vec<Arc<Type>>,
    /// Entity view template, when the dataset has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<View>,
    /// Auto-completion endpoints.
    pub suggest: Suggest,
    /// Data extension endpoints.
    pub extend: Extend,
}

impl Manifest {
    /// Builds the manifest for a store served under the configured public
    /// URL and prefix.
    pub fn build(store: &dyn EntityStore, config: &ServerConfig) -> Self {
        let root = config.service_url();
        let view_url = store.view_url_template();

        Self {
            versions: VERSIONS.iter().map(|v| v.to_string()).collect(),
            name: store.name().to_string(),
            identifier_space: store.identifier_namespace().to_string(),
            schema_space: store.schema_namespace().to_string(),
            default_types: store.types(),
            view: (!view_url.is_empty()).then(|| View {
                url: normalize_url_template(view_url),
            }),
            suggest: Suggest {
                entity: ServiceDefinition::new(&root, "/auto/entities"),
                type_: ServiceDefinition::new(&root, "/auto/types"),
                property: ServiceDefinition::new(&root, "/auto/properties"),
            },
            extend: Extend {
                propose_properties: ServiceDefinition::new(&root, "/properties"),
            },
        }
    }
}
