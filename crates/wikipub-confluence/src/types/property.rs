//! Confluence content property types.

use serde::Deserialize;

/// Key/value property attached to a page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentProperty {
    /// Property key.
    pub key: String,
    /// Property value (arbitrary JSON).
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Page properties API response.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertiesResponse {
    /// Properties on the page.
    pub results: Vec<ContentProperty>,
}
