//! Confluence space types.

use serde::Deserialize;

use super::string_or_number;

/// Confluence space.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Space {
    /// Space ID (used by the v2 page endpoints).
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Space key.
    pub key: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Spaces API response.
#[derive(Debug, Clone, Deserialize)]
pub struct SpacesResponse {
    /// Matching spaces.
    pub results: Vec<Space>,
}
