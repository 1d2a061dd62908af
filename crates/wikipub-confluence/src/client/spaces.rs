//! Space lookup for Confluence API.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::info;

use super::ConfluenceClient;
use crate::error::ConfluenceError;
use crate::types::{Space, SpacesResponse};

impl ConfluenceClient {
    /// Resolve a space key to the space record.
    pub(crate) fn get_space_by_key(&self, key: &str) -> Result<Space, ConfluenceError> {
        let url = format!(
            "{}/spaces?keys={}&limit=1",
            self.api_v2_url(),
            utf8_percent_encode(key, NON_ALPHANUMERIC)
        );

        info!("Looking up space {}", key);

        let response: SpacesResponse = self.get_json(&url)?;
        response
            .results
            .into_iter()
            .find(|space| space.key == key)
            .ok_or_else(|| ConfluenceError::SpaceNotFound(key.to_owned()))
    }
}
