//! Content property operations for Confluence API.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::json;
use tracing::debug;

use super::ConfluenceClient;
use crate::error::ConfluenceError;
use crate::types::{ContentProperty, PropertiesResponse};

impl ConfluenceClient {
    fn properties_url(&self, page_id: &str) -> String {
        format!(
            "{}/pages/{}/properties",
            self.api_v2_url(),
            utf8_percent_encode(page_id, NON_ALPHANUMERIC)
        )
    }

    /// List content properties of a page.
    pub(crate) fn get_page_properties(
        &self,
        page_id: &str,
    ) -> Result<Vec<ContentProperty>, ConfluenceError> {
        let response: PropertiesResponse = self.get_json(&self.properties_url(page_id))?;
        Ok(response.results)
    }

    /// Create a string-valued content property.
    pub(crate) fn post_page_property(
        &self,
        page_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ConfluenceError> {
        debug!("Setting property {}={} on page {}", key, value, page_id);

        let payload = json!({"key": key, "value": value});
        let _: ContentProperty = self.send_json("POST", &self.properties_url(page_id), &payload)?;
        Ok(())
    }
}
