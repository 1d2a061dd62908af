//! Page operations for Confluence API.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::json;
use tracing::{debug, info};

use super::ConfluenceClient;
use crate::error::ConfluenceError;
use crate::types::{NewPage, PageSummary, PageUpdate, PagesResponse};

/// Batch size requested from the pages endpoint (API maximum).
const PAGE_BATCH_SIZE: u32 = 250;

impl ConfluenceClient {
    /// List every current page of a space, following pagination links.
    pub(crate) fn get_pages_in_space(
        &self,
        space_id: &str,
    ) -> Result<Vec<PageSummary>, ConfluenceError> {
        let mut url = format!(
            "{}/spaces/{}/pages?status=current&limit={PAGE_BATCH_SIZE}",
            self.api_v2_url(),
            utf8_percent_encode(space_id, NON_ALPHANUMERIC)
        );
        let mut pages = Vec::new();

        loop {
            debug!("Fetching {}", url);
            let batch: PagesResponse = self.get_json(&url)?;
            pages.extend(batch.results);

            match batch.links.and_then(|links| links.next) {
                Some(next) => url = self.absolute_url(&next),
                None => break,
            }
        }

        info!("Found {} pages in space {}", pages.len(), space_id);
        Ok(pages)
    }

    /// Create a page in storage representation.
    pub(crate) fn post_page(&self, page: &NewPage<'_>) -> Result<PageSummary, ConfluenceError> {
        let url = format!("{}/pages", self.api_v2_url());

        let mut payload = json!({
            "spaceId": page.space_id,
            "status": "current",
            "title": page.title,
            "body": {
                "representation": "storage",
                "value": page.body
            }
        });

        if let Some(parent_id) = page.parent_id {
            payload["parentId"] = json!(parent_id);
        }

        info!("Creating page '{}'", page.title);

        let created: PageSummary = self.send_json("POST", &url, &payload)?;
        info!("Created page '{}' (id={})", created.title, created.id);
        Ok(created)
    }

    /// Replace the body of a page with a new version.
    pub(crate) fn put_page(&self, update: &PageUpdate<'_>) -> Result<PageSummary, ConfluenceError> {
        let url = format!(
            "{}/pages/{}",
            self.api_v2_url(),
            utf8_percent_encode(update.id, NON_ALPHANUMERIC)
        );

        let payload = json!({
            "id": update.id,
            "status": "current",
            "title": update.title,
            "body": {
                "representation": "storage",
                "value": update.body
            },
            "version": {"number": update.version}
        });

        info!(
            "Updating page {} to version {}",
            update.id, update.version
        );

        self.send_json("PUT", &url, &payload)
    }
}
