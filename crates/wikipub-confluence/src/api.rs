//! Remote API contract consumed by the sync engine.

use crate::error::ConfluenceError;
use crate::types::{ContentProperty, NewPage, PageSummary, PageUpdate, Space};

/// Operations the publisher needs from a Confluence instance.
///
/// [`ConfluenceClient`](crate::ConfluenceClient) talks to a real server;
/// `MockConfluence` (feature `mock`) keeps everything in memory.
pub trait ConfluenceApi {
    /// Look up a space by key.
    fn find_space(&self, key: &str) -> Result<Space, ConfluenceError>;

    /// List all current pages of a space (all result batches).
    fn list_pages(&self, space_id: &str) -> Result<Vec<PageSummary>, ConfluenceError>;

    /// Create a page and return the created record.
    fn create_page(&self, page: &NewPage<'_>) -> Result<PageSummary, ConfluenceError>;

    /// Replace a page body. `update.version` is the new version number.
    fn update_page(&self, update: &PageUpdate<'_>) -> Result<PageSummary, ConfluenceError>;

    /// List content properties of a page.
    fn list_page_properties(&self, page_id: &str) -> Result<Vec<ContentProperty>, ConfluenceError>;

    /// Create a content property on a page.
    fn create_page_property(
        &self,
        page_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ConfluenceError>;

    /// Upload an attachment, replacing an existing one with the same file name.
    fn upload_attachment(
        &self,
        page_id: &str,
        file_name: &str,
        data: &[u8],
        media_type: &str,
    ) -> Result<(), ConfluenceError>;
}
