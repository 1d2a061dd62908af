//! In-memory Confluence implementation for testing.
//!
//! Provides [`MockConfluence`] for exercising the publisher without a server.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::api::ConfluenceApi;
use crate::error::ConfluenceError;
use crate::types::{ContentProperty, NewPage, PageSummary, PageUpdate, Space, Version};

/// Remote call recorded by [`MockConfluence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    FindSpace {
        key: String,
    },
    ListPages {
        space_id: String,
    },
    CreatePage {
        parent_id: Option<String>,
        title: String,
    },
    UpdatePage {
        id: String,
        title: String,
        version: u32,
        body: String,
    },
    ListProperties {
        page_id: String,
    },
    CreateProperty {
        page_id: String,
        key: String,
        value: String,
    },
    UploadAttachment {
        page_id: String,
        file_name: String,
        media_type: String,
        size: usize,
    },
}

/// Mock Confluence for testing.
///
/// Stores spaces, pages and properties in memory and records every call.
/// Use the builder methods to seed data and inject failures.
///
/// # Example
///
/// ```ignore
/// use wikipub_confluence::{ConfluenceApi, MockConfluence};
///
/// let confluence = MockConfluence::new()
///     .with_space("DOCS", "100")
///     .with_page("100", "1", "Intro", 3);
///
/// let pages = confluence.list_pages("100").unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockConfluence {
    spaces: RwLock<HashMap<String, Space>>,
    pages: RwLock<Vec<PageSummary>>,
    bodies: RwLock<HashMap<String, String>>,
    properties: RwLock<HashMap<String, Vec<ContentProperty>>>,
    failing_creates: RwLock<HashSet<String>>,
    failing_updates: RwLock<HashSet<String>>,
    failing_uploads: RwLock<HashSet<String>>,
    next_id: RwLock<u64>,
    calls: RwLock<Vec<RemoteCall>>,
}

impl MockConfluence {
    /// Create an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a space.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_space(self, key: &str, id: &str) -> Self {
        self.spaces.write().unwrap().insert(
            key.to_owned(),
            Space {
                id: id.to_owned(),
                key: key.to_owned(),
                name: key.to_owned(),
            },
        );
        self
    }

    /// Add an existing top-level page to a space.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_page(self, space_id: &str, id: &str, title: &str, version: u32) -> Self {
        self.pages.write().unwrap().push(PageSummary {
            id: id.to_owned(),
            title: title.to_owned(),
            space_id: Some(space_id.to_owned()),
            parent_id: None,
            version: Version { number: version },
        });
        self
    }

    /// Add a content property to a page.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_property(self, page_id: &str, key: &str, value: &str) -> Self {
        self.properties
            .write()
            .unwrap()
            .entry(page_id.to_owned())
            .or_default()
            .push(ContentProperty {
                key: key.to_owned(),
                value: serde_json::Value::String(value.to_owned()),
            });
        self
    }

    /// Make page creation fail for the given title.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn failing_create(self, title: &str) -> Self {
        self.failing_creates.write().unwrap().insert(title.to_owned());
        self
    }

    /// Make body updates fail for the given title.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn failing_update(self, title: &str) -> Self {
        self.failing_updates.write().unwrap().insert(title.to_owned());
        self
    }

    /// Make uploads fail for the given file name.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn failing_upload(self, file_name: &str) -> Self {
        self.failing_uploads
            .write()
            .unwrap()
            .insert(file_name.to_owned());
        self
    }

    /// All calls received so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.read().unwrap().clone()
    }

    /// Current state of a page.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn page(&self, id: &str) -> Option<PageSummary> {
        self.pages
            .read()
            .unwrap()
            .iter()
            .find(|page| page.id == id)
            .cloned()
    }

    /// First page with the given title.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn page_by_title(&self, title: &str) -> Option<PageSummary> {
        self.pages
            .read()
            .unwrap()
            .iter()
            .find(|page| page.title == title)
            .cloned()
    }

    /// Current body of a page.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn body(&self, id: &str) -> Option<String> {
        self.bodies.read().unwrap().get(id).cloned()
    }

    /// Number of pages stored across all spaces.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.read().unwrap().len()
    }

    fn record(&self, call: RemoteCall) {
        self.calls.write().unwrap().push(call);
    }

    fn allocate_id(&self) -> String {
        let mut next_id = self.next_id.write().unwrap();
        *next_id += 1;
        format!("mock-{next_id}")
    }
}

/// Error returned for injected failures.
fn injected_failure(what: &str) -> ConfluenceError {
    ConfluenceError::HttpResponse {
        status: 500,
        body: format!("injected failure: {what}"),
    }
}

impl ConfluenceApi for MockConfluence {
    fn find_space(&self, key: &str) -> Result<Space, ConfluenceError> {
        self.record(RemoteCall::FindSpace {
            key: key.to_owned(),
        });
        self.spaces
            .read()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| ConfluenceError::SpaceNotFound(key.to_owned()))
    }

    fn list_pages(&self, space_id: &str) -> Result<Vec<PageSummary>, ConfluenceError> {
        self.record(RemoteCall::ListPages {
            space_id: space_id.to_owned(),
        });
        Ok(self
            .pages
            .read()
            .unwrap()
            .iter()
            .filter(|page| page.space_id.as_deref() == Some(space_id))
            .cloned()
            .collect())
    }

    fn create_page(&self, page: &NewPage<'_>) -> Result<PageSummary, ConfluenceError> {
        self.record(RemoteCall::CreatePage {
            parent_id: page.parent_id.map(str::to_owned),
            title: page.title.to_owned(),
        });
        if self.failing_creates.read().unwrap().contains(page.title) {
            return Err(injected_failure(page.title));
        }

        let created = PageSummary {
            id: self.allocate_id(),
            title: page.title.to_owned(),
            space_id: Some(page.space_id.to_owned()),
            parent_id: page.parent_id.map(str::to_owned),
            version: Version { number: 1 },
        };
        self.bodies
            .write()
            .unwrap()
            .insert(created.id.clone(), page.body.to_owned());
        self.pages.write().unwrap().push(created.clone());
        Ok(created)
    }

    fn update_page(&self, update: &PageUpdate<'_>) -> Result<PageSummary, ConfluenceError> {
        self.record(RemoteCall::UpdatePage {
            id: update.id.to_owned(),
            title: update.title.to_owned(),
            version: update.version,
            body: update.body.to_owned(),
        });
        if self.failing_updates.read().unwrap().contains(update.title) {
            return Err(injected_failure(update.title));
        }

        let mut pages = self.pages.write().unwrap();
        let Some(page) = pages.iter_mut().find(|page| page.id == update.id) else {
            return Err(ConfluenceError::HttpResponse {
                status: 404,
                body: format!("no page with id {}", update.id),
            });
        };
        if update.version != page.version.number + 1 {
            return Err(ConfluenceError::HttpResponse {
                status: 409,
                body: format!(
                    "version conflict: current {}, got {}",
                    page.version.number, update.version
                ),
            });
        }

        page.version.number = update.version;
        page.title = update.title.to_owned();
        self.bodies
            .write()
            .unwrap()
            .insert(update.id.to_owned(), update.body.to_owned());
        Ok(page.clone())
    }

    fn list_page_properties(&self, page_id: &str) -> Result<Vec<ContentProperty>, ConfluenceError> {
        self.record(RemoteCall::ListProperties {
            page_id: page_id.to_owned(),
        });
        Ok(self
            .properties
            .read()
            .unwrap()
            .get(page_id)
            .cloned()
            .unwrap_or_default())
    }

    fn create_page_property(
        &self,
        page_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ConfluenceError> {
        self.record(RemoteCall::CreateProperty {
            page_id: page_id.to_owned(),
            key: key.to_owned(),
            value: value.to_owned(),
        });
        let mut properties = self.properties.write().unwrap();
        let entries = properties.entry(page_id.to_owned()).or_default();
        if entries.iter().any(|property| property.key == key) {
            return Err(ConfluenceError::HttpResponse {
                status: 409,
                body: format!("property {key} already exists"),
            });
        }
        entries.push(ContentProperty {
            key: key.to_owned(),
            value: serde_json::Value::String(value.to_owned()),
        });
        Ok(())
    }

    fn upload_attachment(
        &self,
        page_id: &str,
        file_name: &str,
        data: &[u8],
        media_type: &str,
    ) -> Result<(), ConfluenceError> {
        self.record(RemoteCall::UploadAttachment {
            page_id: page_id.to_owned(),
            file_name: file_name.to_owned(),
            media_type: media_type.to_owned(),
            size: data.len(),
        });
        if self.failing_uploads.read().unwrap().contains(file_name) {
            return Err(injected_failure(file_name));
        }
        Ok(())
    }
}
