//! Attachment types returned by the v1 content API.

use serde::Deserialize;

use super::Version;

/// Attachment stored on a page.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    /// Attachment content id (`att123`).
    pub id: String,
    /// File name the attachment is addressed by.
    pub title: String,
    /// Present on create-or-replace responses.
    #[serde(default)]
    pub version: Option<Version>,
}

/// Response of the create-or-replace upload endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentsResponse {
    pub results: Vec<Attachment>,
}
