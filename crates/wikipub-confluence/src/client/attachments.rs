//! Attachment upload for Confluence API.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use rand::RngExt;
use tracing::info;

use super::{ConfluenceClient, check_status};
use crate::error::ConfluenceError;
use crate::types::AttachmentsResponse;

impl ConfluenceClient {
    /// Create or replace an attachment by file name.
    ///
    /// Uses the v1 `PUT .../child/attachment` endpoint, which updates the
    /// attachment with the same title when it exists.
    pub(crate) fn put_attachment(
        &self,
        page_id: &str,
        file_name: &str,
        data: &[u8],
        media_type: &str,
    ) -> Result<(), ConfluenceError> {
        let url = format!(
            "{}/content/{}/child/attachment",
            self.api_v1_url(),
            utf8_percent_encode(page_id, NON_ALPHANUMERIC)
        );

        info!(
            "Uploading attachment '{}' ({} bytes) to page {}",
            file_name,
            data.len(),
            page_id
        );

        let boundary = format!("----WikipubFormBoundary{:016x}", rand::rng().random::<u64>());
        let body = multipart_body(&boundary, file_name, data, media_type);

        let response = self
            .prepare(self.agent.put(&url))
            .header(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .header("X-Atlassian-Token", "nocheck")
            .send(&body[..])?;

        let mut body_reader = check_status(response)?;
        let uploaded: AttachmentsResponse = body_reader.read_json()?;
        if let Some(attachment) = uploaded.results.first() {
            info!(
                "Stored attachment '{}' (id={}, version={})",
                attachment.title,
                attachment.id,
                attachment.version.as_ref().map_or(1, |v| v.number)
            );
        }
        Ok(())
    }
}

/// Build a `multipart/form-data` body with the file part and a minor-edit flag.
fn multipart_body(boundary: &str, file_name: &str, data: &[u8], media_type: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 512);

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {media_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"minorEdit\"\r\n\r\n");
    body.extend_from_slice(b"true\r\n");

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

/// Guess the media type of an attachment from its file extension.
#[must_use]
pub fn guess_media_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
