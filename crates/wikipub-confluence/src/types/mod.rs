//! Confluence API types.

mod attachment;
mod page;
mod property;
mod space;

pub use attachment::{Attachment, AttachmentsResponse};
pub use page::{Links, NewPage, PageSummary, PageUpdate, PagesResponse, Version};
pub use property::{ContentProperty, PropertiesResponse};
pub use space::{Space, SpacesResponse};

use serde::{Deserialize, Deserializer};

/// Deserialize an identifier that the API may send as a string or a number.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
