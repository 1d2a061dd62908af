//! Confluence page types.

use serde::{Deserialize, Serialize};

use super::string_or_number;

/// Page as returned by the v2 pages endpoints.
///
/// Only includes fields used for title matching and versioned updates.
/// Serde ignores unknown fields from the API response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    /// Page ID.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Page title.
    pub title: String,
    /// Owning space ID.
    #[serde(default)]
    pub space_id: Option<String>,
    /// Parent page ID (absent for top-level pages).
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Current version.
    #[serde(default)]
    pub version: Version,
}

/// Page version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Version {
    /// Version number.
    pub number: u32,
}

/// Paged list of pages in a space.
#[derive(Debug, Clone, Deserialize)]
pub struct PagesResponse {
    /// Pages in this batch.
    pub results: Vec<PageSummary>,
    /// Pagination links.
    #[serde(rename = "_links", default)]
    pub links: Option<Links>,
}

/// Hypermedia links of a list response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    /// Relative URL of the next batch, if any.
    #[serde(default)]
    pub next: Option<String>,
}

/// Request to create a page.
#[derive(Debug, Clone, Copy)]
pub struct NewPage<'a> {
    /// Target space ID.
    pub space_id: &'a str,
    /// Parent page ID; `None` creates a top-level page.
    pub parent_id: Option<&'a str>,
    /// Page title.
    pub title: &'a str,
    /// Initial body in storage format.
    pub body: &'a str,
}

/// Request to replace the body of an existing page.
#[derive(Debug, Clone, Copy)]
pub struct PageUpdate<'a> {
    /// Page ID.
    pub id: &'a str,
    /// Page title.
    pub title: &'a str,
    /// New version number (current + 1).
    pub version: u32,
    /// Body in storage format.
    pub body: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_pages_response() {
        let json = r#"{
            "results": [
                {"id": "65537", "title": "Intro", "spaceId": "98305", "parentId": null,
                 "status": "current", "version": {"number": 4, "message": ""}}
            ],
            "_links": {"next": "/wiki/api/v2/spaces/98305/pages?cursor=abc"}
        }"#;
        let response: PagesResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.results.len(), 1);
        let page = &response.results[0];
        assert_eq!(page.id, "65537");
        assert_eq!(page.title, "Intro");
        assert_eq!(page.space_id.as_deref(), Some("98305"));
        assert!(page.parent_id.is_none());
        assert_eq!(page.version.number, 4);
        assert_eq!(
            response.links.unwrap().next.as_deref(),
            Some("/wiki/api/v2/spaces/98305/pages?cursor=abc")
        );
    }

    #[test]
    fn test_deserialize_numeric_id() {
        let json = r#"{"id": 123, "title": "T", "version": {"number": 1}}"#;
        let page: PageSummary = serde_json::from_str(json).unwrap();
        assert_eq!(page.id, "123");
    }

    #[test]
    fn test_deserialize_missing_version_defaults_to_zero() {
        let json = r#"{"id": "1", "title": "T"}"#;
        let page: PageSummary = serde_json::from_str(json).unwrap();
        assert_eq!(page.version.number, 0);
    }
}
