//! Confluence REST API client.
//!
//! Provides a sync HTTP client for the Confluence REST API. Pages, spaces
//! and properties go through the v2 API (`/api/v2`); attachments use the v1
//! content API (`/rest/api`), which supports create-or-replace uploads.

mod attachments;
mod pages;
mod properties;
mod spaces;

pub use attachments::guess_media_type;

use std::time::Duration;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use serde::de::DeserializeOwned;
use ureq::http::{Response, Uri};
use ureq::{Agent, Body, RequestBuilder};

use crate::api::ConfluenceApi;
use crate::error::ConfluenceError;
use crate::types::{ContentProperty, NewPage, PageSummary, PageUpdate, Space};

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Confluence REST API client.
pub struct ConfluenceClient {
    agent: Agent,
    base_url: String,
    origin: String,
    auth_header: Option<String>,
}

impl ConfluenceClient {
    /// Create an anonymous client for `base_url`
    /// (e.g. `https://example.atlassian.net/wiki`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfluenceError::InvalidUrl`] if `base_url` has no scheme or host.
    pub fn new(base_url: &str) -> Result<Self, ConfluenceError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let uri: Uri = base_url
            .parse()
            .map_err(|_| ConfluenceError::InvalidUrl(base_url.clone()))?;
        let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) else {
            return Err(ConfluenceError::InvalidUrl(base_url));
        };
        let origin = format!("{scheme}://{authority}");

        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Self {
            agent,
            base_url,
            origin,
            auth_header: None,
        })
    }

    /// Authenticate every request with HTTP Basic credentials.
    #[must_use]
    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        let token = BASE64_STANDARD.encode(format!("{username}:{password}"));
        self.auth_header = Some(format!("Basic {token}"));
        self
    }

    /// Base URL of the v2 API.
    fn api_v2_url(&self) -> String {
        format!("{}/api/v2", self.base_url)
    }

    /// Base URL of the v1 content API.
    fn api_v1_url(&self) -> String {
        format!("{}/rest/api", self.base_url)
    }

    /// Turn a pagination link into an absolute URL.
    ///
    /// The API returns `_links.next` relative to the site origin
    /// (`/wiki/api/v2/...`).
    fn absolute_url(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_owned()
        } else {
            format!("{}{}", self.origin, link)
        }
    }

    /// Add the common headers to a request.
    fn prepare<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        let request = request.header("Accept", "application/json");
        match &self.auth_header {
            Some(header) => request.header("Authorization", header.as_str()),
            None => request,
        }
    }

    /// GET `url` and decode the JSON response.
    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ConfluenceError> {
        let response = self.prepare(self.agent.get(url)).call()?;
        read_json(response)
    }

    /// Send `payload` as JSON with the given method and decode the response.
    fn send_json<T: DeserializeOwned>(
        &self,
        method: &str,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<T, ConfluenceError> {
        let payload_bytes = serde_json::to_vec(payload)?;
        let request = match method {
            "PUT" => self.agent.put(url),
            _ => self.agent.post(url),
        };
        let response = self
            .prepare(request)
            .header("Content-Type", "application/json")
            .send(&payload_bytes[..])?;
        read_json(response)
    }
}

/// Fail on error statuses, returning the body reader otherwise.
fn check_status(response: Response<Body>) -> Result<Body, ConfluenceError> {
    let status = response.status().as_u16();
    let mut body_reader = response.into_body();

    if status >= 400 {
        let error_body = body_reader
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        return Err(ConfluenceError::HttpResponse {
            status,
            body: error_body,
        });
    }

    Ok(body_reader)
}

/// Decode a JSON response after checking its status.
fn read_json<T: DeserializeOwned>(response: Response<Body>) -> Result<T, ConfluenceError> {
    let mut body_reader = check_status(response)?;
    Ok(body_reader.read_json()?)
}

impl ConfluenceApi for ConfluenceClient {
    fn find_space(&self, key: &str) -> Result<Space, ConfluenceError> {
        self.get_space_by_key(key)
    }

    fn list_pages(&self, space_id: &str) -> Result<Vec<PageSummary>, ConfluenceError> {
        self.get_pages_in_space(space_id)
    }

    fn create_page(&self, page: &NewPage<'_>) -> Result<PageSummary, ConfluenceError> {
        self.post_page(page)
    }

    fn update_page(&self, update: &PageUpdate<'_>) -> Result<PageSummary, ConfluenceError> {
        self.put_page(update)
    }

    fn list_page_properties(&self, page_id: &str) -> Result<Vec<ContentProperty>, ConfluenceError> {
        self.get_page_properties(page_id)
    }

    fn create_page_property(
        &self,
        page_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ConfluenceError> {
        self.post_page_property(page_id, key, value)
    }

    fn upload_attachment(
        &self,
        page_id: &str,
        file_name: &str,
        data: &[u8],
        media_type: &str,
    ) -> Result<(), ConfluenceError> {
        self.put_attachment(page_id, file_name, data, media_type)
    }
}
