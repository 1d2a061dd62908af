//! Confluence integration for wikipub.
//!
//! This crate provides the remote side of publishing:
//! - [`ConfluenceApi`]: operations the sync engine needs from a wiki
//! - [`ConfluenceClient`]: REST implementation (v2 pages API, v1 attachments)
//! - [`MockConfluence`] for testing (behind `mock` feature flag)
//!
//! # API Client
//!
//! ```ignore
//! use wikipub_confluence::{ConfluenceApi, ConfluenceClient};
//!
//! let client = ConfluenceClient::new("https://example.atlassian.net/wiki")?
//!     .with_basic_auth("user@example.com", "api-token");
//!
//! let space = client.find_space("DOCS")?;
//! let pages = client.list_pages(&space.id)?;
//! ```

// Remote operations contract
mod api;
pub use api::ConfluenceApi;

// API client
mod client;
pub use client::{ConfluenceClient, guess_media_type};

// Test double
#[cfg(any(test, feature = "mock"))]
mod mock;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockConfluence, RemoteCall};

// Types
pub mod types;

// Errors
pub mod error;
pub use error::ConfluenceError;
