//! Publishing engine for wikipub.
//!
//! Turns a generated documentation site into Confluence pages:
//! - [`parser`]: navigation menu to [`PageTree`], page body extraction
//! - [`transform`]: page body to Confluence storage format plus attachments
//! - [`SyncEngine`]: create-or-update reconciliation against a space
//! - [`Publisher`]: one isolated pass per configured mapping
//!
//! # Example
//!
//! ```ignore
//! use wikipub_config::Config;
//! use wikipub_confluence::ConfluenceClient;
//! use wikipub_core::Publisher;
//!
//! let config = Config::load(None, None)?;
//! let client = ConfluenceClient::new(&config.require_confluence()?.base_url)?;
//! let report = Publisher::new(&client, &config.publish).publish(config.require_mappings()?);
//! ```

pub mod error;
pub mod markup;
pub mod parser;
pub mod transform;

mod engine;
mod publisher;
mod tree;

pub use engine::{APPEARANCE_PROPERTIES, DEFAULT_APPEARANCE, MappingStats, SyncEngine};
pub use error::{ExtractError, MarkupError, NavigationError, SyncError, TransformError};
pub use publisher::{MappingReport, PublishReport, Publisher};
pub use tree::{PageId, PageNode, PageTree, PageTreeBuilder};
