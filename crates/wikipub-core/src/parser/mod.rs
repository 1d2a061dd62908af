//! Source site readers.
//!
//! A [`SourceParser`] turns a generated documentation site into a
//! [`PageTree`] and loads the body of individual pages.

mod antora;

use std::path::Path;

use wikipub_config::SourceFormat;

pub use antora::AntoraParser;

use crate::error::{ExtractError, NavigationError};
use crate::markup::Element;
use crate::tree::PageTree;

/// Name of the document holding the navigation menu of a site.
pub const INDEX_FILE: &str = "index.html";

/// Reader for one kind of generated site.
pub trait SourceParser {
    /// Build the page hierarchy of the site rooted at `root`.
    fn resolve(&self, root: &Path) -> Result<PageTree, NavigationError>;

    /// Load the main content element of a page.
    ///
    /// Returns `Ok(None)` when the page has no recognizable body.
    fn extract(&self, source: &Path) -> Result<Option<Element>, ExtractError>;
}

/// Parser for the configured source format.
#[must_use]
pub fn source_parser(format: SourceFormat, max_depth: usize) -> Box<dyn SourceParser> {
    match format {
        SourceFormat::Antora => Box::new(AntoraParser::new(max_depth)),
    }
}
