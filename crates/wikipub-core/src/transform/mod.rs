//! Conversion of page bodies into wiki markup.

mod confluence;

use std::collections::BTreeSet;
use std::path::PathBuf;

use wikipub_config::TargetMarkup;

pub use confluence::ConfluenceStorageTransformer;

use crate::error::TransformError;
use crate::markup::Element;
use crate::tree::PageNode;

/// Local file referenced by a page and uploaded next to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Attachment {
    /// Base name of the file, used as the attachment title.
    pub file_name: String,
    /// Resolved path on disk.
    pub source: PathBuf,
}

/// Markup for one page and the attachments it references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformResult {
    /// Page body in the target markup.
    pub markup: String,
    /// Attachments, each at most once.
    pub attachments: BTreeSet<Attachment>,
}

/// Converter from extracted page bodies to a wiki's storage markup.
pub trait MarkupTransformer {
    /// Transform the body of `node`.
    ///
    /// Relative asset references are resolved against the directory of the
    /// node's source file.
    fn transform(&self, node: &PageNode, content: Element) -> Result<TransformResult, TransformError>;
}

/// Transformer for the configured target markup.
#[must_use]
pub fn markup_transformer(target: TargetMarkup) -> Box<dyn MarkupTransformer> {
    match target {
        TargetMarkup::ConfluenceStorage => Box::new(ConfluenceStorageTransformer::new()),
    }
}
