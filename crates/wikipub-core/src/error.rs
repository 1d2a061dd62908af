//! Error types for tree resolution, extraction, transformation and sync.

use std::path::PathBuf;

use wikipub_confluence::ConfluenceError;

/// Markup could not be tokenized.
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    /// XML tokenizer error.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Navigation menu could not be turned into a page tree.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    /// Index document could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Index document could not be parsed.
    #[error("cannot parse {}: {source}", path.display())]
    Markup {
        path: PathBuf,
        #[source]
        source: MarkupError,
    },

    /// No element with `data-panel="menu"`.
    #[error("no navigation menu (data-panel=\"menu\") in {}", .0.display())]
    MenuNotFound(PathBuf),

    /// `data-depth` is not a number.
    #[error("invalid data-depth value '{value}' on '{title}'")]
    InvalidDepth { value: String, title: String },

    /// `data-depth` is deeper than the configured bound.
    #[error("navigation depth {depth} of '{title}' exceeds the limit of {max}")]
    DepthExceeded {
        depth: usize,
        max: usize,
        title: String,
    },
}

/// Page body could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Source file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source file could not be parsed.
    #[error("cannot parse {}: {source}", path.display())]
    Markup {
        path: PathBuf,
        #[source]
        source: MarkupError,
    },
}

/// Page body could not be converted to storage markup.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Content was handed over for a node without a source file.
    #[error("page '{0}' has no source file to resolve assets against")]
    MissingSource(String),
}

/// Failure of one mapping's publish pass.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Navigation tree could not be resolved.
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// Page body could not be loaded.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Page body could not be transformed.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Remote call failed.
    #[error("Confluence: {0}")]
    Remote(#[from] ConfluenceError),
}
