//! CLI error types.

use wikipub_config::ConfigError;
use wikipub_confluence::ConfluenceError;
use wikipub_core::{ExtractError, NavigationError, TransformError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Confluence(#[from] ConfluenceError),

    #[error("{0}")]
    Navigation(#[from] NavigationError),

    #[error("{0}")]
    Extract(#[from] ExtractError),

    #[error("{0}")]
    Transform(#[from] TransformError),

    #[error("{failed} of {total} mapping(s) failed")]
    Publish { failed: usize, total: usize },

    #[error("{0}")]
    Validation(String),
}
