//! `wikipub tree` command implementation.

use std::path::PathBuf;

use clap::Args;
use wikipub_config::{MAX_DEPTH_LIMIT, PublishConfig, SourceFormat};
use wikipub_core::parser::{SourceParser, source_parser};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the tree command.
#[derive(Args)]
pub(crate) struct TreeArgs {
    /// Site directory containing the navigation index.
    path: PathBuf,

    /// Deepest navigation level accepted.
    #[arg(long)]
    max_depth: Option<usize>,
}

impl TreeArgs {
    /// Execute the tree command.
    ///
    /// # Errors
    ///
    /// Returns an error if the navigation cannot be resolved.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let max_depth = self
            .max_depth
            .unwrap_or_else(|| PublishConfig::default().max_depth);
        if !(1..=MAX_DEPTH_LIMIT).contains(&max_depth) {
            return Err(CliError::Validation(format!(
                "--max-depth must be between 1 and {MAX_DEPTH_LIMIT}"
            )));
        }

        let tree = source_parser(SourceFormat::Antora, max_depth).resolve(&self.path)?;

        let output = Output::stdout();
        if tree.is_empty() {
            output.warning("No navigation entries found.");
            return Ok(());
        }
        for line in tree.outline().lines() {
            output.info(line);
        }
        Ok(())
    }
}
