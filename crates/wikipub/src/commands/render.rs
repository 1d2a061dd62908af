//! `wikipub render` command implementation.

use std::path::PathBuf;

use clap::Args;
use wikipub_config::{PublishConfig, SourceFormat, TargetMarkup};
use wikipub_core::PageNode;
use wikipub_core::parser::{SourceParser, source_parser};
use wikipub_core::transform::{MarkupTransformer, markup_transformer};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Generated HTML page.
    page: PathBuf,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be read or transformed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let parser = source_parser(SourceFormat::Antora, PublishConfig::default().max_depth);
        let Some(content) = parser.extract(&self.page)? else {
            return Err(CliError::Validation(format!(
                "no page content found in {}",
                self.page.display()
            )));
        };

        let title = self
            .page
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let node = PageNode {
            title,
            source: Some(self.page),
            parent: None,
        };
        let result =
            markup_transformer(TargetMarkup::ConfluenceStorage).transform(&node, content)?;

        Output::stdout().info(&result.markup);

        let output = Output::new();
        if result.attachments.is_empty() {
            output.info("\nAttachments: none");
        } else {
            output.info(&format!("\nAttachments ({}):", result.attachments.len()));
            for attachment in &result.attachments {
                output.info(&format!(
                    "  -> {} ({})",
                    attachment.file_name,
                    attachment.source.display()
                ));
            }
        }
        Ok(())
    }
}
