//! Publishing of all configured mappings.

use wikipub_config::{PublishConfig, SpaceMapping};
use wikipub_confluence::ConfluenceApi;

use crate::engine::{MappingStats, SyncEngine};
use crate::error::SyncError;
use crate::parser::{SourceParser, source_parser};
use crate::transform::{MarkupTransformer, markup_transformer};

/// Outcome of one mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingReport {
    /// Target space.
    pub space_key: String,
    /// Counters on success, failure reason otherwise.
    pub outcome: Result<MappingStats, String>,
}

/// Outcome of a publish run, one entry per mapping in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Per-mapping results.
    pub mappings: Vec<MappingReport>,
}

impl PublishReport {
    /// True if every mapping completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.mappings.iter().all(|report| report.outcome.is_ok())
    }

    /// Number of failed mappings.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.mappings
            .iter()
            .filter(|report| report.outcome.is_err())
            .count()
    }
}

/// Runs one sync pass per mapping.
pub struct Publisher<'a> {
    api: &'a dyn ConfluenceApi,
    parser: Box<dyn SourceParser>,
    transformer: Box<dyn MarkupTransformer>,
    dry_run: bool,
    appearance: String,
}

impl<'a> Publisher<'a> {
    /// Create a publisher with the parser and transformer selected by `config`.
    #[must_use]
    pub fn new(api: &'a dyn ConfluenceApi, config: &PublishConfig) -> Self {
        Self {
            api,
            parser: source_parser(config.source_format, config.max_depth),
            transformer: markup_transformer(config.target_markup),
            dry_run: config.dry_run,
            appearance: config.appearance.clone(),
        }
    }

    /// Publish every mapping in order.
    ///
    /// A failing mapping is logged and reported; later mappings still run.
    pub fn publish(&self, mappings: &[SpaceMapping]) -> PublishReport {
        let mut report = PublishReport::default();

        for mapping in mappings {
            tracing::info!(
                space = %mapping.space_key,
                path = %mapping.path.display(),
                "Publishing mapping"
            );

            let outcome = match self.publish_mapping(mapping) {
                Ok(stats) => {
                    tracing::info!(
                        space = %mapping.space_key,
                        created = stats.pages_created,
                        reused = stats.pages_reused,
                        updated = stats.pages_updated,
                        attachments = stats.attachments_uploaded,
                        "Mapping published"
                    );
                    Ok(stats)
                }
                Err(e) => {
                    tracing::error!(space = %mapping.space_key, error = %e, "Mapping failed");
                    Err(e.to_string())
                }
            };

            report.mappings.push(MappingReport {
                space_key: mapping.space_key.clone(),
                outcome,
            });
        }

        report
    }

    fn publish_mapping(&self, mapping: &SpaceMapping) -> Result<MappingStats, SyncError> {
        let mut tree = self.parser.resolve(&mapping.path)?;
        if let Some(root) = &mapping.root {
            tree = tree.nest_under(root, Some(mapping.index_file().as_path()));
        }

        tracing::info!("Page hierarchy of {}:\n{}", mapping.space_key, tree.outline());

        SyncEngine::new(self.api, self.parser.as_ref(), self.transformer.as_ref())
            .with_dry_run(self.dry_run)
            .with_appearance(&self.appearance)
            .sync(&mapping.space_key, &tree)
    }
}
