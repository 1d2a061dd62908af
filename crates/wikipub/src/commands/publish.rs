//! `wikipub publish` command implementation.

use std::path::PathBuf;

use clap::Args;
use wikipub_config::{CliSettings, Config, ConfluenceConfig};
use wikipub_confluence::ConfluenceClient;
use wikipub_core::{PublishReport, Publisher};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the publish command.
#[derive(Args)]
pub(crate) struct PublishArgs {
    /// Path to configuration file (default: auto-discover wikipub.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resolve and transform everything without writing to Confluence.
    #[arg(long)]
    dry_run: bool,

    /// Confluence base URL (overrides config).
    #[arg(long)]
    base_url: Option<String>,

    /// Confluence username (overrides config).
    #[arg(long, env = "WIKIPUB_USERNAME")]
    username: Option<String>,

    /// Confluence password or API token (overrides config).
    #[arg(long, env = "WIKIPUB_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl PublishArgs {
    /// Execute the publish command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or any mapping fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            dry_run: self.dry_run.then_some(true),
            base_url: self.base_url,
            username: self.username,
            password: self.password,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let conf_config = require_confluence_config(&config, &output)?;
        let mappings = config.require_mappings()?;

        let client = create_confluence_client(conf_config, &output)?;

        if config.publish.dry_run {
            output.highlight("[DRY RUN] No changes will be made.");
        }
        output.info(&format!(
            "Publishing {} mapping(s) to {}",
            mappings.len(),
            conf_config.base_url
        ));

        let report = Publisher::new(&client, &config.publish).publish(mappings);
        print_report(&output, &report, config.publish.dry_run);

        if report.is_success() {
            Ok(())
        } else {
            Err(CliError::Publish {
                failed: report.failed(),
                total: report.mappings.len(),
            })
        }
    }
}

fn require_confluence_config<'a>(
    config: &'a Config,
    output: &Output,
) -> Result<&'a ConfluenceConfig, CliError> {
    if config.confluence.is_none() {
        output.error("Error: confluence configuration required in wikipub.toml");
        output.info("\nAdd the following to your wikipub.toml:");
        output.info("\n[confluence]");
        output.info(r#"base_url = "https://example.atlassian.net/wiki""#);
        output.info(r#"username = "${CONFLUENCE_USER}""#);
        output.info(r#"password = "${CONFLUENCE_TOKEN}""#);
    }
    Ok(config.require_confluence()?)
}

fn create_confluence_client(
    conf_config: &ConfluenceConfig,
    output: &Output,
) -> Result<ConfluenceClient, CliError> {
    let client = ConfluenceClient::new(&conf_config.base_url)?;
    match conf_config.resolve_credentials()? {
        Some(credentials) => {
            Ok(client.with_basic_auth(&credentials.username, &credentials.password))
        }
        None => {
            tracing::warn!(
                base_url = %conf_config.base_url,
                "No credentials found, sending anonymous requests"
            );
            output.warning("No credentials configured; requests will be anonymous.");
            Ok(client)
        }
    }
}

fn print_report(output: &Output, report: &PublishReport, dry_run: bool) {
    output.rule();
    for mapping in &report.mappings {
        match &mapping.outcome {
            Ok(stats) => {
                output.success(&format!("{}: ok", mapping.space_key));
                output.info(&format!(
                    "  pages: {} created, {} reused, {} updated",
                    stats.pages_created, stats.pages_reused, stats.pages_updated
                ));
                output.info(&format!(
                    "  attachments: {} uploaded, {} failed",
                    stats.attachments_uploaded, stats.attachments_failed
                ));
                if stats.attachments_failed > 0 {
                    output.warning("  some attachments could not be uploaded, see log");
                }
            }
            Err(reason) => {
                output.error(&format!("{}: failed", mapping.space_key));
                output.info(&format!("  {reason}"));
            }
        }
    }
    output.rule();

    if dry_run {
        output.highlight("[DRY RUN] Counts above describe the changes that would be made.");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_non_http_base_url_fails_before_publishing() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("wikipub.toml");
        fs::write(
            &config,
            r#"
[confluence]
base_url = "https://wiki.example.com"

[[mappings]]
space_key = "DOCS"
path = "site"
"#,
        )
        .unwrap();
        let args = PublishArgs {
            config: Some(config),
            dry_run: true,
            base_url: Some("ftp://wiki.example.com".to_owned()),
            username: None,
            password: None,
        };

        let err = args.execute().unwrap_err();
        assert!(matches!(err, CliError::Config(_)), "{err}");
        assert!(err.to_string().contains("confluence.base_url"));
    }

    #[test]
    fn test_missing_confluence_section_is_rejected() {
        let config = Config::default();

        let err = require_confluence_config(&config, &Output::new()).unwrap_err();
        assert!(err.to_string().contains("[confluence]"));
    }
}
