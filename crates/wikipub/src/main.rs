//! wikipub CLI - publish generated documentation sites to Confluence.
//!
//! Provides commands for:
//! - `publish`: Publish every configured mapping
//! - `tree`: Print the page tree of a site directory
//! - `render`: Print the storage markup of a single page

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{PublishArgs, RenderArgs, TreeArgs};
use output::Output;

/// wikipub - Confluence publisher for generated documentation.
#[derive(Parser)]
#[command(name = "wikipub", version, about)]
struct Cli {
    /// Enable info-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish all configured mappings to Confluence.
    Publish(PublishArgs),
    /// Print the page tree resolved from a site's navigation.
    Tree(TreeArgs),
    /// Print the Confluence markup produced for one page.
    Render(RenderArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Publish(args) => args.execute(),
        Commands::Tree(args) => args.execute(),
        Commands::Render(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["wikipub", "tree", "site", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Tree(_)));
    }

    #[test]
    fn test_render_requires_page() {
        assert!(Cli::try_parse_from(["wikipub", "render"]).is_err());
    }
}
