pub mod detail;
pub mod panels;
pub mod reference;
mod render;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use common::cli::{CommonArgs, CommonCommands, utils};
use dashboard::DashboardApi;

/// actiondash: compare political leaning and coverage of top actions
#[derive(Parser)]
#[command(name = "actiondash", version, about)]
pub struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Backend API base URL, overrides `api.base_url`
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one panel of top actions
    Actions(panels::ActionsArgs),
    /// Show two panels side by side
    Compare(panels::CompareArgs),
    /// List the publisher directory
    Publishers(reference::ListArgs),
    /// List the dates the backend has data for
    Dates(reference::ListArgs),
    /// Break an action down by publisher
    Detail(detail::DetailArgs),
    #[command(flatten)]
    Common(CommonCommands),
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned text
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        utils::init_logging(&self.common);

        let mut config = utils::load_config(self.common.config.as_ref())?;
        if let Some(base_url) = self.base_url {
            config.api.base_url = base_url;
        }

        if let Commands::Common(command) = &self.command {
            let version = utils::version_info(
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_RUST_VERSION"),
            );
            return utils::handle_common_command(command, &config, &version);
        }

        utils::validate_config(&config)?;
        let api = Arc::new(
            DashboardApi::from_config(&config).context("Failed to create backend client")?,
        );
        log::debug!("Using backend at {}", config.api.base_url);

        match self.command {
            Commands::Actions(args) => args.run(api, &config).await,
            Commands::Compare(args) => args.run(api, &config).await,
            Commands::Publishers(args) => reference::publishers(api, args).await,
            Commands::Dates(args) => reference::dates(api, args).await,
            Commands::Detail(args) => args.run(api, &config).await,
            Commands::Common(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "actiondash",
            "actions",
            "--date",
            "2025-08-01",
            "--group",
            "democrat",
            "--base-url",
            "http://example.test/api",
            "-v",
        ])
        .unwrap();

        assert!(cli.common.verbose);
        assert_eq!(cli.base_url.as_deref(), Some("http://example.test/api"));
        assert!(matches!(cli.command, Commands::Actions(_)));
    }

    #[test]
    fn common_commands_are_top_level() {
        let cli = Cli::try_parse_from(["actiondash", "config", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Common(CommonCommands::Config { json: true })
        ));
    }
}
