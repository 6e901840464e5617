use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Common CLI arguments shared across all binaries
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Enable quiet mode (minimal output)")]
    pub quiet: bool,
}

/// Common subcommands available for all binaries
#[derive(Subcommand, Debug, Clone)]
pub enum CommonCommands {
    /// Show current configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
    /// Validate configuration and exit
    Validate,
    /// Show version information and exit
    Version,
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::Configuration;
    use anyhow::{Context, Result};
    use tracing_subscriber::EnvFilter;

    /// Level used when `RUST_LOG` is not set.
    pub fn log_level(args: &CommonArgs) -> &'static str {
        if args.quiet {
            "warn"
        } else if args.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Initialize logging based on CLI arguments
    ///
    /// An explicit `RUST_LOG` takes precedence over `--verbose`/`--quiet`.
    /// Library crates log through the `log` facade, which the fmt subscriber
    /// picks up.
    pub fn init_logging(args: &CommonArgs) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_level(args)));

        if let Err(e) = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
        {
            eprintln!("logging already initialized: {e}");
        }
    }

    /// Load configuration with optional override from CLI
    pub fn load_config(config_path: Option<&PathBuf>) -> Result<Configuration> {
        match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Configuration::load_from_path(path).context("Failed to load configuration")
            }
            None => Configuration::load().context("Failed to load configuration"),
        }
    }

    /// Display configuration in human-readable or JSON format
    pub fn display_config(config: &Configuration, json: bool) -> Result<()> {
        if json {
            let json = serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration to JSON")?;
            println!("{json}");
        } else {
            println!("actiondash configuration:");
            println!("=========================");
            println!("API base URL: {}", config.api.base_url);
            println!("Fetch timeout: {:?}", config.fetch.timeout);
            println!("Fetch attempts: {}", config.fetch.max_attempts);
            println!(
                "Backoff: {:?} .. {:?} (x{})",
                config.fetch.initial_backoff,
                config.fetch.max_backoff,
                config.fetch.backoff_multiplier
            );
            println!("Default date: {}", config.dashboard.default_date);
            println!(
                "Degraded detail lookup: {}",
                if config.dashboard.degraded_detail {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            println!(
                "Agreement tolerance: {}",
                config.dashboard.agreement_tolerance
            );
        }
        Ok(())
    }

    /// Validate configuration and report any issues
    pub fn validate_config(config: &Configuration) -> Result<()> {
        log::debug!("Validating configuration...");

        if config.api.base_url.trim().is_empty() {
            anyhow::bail!("API base URL cannot be empty");
        }

        if config.fetch.max_attempts == 0 {
            anyhow::bail!("fetch.max_attempts must be at least 1");
        }

        if config.fetch.timeout.is_zero() {
            anyhow::bail!("fetch.timeout must be greater than zero");
        }

        let multiplier = config.fetch.backoff_multiplier;
        if multiplier.is_nan() || multiplier < 1.0 {
            anyhow::bail!("fetch.backoff_multiplier must be >= 1.0 (got {multiplier})");
        }

        if config.fetch.initial_backoff > config.fetch.max_backoff {
            anyhow::bail!("fetch.initial_backoff cannot exceed fetch.max_backoff");
        }

        let tolerance = config.dashboard.agreement_tolerance;
        if tolerance.is_nan() || tolerance < 0.0 {
            anyhow::bail!("dashboard.agreement_tolerance cannot be negative");
        }

        log::debug!("Configuration validation passed");
        Ok(())
    }

    /// Handle common CLI commands that don't talk to the backend
    ///
    /// `version` is the calling binary's [`version_info`] string.
    pub fn handle_common_command(
        command: &CommonCommands,
        config: &Configuration,
        version: &str,
    ) -> Result<()> {
        match command {
            CommonCommands::Config { json } => display_config(config, *json),
            CommonCommands::Validate => {
                validate_config(config)?;
                println!("Configuration is valid");
                Ok(())
            }
            CommonCommands::Version => {
                println!("{version}");
                Ok(())
            }
        }
    }

    /// Standard version information, fed from the binary's `env!` values
    pub fn version_info(name: &str, version: &str, rust_version: &str) -> String {
        format!("{name} {version} ({rust_version})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use std::time::Duration;

    #[test]
    fn test_log_level_flags() {
        let mut args = CommonArgs::default();
        assert_eq!(utils::log_level(&args), "info");

        args.verbose = true;
        assert_eq!(utils::log_level(&args), "debug");

        // quiet wins over verbose
        args.quiet = true;
        assert_eq!(utils::log_level(&args), "warn");
    }

    #[test]
    fn test_version_info() {
        let version = utils::version_info(
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_RUST_VERSION"),
        );
        assert!(version.starts_with("common "));
        assert!(version.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_default_configuration_is_valid() {
        assert!(utils::validate_config(&Configuration::default()).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Configuration::default();
        config.fetch.max_attempts = 0;
        let err = utils::validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn test_validate_rejects_inverted_backoff_bounds() {
        let mut config = Configuration::default();
        config.fetch.initial_backoff = Duration::from_secs(5);
        config.fetch.max_backoff = Duration::from_secs(1);
        assert!(utils::validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_shrinking_backoff() {
        let mut config = Configuration::default();
        config.fetch.backoff_multiplier = 0.5;
        assert!(utils::validate_config(&config).is_err());

        config.fetch.backoff_multiplier = f64::NAN;
        assert!(utils::validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_base_url() {
        let mut config = Configuration::default();
        config.api.base_url = "  ".to_string();
        assert!(utils::validate_config(&config).is_err());
    }
}
