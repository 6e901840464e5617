use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

/// File consulted by [`Configuration::load`] when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "actiondash.toml";

/// Prefix for environment overrides, e.g. `ACTIONDASH__FETCH__TIMEOUT=5s`.
pub const ENV_PREFIX: &str = "ACTIONDASH__";

/// Session date every panel starts on unless configured otherwise.
pub fn default_session_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 26).unwrap_or_default()
}

/// Location of the actions backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:8080/api"),
        }
    }
}

/// Timeout and retry policy applied to every backend call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Upper bound for a single attempt
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub initial_backoff: Duration,
    /// Ceiling for any single retry delay
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
    /// Growth factor applied to the delay after every failed attempt
    pub backoff_multiplier: f64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            backoff_multiplier: 2.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Date seeded into every new filter composer
    pub default_date: NaiveDate,
    /// Allow the lossy description-hash fallback for action details
    pub degraded_detail: bool,
    /// Accepted |support + neutral + oppose - 1| before a drift warning is logged
    pub agreement_tolerance: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_date: default_session_date(),
            degraded_detail: false,
            agreement_tolerance: 0.01,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    /// Backend location
    pub api: ApiConfig,
    /// Timeout/retry policy
    pub fetch: FetchConfig,
    /// Panel and detail-view behaviour
    pub dashboard: DashboardConfig,
}

impl Configuration {
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::figment(Toml::file(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Box<figment::Error>> {
        Self::figment(Toml::file(path))
    }

    fn figment(file: figment::providers::Data<Toml>) -> Result<Self, Box<figment::Error>> {
        Figment::from(Serialized::defaults(Configuration::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_configuration() {
        let config = Configuration::default();

        assert_eq!(config.api.base_url, "http://localhost:8080/api");
        assert_eq!(config.fetch.timeout, Duration::from_secs(10));
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.fetch.initial_backoff, Duration::from_millis(250));
        assert_eq!(config.fetch.max_backoff, Duration::from_secs(2));
        assert_eq!(config.fetch.backoff_multiplier, 2.0);
        assert_eq!(config.dashboard.default_date.to_string(), "2025-07-26");
        assert!(!config.dashboard.degraded_detail);
    }

    #[test]
    fn test_configless_operation() {
        Jail::expect_with(|_jail| {
            let config = Configuration::load().map_err(|e| *e)?;
            assert_eq!(config.api.base_url, "http://localhost:8080/api");
            assert_eq!(config.fetch.max_attempts, 3);
            Ok(())
        });
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                [api]
                base_url = "http://dashboard.internal:9000/api"

                [fetch]
                timeout = "3s"
                initial_backoff = "50ms"

                [dashboard]
                default_date = "2025-08-01"
                degraded_detail = true
                "#,
            )?;

            let config = Configuration::load().map_err(|e| *e)?;
            assert_eq!(config.api.base_url, "http://dashboard.internal:9000/api");
            assert_eq!(config.fetch.timeout, Duration::from_secs(3));
            assert_eq!(config.fetch.initial_backoff, Duration::from_millis(50));
            // Untouched keys keep their defaults
            assert_eq!(config.fetch.max_attempts, 3);
            assert_eq!(config.dashboard.default_date.to_string(), "2025-08-01");
            assert!(config.dashboard.degraded_detail);
            Ok(())
        });
    }

    #[test]
    fn test_env_var_override() {
        Jail::expect_with(|jail| {
            jail.set_env("ACTIONDASH__FETCH__MAX_ATTEMPTS", "5");
            jail.set_env("ACTIONDASH__FETCH__TIMEOUT", "500ms");
            jail.set_env("ACTIONDASH__API__BASE_URL", "http://127.0.0.1:8081/api");

            let config = Configuration::load().map_err(|e| *e)?;
            assert_eq!(config.fetch.max_attempts, 5);
            assert_eq!(config.fetch.timeout, Duration::from_millis(500));
            assert_eq!(config.api.base_url, "http://127.0.0.1:8081/api");
            Ok(())
        });
    }

    #[test]
    fn test_load_from_explicit_path() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[dashboard]\nagreement_tolerance = 0.05\n")?;

            let config =
                Configuration::load_from_path(Path::new("custom.toml")).map_err(|e| *e)?;
            assert_eq!(config.dashboard.agreement_tolerance, 0.05);
            Ok(())
        });
    }
}
