//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use ts_core::{CategoryConfig, ConfigError, MeasurementConfig};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Calendar to read events from.
    pub calendar_id: String,
    /// Lower bound on event times.
    pub time_min: DateTime<Utc>,
    /// Cached OAuth token set written by the authorization flow.
    pub token_path: PathBuf,
    /// OAuth client secret file, used to renew expired tokens.
    pub credentials_path: PathBuf,
    /// Access token override, takes precedence over `token_path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Category priority list, exclusion and fallback rules.
    #[serde(default)]
    pub categories: CategoryConfig,
    /// Measurement window constants.
    #[serde(default)]
    pub measurement: MeasurementConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("calendar_id", &self.calendar_id)
            .field("time_min", &self.time_min)
            .field("token_path", &self.token_path)
            .field("credentials_path", &self.credentials_path)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("categories", &self.categories)
            .field("measurement", &self.measurement)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs_config_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            calendar_id: "primary".to_string(),
            time_min: default_time_min(),
            token_path: config_dir.join("token.json"),
            credentials_path: config_dir.join("credentials.json"),
            access_token: None,
            categories: CategoryConfig::default(),
            measurement: MeasurementConfig::default(),
        }
    }
}

/// Start of the measured period, 2019-04-01.
fn default_time_min() -> DateTime<Utc> {
    Utc.timestamp_opt(1_554_076_800, 0)
        .single()
        .unwrap_or_default()
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TIMESPLIT_*, nested keys split on "__")
        figment = figment.merge(Env::prefixed("TIMESPLIT_").split("__"));

        figment.extract()
    }

    /// Checks the category rules and measurement constants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.categories.validate()?;
        self.measurement.validate()
    }
}

/// Returns the platform-specific config directory for timesplit.
///
/// On Linux: `~/.config/timesplit`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("timesplit"))
}
