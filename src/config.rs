//! Environment-driven configuration.
//!
//! All secrets, paths, and URLs are read once at process start into a single
//! [`Config`] passed to the components that need it. Nothing reads the
//! environment after startup.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while assembling the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// A variable is set but unusable (e.g. a non-numeric port).
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, assembled once from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port.
    pub port: u16,
    /// Root directory for the ledger, click log, trigger artifacts, and the
    /// subscriber list.
    pub data_dir: PathBuf,
    /// Provider API secret for session creation.
    pub stripe_secret_key: String,
    /// Shared secret the provider signs webhook payloads with.
    pub webhook_secret: String,
    /// Provider price id for the flame tier.
    pub price_flame: String,
    /// Provider price id for the inferno tier.
    pub price_inferno: String,
    /// Provider API base URL. Overridable for test harnesses.
    pub stripe_api_base: String,
    /// Front-end base URL for checkout success/cancel destinations.
    pub client_url: String,
    /// Safe destination when a redirect cannot be resolved.
    pub fallback_url: String,
    /// Bound on the ledger read during a redirect.
    pub redirect_timeout: Duration,
}

impl Config {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let port = match lookup("PORT") {
            None => 5000,
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
        };
        let redirect_timeout = match lookup("REDIRECT_TIMEOUT_MS") {
            None => Duration::from_millis(1500),
            Some(raw) => Duration::from_millis(raw.parse().map_err(|_| ConfigError::Invalid {
                name: "REDIRECT_TIMEOUT_MS",
                value: raw,
            })?),
        };

        Ok(Config {
            port,
            data_dir: PathBuf::from(required("DATA_DIR")?),
            stripe_secret_key: required("STRIPE_SECRET_KEY")?,
            webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
            price_flame: required("STRIPE_PRICE_FLAME")?,
            price_inferno: required("STRIPE_PRICE_INFERNO")?,
            stripe_api_base: lookup("STRIPE_API_BASE")
                .unwrap_or_else(|| "https://api.stripe.com".to_string()),
            client_url: lookup("CLIENT_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            fallback_url: required("FALLBACK_URL")?,
            redirect_timeout,
        })
    }

    /// Directory holding the versioned ledger document.
    pub fn ledger_dir(&self) -> PathBuf {
        self.data_dir.join("ledger")
    }

    /// Path of the append-only click log.
    pub fn clicks_path(&self) -> PathBuf {
        self.data_dir.join("clicks.log")
    }

    /// Directory the blast worker watches for trigger artifacts.
    pub fn triggers_dir(&self) -> PathBuf {
        self.data_dir.join("triggers")
    }

    /// Directory holding the versioned subscriber list.
    pub fn subscribers_dir(&self) -> PathBuf {
        self.data_dir.join("subscribers")
    }
}
