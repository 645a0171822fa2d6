//! Configuration file support for tubeplate.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `TUBEPLATE_`)
//! 3. Local config file (./tubeplate.toml)
//! 4. XDG config file (~/.config/tubeplate/config.toml)
//! 5. Built-in defaults
//!
//! Nested keys use a double underscore in the environment
//! (`TUBEPLATE_SYNC__BATCH_SIZE` sets `sync.batch_size`). The secrets also
//! accept the flat spellings `TUBEPLATE_DATABASE_URL`,
//! `TUBEPLATE_GOOGLE_CLIENT_ID`, `TUBEPLATE_GOOGLE_CLIENT_SECRET`, and
//! `TUBEPLATE_CRYPTO_KEY`.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/tubeplate/tubeplate.db?mode=rwc"  # optional, this is the default
//!
//! [google]
//! client_id = "1234.apps.googleusercontent.com"
//! client_secret = "..."  # or use TUBEPLATE_GOOGLE_CLIENT_SECRET
//!
//! [crypto]
//! key = "base64 of 32 random bytes"  # `tubeplate keygen` prints one
//!
//! [sync]
//! interval_secs = 3600
//! lease_secs = 1800
//! batch_size = 10
//! concurrency = 5
//! requests_per_second = 10
//! max_retries = 5
//! ```

use std::path::PathBuf;

use config::builder::DefaultState;
use config::{
    Config as ConfigBuilder, ConfigBuilder as Builder, ConfigError, Environment, File, FileFormat,
};
use directories::ProjectDirs;
use serde::Deserialize;
use tubeplate::platform::YOUTUBE_DEFAULT_RPS;
use tubeplate::sync::{DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY, DEFAULT_LEASE_SECS};

/// Flat environment variables and the keys they set.
const ENV_ALIASES: [(&str, &str); 4] = [
    ("TUBEPLATE_DATABASE_URL", "database.url"),
    ("TUBEPLATE_GOOGLE_CLIENT_ID", "google.client_id"),
    ("TUBEPLATE_GOOGLE_CLIENT_SECRET", "google.client_secret"),
    ("TUBEPLATE_CRYPTO_KEY", "crypto.key"),
];

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub google: GoogleConfig,
    pub crypto: CryptoConfig,
    pub sync: SyncConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

/// Google OAuth client and API endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Override for the OAuth token endpoint.
    pub token_url: Option<String>,
    /// Override for the YouTube Data API base URL.
    pub api_base: Option<String>,
}

/// Credential encryption.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Base64-encoded 32-byte AES-256-GCM key.
    pub key: Option<String>,
}

/// Sync scheduling and pacing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between `sync-all --daemon` passes.
    pub interval_secs: u64,
    /// Seconds a sync lease is honored.
    pub lease_secs: i64,
    pub batch_size: usize,
    pub concurrency: usize,
    /// YouTube API pacing.
    pub requests_per_second: u32,
    /// Retries for a transient job step.
    pub max_retries: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            lease_secs: DEFAULT_LEASE_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            requests_per_second: YOUTUBE_DEFAULT_RPS,
            max_retries: tubeplate::retry::MAX_RETRIES,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// A file that fails to parse is logged and ignored in favor of defaults.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("tubeplate.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./tubeplate.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("TUBEPLATE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        match apply_env_aliases(builder, |name| std::env::var(name).ok()).and_then(|b| b.build()) {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config.with_valid_lease(),
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Replace a non-positive `sync.lease_secs`, which would hand out leases
    /// that are already expired.
    fn with_valid_lease(mut self) -> Self {
        if self.sync.lease_secs <= 0 {
            tracing::warn!(
                lease_secs = self.sync.lease_secs,
                "sync.lease_secs must be positive; using {}",
                DEFAULT_LEASE_SECS
            );
            self.sync.lease_secs = DEFAULT_LEASE_SECS;
        }
        self
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter creates the SQLite file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("tubeplate.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tubeplate").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/tubeplate` or `~/.local/state/tubeplate`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tubeplate").map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

fn apply_env_aliases(
    mut builder: Builder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Builder<DefaultState>, ConfigError> {
    for (name, key) in ENV_ALIASES {
        if let Some(value) = lookup(name) {
            builder = builder.set_override(key, value)?;
        }
    }
    Ok(builder)
}
