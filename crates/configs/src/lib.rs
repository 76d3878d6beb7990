//! # configs
//!
//! Client settings, layered as: built-in defaults, then an optional config
//! file, then `BOBA_`-prefixed environment variables (a `.env` file is read
//! into the environment first).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;
use url::Url;

pub const ENV_PREFIX: &str = "BOBA";
pub const DEFAULT_CONFIG_FILE: &str = "boba.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid url in `{key}`: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("`request_timeout_secs` must be greater than zero")]
    ZeroTimeout,
}

#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    /// Root of the backend API, e.g. `https://backend.boba.social/`.
    pub backend_url: String,
    /// Origin that shared thread links are built on.
    pub public_origin: String,
    /// Sent as the `Authorization` header. Without it the client runs logged out.
    #[serde(default)]
    pub auth_token: Option<SecretString>,
    /// Where the board list snapshot is kept between runs.
    pub snapshot_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub rollback_on_failure: bool,
    pub log_filter: String,
}

impl ClientConfig {
    /// Reads `.env`, then `boba.toml` if present, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::from_sources(Some(Path::new(DEFAULT_CONFIG_FILE)), ENV_PREFIX)
    }

    /// `file` is optional: a missing file leaves the defaults in place.
    pub fn from_sources(file: Option<&Path>, env_prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("backend_url", "http://localhost:4200/")?
            .set_default("public_origin", "http://localhost:3000/")?
            .set_default("snapshot_dir", "./data/snapshots")?
            .set_default("request_timeout_secs", 30)?
            .set_default("rollback_on_failure", false)?
            .set_default("log_filter", "info")?;
        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(false));
        }
        let config: ClientConfig = builder
            .add_source(Environment::with_prefix(env_prefix).try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.backend_url()?;
        self.public_origin()?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn backend_url(&self) -> Result<Url, ConfigError> {
        parse_url("backend_url", &self.backend_url)
    }

    pub fn public_origin(&self) -> Result<Url, ConfigError> {
        parse_url("public_origin", &self.public_origin)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl { key, source })
}
