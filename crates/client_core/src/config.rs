use ::config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const CONFIG_FILE_STEM: &str = "board";
pub const ENV_PREFIX: &str = "BOARD";

/// Connection settings for the hosted candidate store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub store_url: Url,
    pub access_key: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("store url {url:?} is not an absolute URL: {source}")]
    InvalidStoreUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to read client configuration: {0}")]
    Source(#[from] ::config::ConfigError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawClientConfig {
    store_url: Option<String>,
    access_key: Option<String>,
}

impl ClientConfig {
    /// Reads `board.toml` (optional) from the working directory, then the
    /// `BOARD_STORE_URL` and `BOARD_ACCESS_KEY` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let source = Config::builder()
            .add_source(File::with_name(CONFIG_FILE_STEM).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;
        Self::from_source(&source)
    }

    pub fn from_source(source: &Config) -> Result<Self, ConfigError> {
        let raw: RawClientConfig = source.clone().try_deserialize()?;
        Self::from_values(raw.store_url, raw.access_key)
    }

    pub fn from_values(
        store_url: Option<String>,
        access_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let store_url = non_blank(store_url).ok_or(ConfigError::Missing("BOARD_STORE_URL"))?;
        let access_key = non_blank(access_key).ok_or(ConfigError::Missing("BOARD_ACCESS_KEY"))?;
        let parsed = Url::parse(&store_url).map_err(|source| ConfigError::InvalidStoreUrl {
            url: store_url.clone(),
            source,
        })?;
        Ok(Self {
            store_url: parsed,
            access_key,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
