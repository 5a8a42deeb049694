//! Connection settings for a Shlink instance.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{Result, ShlinkError};

pub const DEFAULT_API_VERSION: u8 = 3;

/// Where the server lives and how to authenticate against it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShlinkConfig {
    base_url: String,
    api_key: String,
    #[serde(default = "default_api_version", rename = "version")]
    api_version: u8,
    #[serde(default, rename = "timeoutSecs", deserialize_with = "deserialize_timeout")]
    timeout: Option<Duration>,
}

fn default_api_version() -> u8 {
    DEFAULT_API_VERSION
}

fn deserialize_timeout<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
}

impl ShlinkConfig {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            api_version: DEFAULT_API_VERSION,
            timeout: None,
        }
        .validated()
    }

    /// Read `SHLINK_BASE_URL` and `SHLINK_API_KEY`, plus the optional
    /// `SHLINK_API_VERSION` and `SHLINK_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let base_url = required_var("SHLINK_BASE_URL")?;
        let api_key = required_var("SHLINK_API_KEY")?;
        let mut config = Self::new(&base_url, &api_key)?;

        if let Ok(version) = std::env::var("SHLINK_API_VERSION") {
            config.api_version = version
                .parse()
                .map_err(|_| ShlinkError::Config(format!("SHLINK_API_VERSION is not a number: {version}")))?;
        }
        if let Ok(secs) = std::env::var("SHLINK_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| ShlinkError::Config(format!("SHLINK_TIMEOUT_SECS is not a number: {secs}")))?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Parse `{"baseUrl": .., "apiKey": .., "version": .., "timeoutSecs": ..}`.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ShlinkError::Config(e.to_string()))?;
        config.validated()
    }

    pub fn with_api_version(mut self, api_version: u8) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_version(&self) -> u8 {
        self.api_version
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn validated(mut self) -> Result<Self> {
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        let url = Url::parse(&self.base_url)
            .map_err(|e| ShlinkError::Config(format!("invalid base URL {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ShlinkError::Config(format!(
                "base URL must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(ShlinkError::Config("API key must not be empty".to_string()));
        }
        Ok(self)
    }
}

// The API key is never printed.
impl fmt::Debug for ShlinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShlinkConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| ShlinkError::Config(format!("{name} is not set")))
}
