use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Environment variables read by [`ClientConfig::from_env`]
pub const ENV_URL: &str = "MARKLOGIC_URL";
pub const ENV_USERNAME: &str = "MARKLOGIC_USERNAME";
pub const ENV_PASSWORD: &str = "MARKLOGIC_PASSWORD";
pub const ENV_API_VERSION: &str = "MARKLOGIC_API_VERSION";
pub const ENV_TIMEOUT_SECS: &str = "MARKLOGIC_TIMEOUT_SECS";

/// Version segment that tells the server to use its newest REST API
pub const LATEST_API_VERSION: &str = "LATEST";

/// Connection settings for a MarkLogic REST endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    pub url: String,
    pub username: String,
    pub password: String,

    /// REST API version segment, e.g. "v1" or "LATEST"
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Whole-request timeout; unset leaves the transport default (none)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub insecure_skip_verify: bool,
}

fn default_api_version() -> String {
    LATEST_API_VERSION.to_string()
}

impl ClientConfig {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            api_version: default_api_version(),
            timeout_secs: None,
            insecure_skip_verify: false,
        }
    }

    /// Load settings from a JSON file
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        let config: ClientConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path))?;
        Ok(config)
    }

    /// Load settings from `MARKLOGIC_*` environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads through `lookup`
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).with_context(|| format!("Environment variable {} is not set", key))
        };

        let mut config = Self::new(
            required(ENV_URL)?,
            required(ENV_USERNAME)?,
            required(ENV_PASSWORD)?,
        );

        if let Some(version) = lookup(ENV_API_VERSION).filter(|v| !v.is_empty()) {
            config.api_version = version;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS).filter(|v| !v.is_empty()) {
            let secs = raw
                .parse::<u64>()
                .with_context(|| format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))?;
            config.timeout_secs = Some(secs);
        }

        Ok(config)
    }
}
