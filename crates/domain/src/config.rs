//! Environment-driven configuration for the Chef wire client.

use std::env;

use thiserror::Error;
use tracing::debug;

/// Default path queried on the Chef server when the API version has to be
/// discovered over the network.
pub const DEFAULT_VERSION_PATH: &str = "/version";

/// Connection settings shared by everything that talks to a Chef server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    server_url: String,
    api_version: Option<String>,
    version_path: String,
}

impl ClientConfig {
    /// Loads configuration by hydrating `.env` (if present) and reading the
    /// process variables. Missing or malformed entries surface as
    /// `ConfigError`.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        let config = Self {
            server_url: get_required_var("CHEF_SERVER_URL")?,
            api_version: get_optional_var("CHEF_API_VERSION"),
            version_path: get_optional_var("CHEF_VERSION_PATH")
                .unwrap_or_else(|| DEFAULT_VERSION_PATH.to_string()),
        };
        debug!(
            server_url = %config.server_url,
            api_version = ?config.api_version,
            "loaded client configuration"
        );
        Ok(config)
    }

    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_version: None,
            version_path: DEFAULT_VERSION_PATH.to_string(),
        }
    }

    /// Pins the server API version instead of discovering it at runtime.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn with_version_path(mut self, version_path: impl Into<String>) -> Self {
        self.version_path = version_path.into();
        self
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    pub fn version_path(&self) -> &str {
        &self.version_path
    }

    /// Absolute URL of the version endpoint.
    pub fn version_url(&self) -> String {
        let base = self.server_url.trim_end_matches('/');
        let path = self.version_path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

fn get_required_var(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(ConfigError::MissingVar { key })
            } else {
                Ok(trimmed.to_string())
            }
        }
        Err(_) => Err(ConfigError::MissingVar { key }),
    }
}

fn get_optional_var(key: &'static str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub fn hydrate_env_file() -> Result<(), ConfigError> {
    if env::var_os("CHEF_WIRE_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "hydrated environment from .env"),
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Dotenv { source: err }),
    }

    Ok(())
}

/// Errors emitted when `.env` hydration or environment parsing fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{key}`")]
    MissingVar { key: &'static str },
    #[error("failed to load .env file: {source}")]
    Dotenv {
        #[from]
        source: dotenvy::Error,
    },
}
