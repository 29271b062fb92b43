//! Cart engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required (remote authority)
//! - `CART_API_BASE_URL` - Base URL of the cart REST API
//! - `CART_API_TOKEN` - Bearer credential sent on every gateway call
//!
//! ## Optional
//! - `CART_API_TIMEOUT_MS` - Gateway request timeout in milliseconds
//!   (default: 10000); on expiry the call behaves like a network failure
//! - `CART_STORAGE_DIR` - Directory for local cart/wishlist records
//!   (default: `.opaline`)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_STORAGE_DIR: &str = ".opaline";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),
    /// An environment variable has an unusable value.
    #[error("invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart REST API configuration.
///
/// Implements `Debug` manually to redact the bearer credential.
#[derive(Clone)]
pub struct CartApiConfig {
    /// Base URL of the cart API (e.g., `https://api.opaline.example`).
    pub base_url: Url,
    /// Bearer credential carried on every gateway call.
    pub bearer_token: SecretString,
    /// Per-request timeout; expiry maps to a network-unavailable error.
    pub timeout: Duration,
}

impl std::fmt::Debug for CartApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("bearer_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CartApiConfig {
    /// Load the API configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = required("CART_API_BASE_URL")?;
        let base_url = Url::parse(&base_url).map_err(|err| {
            ConfigError::InvalidEnvVar("CART_API_BASE_URL".to_string(), err.to_string())
        })?;

        let bearer_token = SecretString::from(required("CART_API_TOKEN")?);

        let timeout_ms = match std::env::var("CART_API_TIMEOUT_MS") {
            Ok(raw) => raw.parse::<u64>().map_err(|err| {
                ConfigError::InvalidEnvVar("CART_API_TIMEOUT_MS".to_string(), err.to_string())
            })?,
            Err(_) => DEFAULT_TIMEOUT_MS,
        };

        Ok(Self {
            base_url,
            bearer_token,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

/// Local persistence configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding the namespaced cart/wishlist records.
    pub dir: PathBuf,
}

impl StorageConfig {
    /// Load the storage configuration from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let dir = std::env::var("CART_STORAGE_DIR")
            .map_or_else(|_| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);
        Self { dir }
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let config = CartApiConfig {
            base_url: Url::parse("https://api.opaline.example").expect("valid url"),
            bearer_token: SecretString::from("super-secret"),
            timeout: Duration::from_secs(10),
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("super-secret"));
    }
}
