//! Chapa Configuration

use std::time::Duration;

use checkout_core::{CheckoutError, Result};

const DEFAULT_BASE_URL: &str = "https://api.chapa.co";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Chapa client
#[derive(Clone, Debug)]
pub struct ChapaConfig {
    /// Base API URL, without the `/v1/...` path
    pub base_url: String,

    /// Secret key used as the Bearer credential
    pub secret_key: String,

    /// Bounded timeout for every outbound call
    pub timeout: Duration,
}

impl ChapaConfig {
    /// Create a config, validating both values are non-empty
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        let secret_key = secret_key.into().trim().to_string();

        if base_url.is_empty() {
            return Err(CheckoutError::Config("gateway base URL is empty".into()));
        }
        if secret_key.is_empty() {
            return Err(CheckoutError::Config(
                "gateway secret key is empty".into(),
            ));
        }

        Ok(Self {
            base_url,
            secret_key,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Create from environment variables
    ///
    /// `CHAPA_SECRET_KEY` is required; a missing key is a startup-fatal
    /// condition, never a per-request error. `CHAPA_BASE_URL` and
    /// `CHAPA_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("CHAPA_SECRET_KEY")
            .map_err(|_| CheckoutError::Config("CHAPA_SECRET_KEY not set".into()))?;
        let base_url =
            std::env::var("CHAPA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let mut config = Self::new(base_url, secret_key)?;

        if let Ok(secs) = std::env::var("CHAPA_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                CheckoutError::Config(format!("invalid CHAPA_TIMEOUT_SECS: {secs}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_values() {
        assert!(ChapaConfig::new("", "sk_test").is_err());
        assert!(ChapaConfig::new("https://api.chapa.co", "  ").is_err());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = ChapaConfig::new("https://api.chapa.co/", "sk_test").unwrap();
        assert_eq!(config.base_url, "https://api.chapa.co");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
