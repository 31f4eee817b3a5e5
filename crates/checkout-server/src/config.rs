//! Server Configuration

use checkout_core::{CheckoutError, LifecycleOptions, Result, ReturnUrls};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4400";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:4400";
const DEFAULT_CURRENCY: &str = "ETB";
const DEFAULT_EMAIL: &str = "ato@ekele.com";
const DEFAULT_FIRST_NAME: &str = "Ato";
const DEFAULT_LAST_NAME: &str = "Ekele";

/// Server configuration, supplied via environment variables
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,

    /// Externally reachable base URL; callback and return URLs are built
    /// from it
    pub public_base_url: String,

    /// Settlement currency
    pub currency: String,

    /// Whether plan selection must carry a customer email
    pub require_customer_email: bool,

    pub default_email: String,
    pub default_first_name: String,
    pub default_last_name: String,
}

impl ServerConfig {
    /// Read configuration from the environment
    pub fn from_env() -> Result<Self> {
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into());
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.into())
            .trim()
            .trim_end_matches('/')
            .to_string();

        if public_base_url.is_empty() {
            return Err(CheckoutError::Config("PUBLIC_BASE_URL is empty".into()));
        }

        Ok(Self {
            bind_addr,
            public_base_url,
            currency: std::env::var("CHECKOUT_CURRENCY")
                .unwrap_or_else(|_| DEFAULT_CURRENCY.into()),
            require_customer_email: std::env::var("REQUIRE_CUSTOMER_EMAIL")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            default_email: std::env::var("DEFAULT_CUSTOMER_EMAIL")
                .unwrap_or_else(|_| DEFAULT_EMAIL.into()),
            default_first_name: std::env::var("DEFAULT_FIRST_NAME")
                .unwrap_or_else(|_| DEFAULT_FIRST_NAME.into()),
            default_last_name: std::env::var("DEFAULT_LAST_NAME")
                .unwrap_or_else(|_| DEFAULT_LAST_NAME.into()),
        })
    }

    /// Lifecycle options derived from this configuration
    pub fn lifecycle_options(&self) -> LifecycleOptions {
        LifecycleOptions {
            currency: self.currency.clone(),
            require_customer_email: self.require_customer_email,
            default_email: self.default_email.clone(),
            default_first_name: self.default_first_name.clone(),
            default_last_name: self.default_last_name.clone(),
        }
    }

    /// Callback/return URL bases handed to the lifecycle for each payment
    pub fn return_urls(&self) -> ReturnUrls {
        ReturnUrls {
            callback_url: format!("{}/api/verify-payment", self.public_base_url),
            return_url: format!("{}/api/payment-success", self.public_base_url),
        }
    }
}
