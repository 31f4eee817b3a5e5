//! # checkout-chapa
//!
//! Chapa gateway client for chapa-checkout.
//!
//! Implements [`checkout_core::PaymentGateway`] over Chapa's hosted checkout
//! API. The buyer is redirected to Chapa's checkout page and back; Chapa
//! then calls the configured callback URL with the transaction reference,
//! which triggers verification.
//!
//! Two failure layers are kept distinct: transport problems (network,
//! timeout, non-2xx) are retryable, while an HTTP 200 whose body reports a
//! non-success status indicates a request-shape or account problem.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_chapa::ChapaClient;
//!
//! let client = ChapaClient::from_env()?; // CHAPA_SECRET_KEY must be set
//! let redirect = client.initialize(&request).await?;
//! // Redirect the buyer to: redirect.checkout_url
//! ```

mod client;
mod config;

pub use client::ChapaClient;
pub use config::ChapaConfig;
