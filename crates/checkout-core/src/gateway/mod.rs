//! Payment Gateway Integration
//!
//! Abstraction over the external payment gateway (initialize + verify).
//! Implement [`PaymentGateway`] for each provider; the lifecycle manager
//! only sees this trait.

mod mock;

pub use mock::{MockGateway, MockOutcome};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::TxRef;

/// Outbound initialize request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InitializeRequest {
    /// Amount in the settlement currency (must equal the session amount)
    pub amount: Decimal,
    pub currency: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub tx_ref: TxRef,
    /// Server-to-server notification URL
    pub callback_url: String,
    /// Browser redirect target after checkout
    pub return_url: String,
}

/// Successful initialize response
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayRedirect {
    /// Hosted checkout page the buyer is redirected to
    pub checkout_url: String,

    /// Raw status string from the gateway body
    pub gateway_status: String,
}

/// Verify response
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyOutcome {
    /// Whether the gateway confirms the transaction completed
    pub verified: bool,

    /// Raw gateway payload, kept for logging and diagnosis only
    pub raw: serde_json::Value,
}

/// Payment gateway trait
///
/// Both calls have a bounded timeout; a timeout surfaces as
/// `GatewayTransport` so the attempted transition can be abandoned safely.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Initialize a hosted checkout transaction
    ///
    /// A non-success status in the response body is a
    /// `GatewayBusiness` failure even when the transport call succeeded.
    async fn initialize(&self, request: &InitializeRequest) -> Result<GatewayRedirect>;

    /// Query the gateway for the status of a previously initialized
    /// transaction
    async fn verify(&self, tx_ref: &TxRef) -> Result<VerifyOutcome>;

    /// Gateway name (for logs)
    fn name(&self) -> &str;
}
