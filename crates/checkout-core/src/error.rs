//! Checkout Error Types

use thiserror::Error;

/// Result type alias for checkout operations
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Checkout-related errors
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Missing or malformed user input (plan, amount, email, session id)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Unknown session id or transaction reference
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Network failure, timeout, or non-2xx response from the gateway
    #[error("Gateway transport error: {0}")]
    GatewayTransport(String),

    /// Transport succeeded but the gateway body reports failure
    #[error("Gateway rejected the request: {0}")]
    GatewayBusiness(String),

    /// Pay attempted on a session already in a terminal state
    #[error("Session {0} is already finalized")]
    AlreadyFinalized(String),

    /// Receipt requested before the session was verified
    #[error("Session {0} is not settled")]
    NotSettled(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CheckoutError {
    /// Check if the failed operation is safe for the buyer to retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::GatewayTransport(_) | CheckoutError::Storage(_)
        )
    }

    /// Get a user-friendly message (never the raw gateway payload)
    pub fn user_message(&self) -> &str {
        match self {
            CheckoutError::Validation(_) => "Please check your plan selection and try again.",
            CheckoutError::SessionNotFound(_) => "We couldn't find your checkout session. Please select a plan again.",
            CheckoutError::GatewayTransport(_) | CheckoutError::GatewayBusiness(_) => {
                "Payment processing failed. Please try again."
            }
            CheckoutError::AlreadyFinalized(_) => "This payment has already been completed.",
            CheckoutError::NotSettled(_) => "No receipt is available for this session yet.",
            CheckoutError::Config(_) => "Service configuration error.",
            CheckoutError::Storage(_) => "An error occurred processing your request.",
        }
    }
}
