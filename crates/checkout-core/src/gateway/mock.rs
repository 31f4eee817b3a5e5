//! Mock Payment Gateway
//!
//! For tests and demos. Outcomes can be scripted per call; with an empty
//! script every call succeeds.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use super::{GatewayRedirect, InitializeRequest, PaymentGateway, VerifyOutcome};
use crate::error::{CheckoutError, Result};
use crate::session::TxRef;

/// Scripted outcome for a single mock call
#[derive(Clone, Debug)]
pub enum MockOutcome {
    /// Initialize succeeds / verify confirms the transaction
    Succeed,

    /// Transport succeeded but the gateway body reports failure
    BusinessFailure(String),

    /// Network error, timeout, or non-2xx response
    TransportFailure(String),
}

/// Mock gateway with scripted outcomes and call counters
pub struct MockGateway {
    initialize_script: Mutex<VecDeque<MockOutcome>>,
    verify_script: Mutex<VecDeque<MockOutcome>>,
    initialize_calls: AtomicUsize,
    verify_calls: AtomicUsize,
    last_initialize: Mutex<Option<InitializeRequest>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            initialize_script: Mutex::new(VecDeque::new()),
            verify_script: Mutex::new(VecDeque::new()),
            initialize_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            last_initialize: Mutex::new(None),
        }
    }

    /// Queue an outcome for the next initialize call
    pub fn push_initialize(&self, outcome: MockOutcome) {
        self.initialize_script.lock().unwrap().push_back(outcome);
    }

    /// Queue an outcome for the next verify call
    pub fn push_verify(&self, outcome: MockOutcome) {
        self.verify_script.lock().unwrap().push_back(outcome);
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    /// The most recent initialize request, for asserting wire contents
    pub fn last_initialize(&self) -> Option<InitializeRequest> {
        self.last_initialize.lock().unwrap().clone()
    }

    fn next_outcome(script: &Mutex<VecDeque<MockOutcome>>) -> MockOutcome {
        script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(MockOutcome::Succeed)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn initialize(&self, request: &InitializeRequest) -> Result<GatewayRedirect> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_initialize.lock().unwrap() = Some(request.clone());

        match Self::next_outcome(&self.initialize_script) {
            MockOutcome::Succeed => Ok(GatewayRedirect {
                checkout_url: format!("https://checkout.mock.test/{}", request.tx_ref),
                gateway_status: "success".into(),
            }),
            MockOutcome::BusinessFailure(message) => Err(CheckoutError::GatewayBusiness(message)),
            MockOutcome::TransportFailure(message) => {
                Err(CheckoutError::GatewayTransport(message))
            }
        }
    }

    async fn verify(&self, tx_ref: &TxRef) -> Result<VerifyOutcome> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);

        match Self::next_outcome(&self.verify_script) {
            MockOutcome::Succeed => Ok(VerifyOutcome {
                verified: true,
                raw: json!({
                    "status": "success",
                    "data": { "tx_ref": tx_ref.as_str(), "status": "success" },
                }),
            }),
            MockOutcome::BusinessFailure(message) => Ok(VerifyOutcome {
                verified: false,
                raw: json!({
                    "status": "failed",
                    "message": message,
                    "data": { "tx_ref": tx_ref.as_str(), "status": "failed" },
                }),
            }),
            MockOutcome::TransportFailure(message) => {
                Err(CheckoutError::GatewayTransport(message))
            }
        }
    }

    fn name(&self) -> &str {
        "MockGateway"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> InitializeRequest {
        InitializeRequest {
            amount: dec!(100),
            currency: "ETB".into(),
            email: "ato@ekele.com".into(),
            first_name: "Ato".into(),
            last_name: "Ekele".into(),
            tx_ref: TxRef::from_string("tx-Pro-17-abc"),
            callback_url: "http://localhost:4400/api/verify-payment/tx-Pro-17-abc".into(),
            return_url: "http://localhost:4400/api/payment-success".into(),
        }
    }

    #[tokio::test]
    async fn test_defaults_to_success() {
        let gateway = MockGateway::new();

        let redirect = gateway.initialize(&request()).await.unwrap();
        assert!(redirect.checkout_url.contains("tx-Pro-17-abc"));

        let outcome = gateway.verify(&TxRef::from_string("tx-Pro-17-abc")).await.unwrap();
        assert!(outcome.verified);
        assert_eq!(gateway.initialize_calls(), 1);
        assert_eq!(gateway.verify_calls(), 1);
    }

    #[tokio::test]
    async fn test_scripted_outcomes_in_order() {
        let gateway = MockGateway::new();
        gateway.push_initialize(MockOutcome::TransportFailure("timed out".into()));
        gateway.push_initialize(MockOutcome::Succeed);

        let err = gateway.initialize(&request()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::GatewayTransport(_)));
        assert!(gateway.initialize(&request()).await.is_ok());
    }
}
