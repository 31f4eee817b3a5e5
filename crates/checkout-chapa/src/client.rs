//! Chapa API Client
//!
//! Talks to Chapa's hosted checkout API: `POST /v1/transaction/initialize`
//! and `GET /v1/transaction/verify/{tx_ref}`. Chapa signals business
//! failures with HTTP 200 and a `status` field in the body, so both layers
//! are checked and mapped to distinct error kinds.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use checkout_core::{
    CheckoutError, GatewayRedirect, InitializeRequest, PaymentGateway, Result, TxRef,
    VerifyOutcome,
};

use crate::config::ChapaConfig;

const GATEWAY_SUCCESS: &str = "success";

/// Chapa gateway client
pub struct ChapaClient {
    http: reqwest::Client,
    config: ChapaConfig,
}

impl ChapaClient {
    /// Create a new client with the configured bounded timeout
    pub fn new(config: ChapaConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CheckoutError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ChapaConfig::from_env()?)
    }

    fn initialize_url(&self) -> String {
        format!("{}/v1/transaction/initialize", self.config.base_url)
    }

    fn verify_url(&self, tx_ref: &TxRef) -> String {
        format!("{}/v1/transaction/verify/{tx_ref}", self.config.base_url)
    }

    /// Execute a request and read the body, mapping both transport layers
    async fn read_envelope(&self, request: reqwest::RequestBuilder) -> Result<ChapaEnvelope> {
        let response = request
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::GatewayTransport(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            tracing::warn!(status = %status, body = %body, "Chapa returned non-2xx response");
            return Err(CheckoutError::GatewayTransport(format!("HTTP {status}")));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(body = %body, "Unparseable Chapa response");
            CheckoutError::GatewayTransport(format!("unparseable gateway response: {e}"))
        })
    }
}

#[async_trait]
impl PaymentGateway for ChapaClient {
    async fn initialize(&self, request: &InitializeRequest) -> Result<GatewayRedirect> {
        let payload = InitializePayload::from(request);

        tracing::debug!(
            tx_ref = %request.tx_ref,
            amount = %request.amount,
            currency = %request.currency,
            "Initializing Chapa transaction"
        );

        let envelope = self
            .read_envelope(self.http.post(self.initialize_url()).json(&payload))
            .await?;

        if envelope.status != GATEWAY_SUCCESS {
            return Err(CheckoutError::GatewayBusiness(envelope.failure_message()));
        }

        let checkout_url = envelope
            .data
            .as_ref()
            .and_then(|data| data.get("checkout_url"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                CheckoutError::GatewayBusiness("no checkout URL in gateway response".into())
            })?;

        Ok(GatewayRedirect {
            checkout_url: checkout_url.to_string(),
            gateway_status: envelope.status,
        })
    }

    async fn verify(&self, tx_ref: &TxRef) -> Result<VerifyOutcome> {
        tracing::debug!(tx_ref = %tx_ref, "Verifying Chapa transaction");

        let envelope = self
            .read_envelope(self.http.get(self.verify_url(tx_ref)))
            .await?;

        let verified = envelope.is_verified();
        let raw = serde_json::to_value(&envelope).unwrap_or(Value::Null);

        Ok(VerifyOutcome { verified, raw })
    }

    fn name(&self) -> &str {
        "Chapa"
    }
}

fn map_transport_error(err: reqwest::Error) -> CheckoutError {
    if err.is_timeout() {
        CheckoutError::GatewayTransport("gateway call timed out".into())
    } else {
        CheckoutError::GatewayTransport(err.to_string())
    }
}

/// Wire payload for `POST /v1/transaction/initialize`
///
/// Chapa expects the amount as a string.
#[derive(Debug, Serialize)]
struct InitializePayload {
    amount: String,
    currency: String,
    email: String,
    first_name: String,
    last_name: String,
    tx_ref: String,
    callback_url: String,
    return_url: String,
}

impl From<&InitializeRequest> for InitializePayload {
    fn from(request: &InitializeRequest) -> Self {
        Self {
            amount: request.amount.to_string(),
            currency: request.currency.clone(),
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            tx_ref: request.tx_ref.to_string(),
            callback_url: request.callback_url.clone(),
            return_url: request.return_url.clone(),
        }
    }
}

/// Chapa response envelope: `{status, message, data}`
#[derive(Debug, Serialize, Deserialize)]
struct ChapaEnvelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl ChapaEnvelope {
    fn failure_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("gateway status: {}", self.status))
    }

    /// A transaction counts as verified only when the envelope succeeded
    /// AND the transaction record itself reports success
    fn is_verified(&self) -> bool {
        self.status == GATEWAY_SUCCESS
            && self
                .data
                .as_ref()
                .and_then(|data| data.get("status"))
                .and_then(Value::as_str)
                .is_some_and(|s| s == GATEWAY_SUCCESS)
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

    #[test]
    fn test_initialize_payload_wire_shape() {
        let payload = InitializePayload::from(&request());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["amount"], "100");
        assert_eq!(json["currency"], "ETB");
        assert_eq!(json["email"], "ato@ekele.com");
        assert_eq!(json["first_name"], "Ato");
        assert_eq!(json["last_name"], "Ekele");
        assert_eq!(json["tx_ref"], "tx-Pro-17-abc");
        assert!(json["callback_url"].as_str().unwrap().ends_with("tx-Pro-17-abc"));
    }

    #[test]
    fn test_envelope_verified_needs_both_layers() {
        let verified: ChapaEnvelope = serde_json::from_str(
            r#"{"status":"success","message":"ok","data":{"status":"success","tx_ref":"tx-Pro-17-abc"}}"#,
        )
        .unwrap();
        assert!(verified.is_verified());

        let pending: ChapaEnvelope = serde_json::from_str(
            r#"{"status":"success","data":{"status":"pending"}}"#,
        )
        .unwrap();
        assert!(!pending.is_verified());

        let failed: ChapaEnvelope =
            serde_json::from_str(r#"{"status":"failed","message":"Invalid key"}"#).unwrap();
        assert!(!failed.is_verified());
        assert_eq!(failed.failure_message(), "Invalid key");
    }

    #[test]
    fn test_envelope_without_message() {
        let envelope: ChapaEnvelope = serde_json::from_str(r#"{"status":"failed"}"#).unwrap();
        assert_eq!(envelope.failure_message(), "gateway status: failed");
    }

    #[test]
    fn test_urls() {
        let client = ChapaClient::new(
            ChapaConfig::new("https://api.chapa.co", "sk_test").unwrap(),
        )
        .unwrap();

        assert_eq!(
            client.initialize_url(),
            "https://api.chapa.co/v1/transaction/initialize"
        );
        assert_eq!(
            client.verify_url(&TxRef::from_string("tx-Pro-17-abc")),
            "https://api.chapa.co/v1/transaction/verify/tx-Pro-17-abc"
        );
    }
}
