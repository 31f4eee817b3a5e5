//! Session Lifecycle
//!
//! The orchestrator: creates sessions, hands off to the gateway, advances
//! state on gateway responses, and exposes read access for rendering and
//! receipts. All mutation goes through the injected [`SessionStore`]; the
//! store lock is never held across a gateway call.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};
use crate::gateway::{InitializeRequest, PaymentGateway};
use crate::reference::ReferenceGenerator;
use crate::session::{Payer, Session, SessionId, SessionState, TxRef};
use crate::store::SessionStore;

/// Deployment-level lifecycle options
#[derive(Clone, Debug)]
pub struct LifecycleOptions {
    /// Settlement currency, fixed per deployment
    pub currency: String,

    /// Reject plan selection without a customer email instead of defaulting
    pub require_customer_email: bool,

    /// Payer identity used when the buyer supplies none
    pub default_email: String,
    pub default_first_name: String,
    pub default_last_name: String,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            currency: "ETB".into(),
            require_customer_email: false,
            default_email: "ato@ekele.com".into(),
            default_first_name: "Ato".into(),
            default_last_name: "Ekele".into(),
        }
    }
}

/// Plan selection input
#[derive(Clone, Debug, Deserialize)]
pub struct SelectPlan {
    pub plan: String,
    pub amount: Decimal,
    #[serde(default)]
    pub customer_email: Option<String>,
}

/// Callback and return URLs for one payment attempt
///
/// The minted reference is appended to the callback URL as a path segment
/// and to the return URL as a `tx_ref` query parameter, so both roads back
/// carry the reference.
#[derive(Clone, Debug)]
pub struct ReturnUrls {
    /// Server-to-server notification target (base, without the reference)
    pub callback_url: String,

    /// Browser redirect target (base, without the reference)
    pub return_url: String,
}

/// Where to send the buyer after a successful initialize
#[derive(Clone, Debug, Serialize)]
pub struct PaymentRedirect {
    pub session_id: SessionId,
    pub tx_ref: TxRef,
    pub checkout_url: String,
}

/// Session lifecycle manager
pub struct SessionLifecycle {
    store: Arc<dyn SessionStore>,
    gateway: Arc<dyn PaymentGateway>,
    references: ReferenceGenerator,
    options: LifecycleOptions,
}

impl SessionLifecycle {
    pub fn new(
        store: Arc<dyn SessionStore>,
        gateway: Arc<dyn PaymentGateway>,
        options: LifecycleOptions,
    ) -> Self {
        Self {
            store,
            gateway,
            references: ReferenceGenerator::new(),
            options,
        }
    }

    /// Create a session for a selected plan
    pub fn select_plan(&self, request: SelectPlan) -> Result<Session> {
        let plan = request.plan.trim();
        if plan.is_empty() {
            return Err(CheckoutError::Validation("plan must not be empty".into()));
        }
        if request.amount <= Decimal::ZERO {
            return Err(CheckoutError::Validation(format!(
                "amount must be positive, got {}",
                request.amount
            )));
        }

        let payer = self.resolve_payer(request.customer_email)?;
        let session = Session::new(plan, request.amount, self.options.currency.clone(), payer);
        self.store.insert(&session)?;

        tracing::info!(
            session_id = %session.id,
            plan = %session.plan,
            amount = %session.amount,
            currency = %session.currency,
            "Created purchase session"
        );

        Ok(session)
    }

    /// Initialize a gateway transaction for a session
    ///
    /// The reference is minted at call time but committed only after the
    /// gateway accepts the request, so a failed outbound call never binds a
    /// ghost reference. A transport failure leaves the session in `Created`,
    /// safe for retry. Calling again on an already-initialized session
    /// returns the stored redirect without minting a new reference.
    pub async fn start_payment(
        &self,
        session_id: &SessionId,
        urls: &ReturnUrls,
    ) -> Result<PaymentRedirect> {
        let session = self.store.get(session_id)?;

        match session.state {
            SessionState::Created => {}
            SessionState::Initialized => return Self::stored_redirect(&session),
            SessionState::Verified | SessionState::Failed => {
                return Err(CheckoutError::AlreadyFinalized(session_id.to_string()));
            }
        }

        let tx_ref = self.references.next(&session.plan);
        let request = InitializeRequest {
            amount: session.amount,
            currency: session.currency.clone(),
            email: session.payer.email.clone(),
            first_name: session.payer.first_name.clone(),
            last_name: session.payer.last_name.clone(),
            tx_ref: tx_ref.clone(),
            callback_url: format!("{}/{tx_ref}", urls.callback_url.trim_end_matches('/')),
            return_url: format!("{}?tx_ref={tx_ref}", urls.return_url),
        };

        // No store lock is held across this call.
        let redirect = match self.gateway.initialize(&request).await {
            Ok(redirect) => redirect,
            Err(err @ CheckoutError::GatewayBusiness(_)) => {
                let reason = err.to_string();
                tracing::warn!(
                    session_id = %session_id,
                    tx_ref = %tx_ref,
                    gateway = %self.gateway.name(),
                    reason = %reason,
                    "Gateway rejected initialize request"
                );
                self.store.update(session_id, &|s| {
                    if s.is_terminal() {
                        Ok(())
                    } else {
                        s.fail(reason.clone())
                    }
                })?;
                return Err(err);
            }
            Err(err) => {
                // Transport failure: the transition is abandoned, not failed.
                tracing::warn!(
                    session_id = %session_id,
                    tx_ref = %tx_ref,
                    gateway = %self.gateway.name(),
                    error = %err,
                    "Gateway initialize did not complete; session left for retry"
                );
                return Err(err);
            }
        };

        let updated = self.store.update(session_id, &|s| {
            if s.state == SessionState::Created {
                s.bind_reference(tx_ref.clone(), redirect.checkout_url.clone())
            } else {
                // A concurrent attempt won the commit; keep its outcome.
                Ok(())
            }
        })?;

        if updated.tx_ref.as_ref() != Some(&tx_ref) {
            tracing::warn!(
                session_id = %session_id,
                minted = %tx_ref,
                "Concurrent payment attempt committed first; minted reference unused"
            );
        }

        tracing::info!(
            session_id = %session_id,
            tx_ref = ?updated.tx_ref,
            state = %updated.state,
            "Payment initialized"
        );

        Self::stored_redirect(&updated)
    }

    /// Settle a session from a verification callback
    ///
    /// Duplicate callbacks for an already-finalized session are a no-op that
    /// returns the existing terminal state; the gateway may retry its
    /// callback.
    pub async fn confirm_payment(&self, tx_ref: &TxRef) -> Result<SessionState> {
        let session = self.store.get_by_reference(tx_ref)?;

        if session.is_terminal() {
            tracing::debug!(
                session_id = %session.id,
                tx_ref = %tx_ref,
                state = %session.state,
                "Duplicate verification callback"
            );
            return Ok(session.state);
        }

        // No store lock is held across this call.
        let outcome = self.gateway.verify(tx_ref).await?;

        let updated = self.store.update(&session.id, &|s| {
            if s.is_terminal() {
                // A racing duplicate finalized first; first writer wins.
                return Ok(());
            }
            if outcome.verified {
                s.settle()
            } else {
                s.fail("gateway reported an unsuccessful transaction")
            }
        })?;

        if outcome.verified {
            tracing::info!(
                session_id = %updated.id,
                tx_ref = %tx_ref,
                state = %updated.state,
                "Payment verified"
            );
        } else {
            tracing::warn!(
                session_id = %updated.id,
                tx_ref = %tx_ref,
                raw = %outcome.raw,
                "Payment verification reported failure"
            );
        }

        Ok(updated.state)
    }

    /// Read a session by id
    pub fn session(&self, session_id: &SessionId) -> Result<Session> {
        self.store.get(session_id)
    }

    /// Read a session by its gateway reference
    pub fn session_by_reference(&self, tx_ref: &TxRef) -> Result<Session> {
        self.store.get_by_reference(tx_ref)
    }

    fn resolve_payer(&self, customer_email: Option<String>) -> Result<Payer> {
        let email = customer_email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        match email {
            Some(email) => {
                if !email.contains('@') {
                    return Err(CheckoutError::Validation(format!(
                        "invalid email address: {email}"
                    )));
                }
                Ok(Payer::new(
                    email,
                    self.options.default_first_name.clone(),
                    self.options.default_last_name.clone(),
                ))
            }
            None if self.options.require_customer_email => Err(CheckoutError::Validation(
                "customer email is required".into(),
            )),
            None => Ok(Payer::new(
                self.options.default_email.clone(),
                self.options.default_first_name.clone(),
                self.options.default_last_name.clone(),
            )),
        }
    }

    fn stored_redirect(session: &Session) -> Result<PaymentRedirect> {
        match (&session.tx_ref, &session.checkout_url) {
            (Some(tx_ref), Some(checkout_url)) => Ok(PaymentRedirect {
                session_id: session.id.clone(),
                tx_ref: tx_ref.clone(),
                checkout_url: checkout_url.clone(),
            }),
            _ => Err(CheckoutError::AlreadyFinalized(session.id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MockGateway, MockOutcome};
    use crate::store::MemorySessionStore;
    use rust_decimal_macros::dec;

    fn lifecycle() -> (SessionLifecycle, Arc<MockGateway>) {
        let gateway = Arc::new(MockGateway::new());
        let lifecycle = SessionLifecycle::new(
            Arc::new(MemorySessionStore::new()),
            gateway.clone(),
            LifecycleOptions::default(),
        );
        (lifecycle, gateway)
    }

    fn select_pro() -> SelectPlan {
        SelectPlan {
            plan: "Pro".into(),
            amount: dec!(100),
            customer_email: None,
        }
    }

    fn urls() -> ReturnUrls {
        ReturnUrls {
            callback_url: "http://localhost:4400/api/verify-payment".into(),
            return_url: "http://localhost:4400/api/payment-success".into(),
        }
    }

    #[test]
    fn test_select_plan_round_trip() {
        let (lifecycle, _) = lifecycle();
        let session = lifecycle.select_plan(select_pro()).unwrap();

        let loaded = lifecycle.session(&session.id).unwrap();
        assert_eq!(loaded.state, SessionState::Created);
        assert_eq!(loaded.plan, "Pro");
        assert_eq!(loaded.amount, dec!(100));
        assert_eq!(loaded.currency, "ETB");
        assert_eq!(loaded.payer.email, "ato@ekele.com");
    }

    #[test]
    fn test_select_plan_validation() {
        let (lifecycle, _) = lifecycle();

        let empty = SelectPlan { plan: "  ".into(), ..select_pro() };
        assert!(matches!(
            lifecycle.select_plan(empty).unwrap_err(),
            CheckoutError::Validation(_)
        ));

        let negative = SelectPlan { amount: dec!(-1), ..select_pro() };
        assert!(matches!(
            lifecycle.select_plan(negative).unwrap_err(),
            CheckoutError::Validation(_)
        ));

        let bad_email = SelectPlan {
            customer_email: Some("not-an-email".into()),
            ..select_pro()
        };
        assert!(matches!(
            lifecycle.select_plan(bad_email).unwrap_err(),
            CheckoutError::Validation(_)
        ));
    }

    #[test]
    fn test_required_email_policy() {
        let gateway = Arc::new(MockGateway::new());
        let lifecycle = SessionLifecycle::new(
            Arc::new(MemorySessionStore::new()),
            gateway,
            LifecycleOptions {
                require_customer_email: true,
                ..LifecycleOptions::default()
            },
        );

        assert!(matches!(
            lifecycle.select_plan(select_pro()).unwrap_err(),
            CheckoutError::Validation(_)
        ));

        let with_email = SelectPlan {
            customer_email: Some("buyer@example.com".into()),
            ..select_pro()
        };
        let session = lifecycle.select_plan(with_email).unwrap();
        assert_eq!(session.payer.email, "buyer@example.com");
    }

    #[tokio::test]
    async fn test_pay_initializes_session() {
        let (lifecycle, gateway) = lifecycle();
        let session = lifecycle.select_plan(select_pro()).unwrap();

        let redirect = lifecycle.start_payment(&session.id, &urls()).await.unwrap();
        assert!(redirect.tx_ref.as_str().starts_with("tx-Pro-"));
        assert!(redirect.checkout_url.contains(redirect.tx_ref.as_str()));

        let loaded = lifecycle.session(&session.id).unwrap();
        assert_eq!(loaded.state, SessionState::Initialized);
        assert_eq!(loaded.checkout_url.as_deref(), Some(redirect.checkout_url.as_str()));

        // The gateway saw the exact session amount and the minted reference.
        let request = gateway.last_initialize().unwrap();
        assert_eq!(request.amount, dec!(100));
        assert_eq!(request.currency, "ETB");
        assert_eq!(request.tx_ref, redirect.tx_ref);
        assert!(request.callback_url.ends_with(redirect.tx_ref.as_str()));
    }

    #[tokio::test]
    async fn test_pay_retry_reuses_reference() {
        let (lifecycle, gateway) = lifecycle();
        let session = lifecycle.select_plan(select_pro()).unwrap();

        let first = lifecycle.start_payment(&session.id, &urls()).await.unwrap();
        let second = lifecycle.start_payment(&session.id, &urls()).await.unwrap();

        assert_eq!(first.tx_ref, second.tx_ref);
        assert_eq!(gateway.initialize_calls(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_session_created() {
        let (lifecycle, gateway) = lifecycle();
        gateway.push_initialize(MockOutcome::TransportFailure("timed out".into()));
        let session = lifecycle.select_plan(select_pro()).unwrap();

        let err = lifecycle.start_payment(&session.id, &urls()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::GatewayTransport(_)));
        assert!(err.is_retryable());

        let loaded = lifecycle.session(&session.id).unwrap();
        assert_eq!(loaded.state, SessionState::Created);
        assert!(loaded.tx_ref.is_none());

        // The retry succeeds against the default mock behavior.
        let redirect = lifecycle.start_payment(&session.id, &urls()).await.unwrap();
        assert_eq!(lifecycle.session(&session.id).unwrap().state, SessionState::Initialized);
        assert!(redirect.tx_ref.as_str().starts_with("tx-Pro-"));
    }

    #[tokio::test]
    async fn test_business_failure_fails_session() {
        let (lifecycle, gateway) = lifecycle();
        gateway.push_initialize(MockOutcome::BusinessFailure("insufficient account".into()));
        let session = lifecycle.select_plan(select_pro()).unwrap();

        let err = lifecycle.start_payment(&session.id, &urls()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::GatewayBusiness(_)));

        let loaded = lifecycle.session(&session.id).unwrap();
        assert_eq!(loaded.state, SessionState::Failed);
        assert!(loaded.failure_reason.is_some());
        assert!(loaded.tx_ref.is_none());

        // A failed session cannot be paid again.
        assert!(matches!(
            lifecycle.start_payment(&session.id, &urls()).await.unwrap_err(),
            CheckoutError::AlreadyFinalized(_)
        ));
    }

    #[tokio::test]
    async fn test_verification_settles_session() {
        let (lifecycle, _) = lifecycle();
        let session = lifecycle.select_plan(select_pro()).unwrap();
        let redirect = lifecycle.start_payment(&session.id, &urls()).await.unwrap();

        let state = lifecycle.confirm_payment(&redirect.tx_ref).await.unwrap();
        assert_eq!(state, SessionState::Verified);
        assert_eq!(lifecycle.session(&session.id).unwrap().state, SessionState::Verified);
    }

    #[tokio::test]
    async fn test_duplicate_callback_is_a_no_op() {
        let (lifecycle, gateway) = lifecycle();
        let session = lifecycle.select_plan(select_pro()).unwrap();
        let redirect = lifecycle.start_payment(&session.id, &urls()).await.unwrap();

        let first = lifecycle.confirm_payment(&redirect.tx_ref).await.unwrap();
        let second = lifecycle.confirm_payment(&redirect.tx_ref).await.unwrap();

        assert_eq!(first, SessionState::Verified);
        assert_eq!(second, SessionState::Verified);
        // The duplicate never reaches the gateway.
        assert_eq!(gateway.verify_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_verification_is_terminal() {
        let (lifecycle, gateway) = lifecycle();
        gateway.push_verify(MockOutcome::BusinessFailure("charge declined".into()));
        let session = lifecycle.select_plan(select_pro()).unwrap();
        let redirect = lifecycle.start_payment(&session.id, &urls()).await.unwrap();

        let state = lifecycle.confirm_payment(&redirect.tx_ref).await.unwrap();
        assert_eq!(state, SessionState::Failed);

        // Even a later success callback cannot flip a terminal state.
        let again = lifecycle.confirm_payment(&redirect.tx_ref).await.unwrap();
        assert_eq!(again, SessionState::Failed);
        assert_eq!(gateway.verify_calls(), 1);
    }

    #[tokio::test]
    async fn test_verify_transport_failure_keeps_state() {
        let (lifecycle, gateway) = lifecycle();
        gateway.push_verify(MockOutcome::TransportFailure("connection reset".into()));
        let session = lifecycle.select_plan(select_pro()).unwrap();
        let redirect = lifecycle.start_payment(&session.id, &urls()).await.unwrap();

        let err = lifecycle.confirm_payment(&redirect.tx_ref).await.unwrap_err();
        assert!(matches!(err, CheckoutError::GatewayTransport(_)));
        assert_eq!(lifecycle.session(&session.id).unwrap().state, SessionState::Initialized);

        // Retry settles normally.
        let state = lifecycle.confirm_payment(&redirect.tx_ref).await.unwrap();
        assert_eq!(state, SessionState::Verified);
    }

    #[tokio::test]
    async fn test_unknown_reference() {
        let (lifecycle, gateway) = lifecycle();

        let err = lifecycle
            .confirm_payment(&TxRef::from_string("tx-nope-0-0"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::SessionNotFound(_)));
        assert_eq!(gateway.verify_calls(), 0);
    }
}
