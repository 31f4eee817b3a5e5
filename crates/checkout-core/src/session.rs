//! Purchase Sessions
//!
//! Tracks one purchase attempt from plan selection through gateway redirect,
//! verification, and settlement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CheckoutError, Result};

/// Unique session identifier (lookup key for the store)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gateway-facing transaction reference
///
/// Correlates the local session with the gateway's transaction record.
/// Minted by [`crate::reference::ReferenceGenerator`], bound to a session at
/// most once.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxRef(String);

impl TxRef {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TxRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session state machine
///
/// State only moves forward; `Failed` is reachable from any non-terminal
/// state. `Verified` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Created,
    Initialized,
    Verified,
    Failed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::Initialized => "initialized",
            SessionState::Verified => "verified",
            SessionState::Failed => "failed",
        }
    }

    /// Terminal states accept no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Verified | SessionState::Failed)
    }

    /// Check whether a forward transition to `next` is allowed
    pub fn can_advance(self, next: SessionState) -> bool {
        match (self, next) {
            (SessionState::Created, SessionState::Initialized) => true,
            (SessionState::Initialized, SessionState::Verified) => true,
            (from, SessionState::Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payer identity sent to the gateway
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Payer {
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A purchase session (the canonical record owned by the store)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier, immutable for the lifetime of the store
    pub id: SessionId,

    /// Selected plan name
    pub plan: String,

    /// Amount in the settlement currency, immutable after creation
    pub amount: Decimal,

    /// Settlement currency, fixed per deployment
    pub currency: String,

    /// Payer identity (email defaulted when the deployment allows it)
    pub payer: Payer,

    /// Gateway transaction reference, set at most once
    pub tx_ref: Option<TxRef>,

    /// Current lifecycle state
    pub state: SessionState,

    /// Why the session failed, when it did
    pub failure_reason: Option<String>,

    /// Hosted checkout URL, set once initialized
    pub checkout_url: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session in the `Created` state
    pub fn new(plan: impl Into<String>, amount: Decimal, currency: impl Into<String>, payer: Payer) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            plan: plan.into(),
            amount,
            currency: currency.into(),
            payer,
            tx_ref: None,
            state: SessionState::Created,
            failure_reason: None,
            checkout_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the mutation timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Bind the gateway reference and checkout URL, advancing to `Initialized`
    ///
    /// Committed only after the gateway accepted the initialize request, so a
    /// failed outbound call never leaves a ghost reference behind.
    pub fn bind_reference(&mut self, tx_ref: TxRef, checkout_url: impl Into<String>) -> Result<()> {
        if self.is_terminal() {
            return Err(CheckoutError::AlreadyFinalized(self.id.to_string()));
        }
        if self.tx_ref.is_some() {
            return Err(CheckoutError::Storage(format!(
                "session {} already holds a reference",
                self.id
            )));
        }
        if !self.state.can_advance(SessionState::Initialized) {
            return Err(CheckoutError::Storage(format!(
                "session {} cannot advance from {} to initialized",
                self.id, self.state
            )));
        }

        self.tx_ref = Some(tx_ref);
        self.checkout_url = Some(checkout_url.into());
        self.state = SessionState::Initialized;
        self.touch();
        Ok(())
    }

    /// Advance a verified `Initialized` session to the terminal `Verified` state
    pub fn settle(&mut self) -> Result<()> {
        if self.is_terminal() {
            return Err(CheckoutError::AlreadyFinalized(self.id.to_string()));
        }
        if !self.state.can_advance(SessionState::Verified) {
            return Err(CheckoutError::Storage(format!(
                "session {} cannot advance from {} to verified",
                self.id, self.state
            )));
        }

        self.state = SessionState::Verified;
        self.touch();
        Ok(())
    }

    /// Move the session to the terminal `Failed` state, recording why
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        if self.is_terminal() {
            return Err(CheckoutError::AlreadyFinalized(self.id.to_string()));
        }

        self.state = SessionState::Failed;
        self.failure_reason = Some(reason.into());
        self.touch();
        Ok(())
    }
}
