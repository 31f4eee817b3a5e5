//! # checkout-core
//!
//! Purchase session lifecycle for a hosted-gateway subscription checkout.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │  Your Site  │────▶│  Hosted Gateway │────▶│  Your Site  │
//! │   (plans)   │     │  Checkout Page  │     │  (success)  │
//! └─────────────┘     └─────────────────┘     └─────────────┘
//!        │                     │                     ▲
//!        │ select_plan         │ callback            │ receipt
//!        ▼                     ▼                     │
//!   CREATED ──▶ INITIALIZED ──▶ VERIFIED ────────────┘
//!        │             │
//!        └─────────────┴──────▶ FAILED
//! ```
//!
//! A session is created when the buyer picks a plan, advances to
//! `INITIALIZED` once the gateway accepts the transaction, and reaches a
//! terminal `VERIFIED` or `FAILED` state through the verification callback.
//! Duplicate or out-of-order callbacks are no-ops once a session is
//! finalized.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_core::{
//!     LifecycleOptions, MemorySessionStore, ReturnUrls, SelectPlan, SessionLifecycle,
//! };
//!
//! let lifecycle = SessionLifecycle::new(store, gateway, LifecycleOptions::default());
//!
//! let session = lifecycle.select_plan(SelectPlan {
//!     plan: "Pro".into(),
//!     amount: dec!(100),
//!     customer_email: None,
//! })?;
//!
//! let redirect = lifecycle.start_payment(&session.id, &urls).await?;
//! // Redirect the buyer to: redirect.checkout_url
//! ```

mod error;
mod gateway;
mod lifecycle;
mod receipt;
mod reference;
mod session;
mod store;

pub mod plan;

pub use error::{CheckoutError, Result};
pub use gateway::{
    GatewayRedirect, InitializeRequest, MockGateway, MockOutcome, PaymentGateway, VerifyOutcome,
};
pub use lifecycle::{
    LifecycleOptions, PaymentRedirect, ReturnUrls, SelectPlan, SessionLifecycle,
};
pub use receipt::{Receipt, format as format_receipt};
pub use reference::ReferenceGenerator;
pub use session::{Payer, Session, SessionId, SessionState, TxRef};
pub use store::{MemorySessionStore, SessionStore};
