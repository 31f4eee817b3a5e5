//! Receipt Generation
//!
//! Pure formatting of a settled session into a self-contained document.
//! No network or storage access; the issue date comes from the session's
//! own timestamps, so the same session always renders byte-identically.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};
use crate::session::{Session, SessionState};

const RULE: &str = "----------------------------------------";

/// A receipt for a settled session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub reference: String,
    pub plan: String,
    pub amount: Decimal,
    pub currency: String,
    pub payer_name: String,
    pub payer_email: String,
    pub issued_at: DateTime<Utc>,
}

impl Receipt {
    /// Build a receipt from a session; requires the `Verified` state
    pub fn from_session(session: &Session) -> Result<Self> {
        if session.state != SessionState::Verified {
            return Err(CheckoutError::NotSettled(session.id.to_string()));
        }

        let reference = session
            .tx_ref
            .as_ref()
            .ok_or_else(|| CheckoutError::NotSettled(session.id.to_string()))?;

        Ok(Self {
            reference: reference.to_string(),
            plan: session.plan.clone(),
            amount: session.amount,
            currency: session.currency.clone(),
            payer_name: session.payer.full_name(),
            payer_email: session.payer.email.clone(),
            issued_at: session.updated_at,
        })
    }

    /// Render the receipt as a plain-text document
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(RULE);
        out.push_str("\nPAYMENT RECEIPT\n");
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!("Reference:  {}\n", self.reference));
        out.push_str(&format!(
            "Issued:     {}\n",
            self.issued_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push_str(&format!("Payer:      {} <{}>\n", self.payer_name, self.payer_email));
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!(
            "1 x {} subscription  {} {}\n",
            self.plan, self.amount, self.currency
        ));
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!("Total:      {} {}\n", self.amount, self.currency));
        out.push_str(RULE);
        out.push('\n');
        out
    }
}

/// Format a settled session as a downloadable plain-text receipt
pub fn format(session: &Session) -> Result<String> {
    Ok(Receipt::from_session(session)?.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Payer, TxRef};
    use rust_decimal_macros::dec;

    fn settled_session() -> Session {
        let mut session = Session::new(
            "Pro",
            dec!(100),
            "ETB",
            Payer::new("ato@ekele.com", "Ato", "Ekele"),
        );
        session
            .bind_reference(TxRef::from_string("tx-Pro-17-abc"), "https://checkout.test/a")
            .unwrap();
        session.settle().unwrap();
        session
    }

    #[test]
    fn test_unsettled_sessions_have_no_receipt() {
        let mut session = Session::new(
            "Pro",
            dec!(100),
            "ETB",
            Payer::new("ato@ekele.com", "Ato", "Ekele"),
        );
        assert!(matches!(
            format(&session).unwrap_err(),
            CheckoutError::NotSettled(_)
        ));

        session.fail("declined").unwrap();
        assert!(matches!(
            format(&session).unwrap_err(),
            CheckoutError::NotSettled(_)
        ));
    }

    #[test]
    fn test_render_is_deterministic() {
        let session = settled_session();
        let first = format(&session).unwrap();
        let second = format(&session).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_receipt_contents() {
        let session = settled_session();
        let document = format(&session).unwrap();

        assert!(document.contains("PAYMENT RECEIPT"));
        assert!(document.contains("tx-Pro-17-abc"));
        assert!(document.contains("1 x Pro subscription  100 ETB"));
        assert!(document.contains("Total:      100 ETB"));
        assert!(document.contains("Ato Ekele <ato@ekele.com>"));
    }
}
