//! Server-Rendered Views
//!
//! Minimal HTML pages built from read-only session projections. The
//! rendering layer never sees the store or the gateway.

use checkout_core::{Session, plan::PlanOffer};

/// Read-only projection of a session for rendering
pub struct SessionView {
    pub id: String,
    pub plan: String,
    pub amount: String,
    pub currency: String,
    pub email: String,
    pub state: String,
    pub tx_ref: Option<String>,
    pub updated: String,
}

impl SessionView {
    pub fn from_session(session: &Session) -> Self {
        Self {
            id: session.id.to_string(),
            plan: session.plan.clone(),
            amount: session.amount.to_string(),
            currency: session.currency.clone(),
            email: session.payer.email.clone(),
            state: session.state.to_string(),
            tx_ref: session.tx_ref.as_ref().map(ToString::to_string),
            updated: session.updated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        }
    }
}

/// Escape text for HTML interpolation
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encode a value for use in a query string
pub fn urlencode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

pub fn landing_page() -> String {
    page(
        "Subscription Checkout",
        "<h1>Subscription Checkout</h1>\n\
         <p>Pick a plan and pay through the hosted checkout.</p>\n\
         <p><a href=\"/plans\">View plans</a></p>",
    )
}

pub fn plans_page(plans: &[PlanOffer]) -> String {
    let mut body = String::from("<h1>Choose a plan</h1>\n<ul>\n");
    for offer in plans {
        body.push_str(&format!(
            "<li>\n<h2>{name}</h2>\n<p>{description}</p>\n<p>{amount} ETB / month</p>\n\
             <form method=\"post\" action=\"/api/sessions\">\n\
             <input type=\"hidden\" name=\"plan\" value=\"{name}\">\n\
             <label>Email (optional): <input type=\"email\" name=\"email\"></label>\n\
             <button type=\"submit\">Select {name}</button>\n</form>\n</li>\n",
            name = escape(&offer.name),
            description = escape(&offer.description),
            amount = escape(&offer.amount.to_string()),
        ));
    }
    body.push_str("</ul>");
    page("Plans", &body)
}

pub fn payment_method_page(session: &SessionView) -> String {
    let body = format!(
        "<h1>Payment</h1>\n\
         <p>Plan: {plan}</p>\n<p>Amount: {amount} {currency}</p>\n<p>Payer: {email}</p>\n\
         <p>Status: {state}</p>\n\
         <form method=\"post\" action=\"/api/pay\">\n\
         <input type=\"hidden\" name=\"session\" value=\"{id}\">\n\
         <button type=\"submit\">Pay with Chapa</button>\n</form>\n\
         <p><a href=\"/plans\">Back to plans</a></p>",
        plan = escape(&session.plan),
        amount = escape(&session.amount),
        currency = escape(&session.currency),
        email = escape(&session.email),
        state = escape(&session.state),
        id = escape(&session.id),
    );
    page("Payment", &body)
}

pub fn success_page(session: &SessionView) -> String {
    let reference = session.tx_ref.as_deref().unwrap_or("-");
    let body = format!(
        "<h1>Payment successful</h1>\n\
         <p>Thank you for your payment!</p>\n\
         <p>Plan: {plan}</p>\n<p>Amount: {amount} {currency}</p>\n\
         <p>Reference: {reference}</p>\n<p>Date: {updated}</p>\n\
         <p><a href=\"/receipt/{id}\">Download receipt</a></p>",
        plan = escape(&session.plan),
        amount = escape(&session.amount),
        currency = escape(&session.currency),
        reference = escape(reference),
        updated = escape(&session.updated),
        id = escape(&session.id),
    );
    page("Payment successful", &body)
}

pub fn error_page(reason: &str) -> String {
    let body = format!(
        "<h1>Something went wrong</h1>\n<p>{}</p>\n<p><a href=\"/plans\">Back to plans</a></p>",
        escape(reason)
    );
    page("Payment error", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_urlencode() {
        assert_eq!(urlencode("try again"), "try%20again");
        assert_eq!(urlencode("tx-Pro-17"), "tx-Pro-17");
    }

    #[test]
    fn test_error_page_escapes_reason() {
        let html = error_page("<script>alert(1)</script>");
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
