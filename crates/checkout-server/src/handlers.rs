//! HTTP Handlers
//!
//! Browser-facing routes redirect to HTML views; the verification callback
//! is server-to-server and answers JSON. User-visible failures carry a
//! human-readable reason, never a raw gateway payload.

use axum::{
    Json,
    extract::{Form, Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use checkout_core::{
    CheckoutError, SelectPlan, SessionId, SessionState, TxRef, format_receipt, plan,
};

use crate::state::AppState;
use crate::views::{self, SessionView};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub gateway: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectPlanForm {
    pub plan: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PayForm {
    pub session: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session: String,
}

#[derive(Debug, Deserialize)]
pub struct TxRefQuery {
    pub tx_ref: String,
}

#[derive(Debug, Deserialize)]
pub struct ReasonQuery {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub tx_ref: String,
    pub state: String,
    pub settled: bool,
}

// ============================================================================
// Error Mapping
// ============================================================================

fn error_parts(err: &CheckoutError) -> (StatusCode, &'static str) {
    match err {
        CheckoutError::Validation(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        CheckoutError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
        CheckoutError::GatewayTransport(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_UNAVAILABLE"),
        CheckoutError::GatewayBusiness(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_REJECTED"),
        CheckoutError::AlreadyFinalized(_) => (StatusCode::CONFLICT, "ALREADY_FINALIZED"),
        CheckoutError::NotSettled(_) => (StatusCode::NOT_FOUND, "NOT_SETTLED"),
        CheckoutError::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, "CONFIG_ERROR"),
        CheckoutError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
    }
}

fn json_error(err: &CheckoutError) -> Response {
    let (status, code) = error_parts(err);
    (
        status,
        Json(ErrorResponse {
            error: err.user_message().into(),
            code: code.into(),
        }),
    )
        .into_response()
}

/// Redirect the browser to the error view with a human-readable reason
fn redirect_error(err: &CheckoutError) -> Response {
    Redirect::to(&format!(
        "/error?reason={}",
        views::urlencode(err.user_message())
    ))
    .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// Landing page
pub async fn landing() -> Html<String> {
    Html(views::landing_page())
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        gateway: state.gateway_name.clone(),
    })
}

/// Plan selection page
pub async fn plans_page() -> Html<String> {
    Html(views::plans_page(&plan::catalog()))
}

/// Create a session for the selected plan
pub async fn create_session(
    State(state): State<AppState>,
    Form(form): Form<SelectPlanForm>,
) -> Response {
    let Some(offer) = plan::find_plan(&form.plan) else {
        return redirect_error(&CheckoutError::Validation(format!(
            "unknown plan: {}",
            form.plan
        )));
    };

    let request = SelectPlan {
        plan: offer.name,
        amount: offer.amount,
        customer_email: form.email,
    };

    match state.lifecycle.select_plan(request) {
        Ok(session) => {
            Redirect::to(&format!("/payment-method?session={}", session.id)).into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Plan selection rejected");
            redirect_error(&err)
        }
    }
}

/// Payment method page for a created session
pub async fn payment_method_page(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Response {
    let session_id = SessionId::from_string(query.session);

    match state.lifecycle.session(&session_id) {
        Ok(session) => match session.state {
            SessionState::Created | SessionState::Initialized => {
                Html(views::payment_method_page(&SessionView::from_session(&session)))
                    .into_response()
            }
            SessionState::Verified => {
                let tx_ref = session.tx_ref.as_ref().map(ToString::to_string).unwrap_or_default();
                Redirect::to(&format!(
                    "/api/payment-success?tx_ref={}",
                    views::urlencode(&tx_ref)
                ))
                .into_response()
            }
            SessionState::Failed => {
                redirect_error(&CheckoutError::AlreadyFinalized(session_id.to_string()))
            }
        },
        // Unknown session: back to plan selection.
        Err(CheckoutError::SessionNotFound(_)) => Redirect::to("/plans").into_response(),
        Err(err) => redirect_error(&err),
    }
}

/// Initialize the gateway transaction and redirect to the hosted checkout
pub async fn start_payment(
    State(state): State<AppState>,
    Form(form): Form<PayForm>,
) -> Response {
    let session_id = SessionId::from_string(form.session);

    match state
        .lifecycle
        .start_payment(&session_id, &state.config.return_urls())
        .await
    {
        Ok(redirect) => Redirect::to(&redirect.checkout_url).into_response(),
        Err(CheckoutError::SessionNotFound(_)) => Redirect::to("/plans").into_response(),
        Err(err) => {
            tracing::error!(session_id = %session_id, error = %err, "Payment initiation failed");
            redirect_error(&err)
        }
    }
}

/// Gateway callback with the reference as a path segment
pub async fn verify_payment_path(
    State(state): State<AppState>,
    Path(tx_ref): Path<String>,
) -> Response {
    confirm(&state, tx_ref).await
}

/// Gateway callback with the reference as a query parameter
pub async fn verify_payment_query(
    State(state): State<AppState>,
    Query(query): Query<TxRefQuery>,
) -> Response {
    confirm(&state, query.tx_ref).await
}

async fn confirm(state: &AppState, tx_ref: String) -> Response {
    let tx_ref = TxRef::from_string(tx_ref);

    match state.lifecycle.confirm_payment(&tx_ref).await {
        Ok(session_state) => Json(VerifyResponse {
            tx_ref: tx_ref.to_string(),
            state: session_state.to_string(),
            settled: session_state == SessionState::Verified,
        })
        .into_response(),
        Err(err) => {
            tracing::warn!(tx_ref = %tx_ref, error = %err, "Verification callback failed");
            json_error(&err)
        }
    }
}

/// Browser return URL: verify (idempotent) and render the outcome
pub async fn payment_success(
    State(state): State<AppState>,
    Query(query): Query<TxRefQuery>,
) -> Response {
    let tx_ref = TxRef::from_string(query.tx_ref);

    // The browser may arrive before the server-to-server callback; verifying
    // here is a no-op when the callback already settled the session.
    match state.lifecycle.confirm_payment(&tx_ref).await {
        Ok(SessionState::Verified) => match state.lifecycle.session_by_reference(&tx_ref) {
            Ok(session) => {
                Html(views::success_page(&SessionView::from_session(&session))).into_response()
            }
            Err(err) => redirect_error(&err),
        },
        Ok(_) => redirect_error(&CheckoutError::GatewayBusiness(
            "transaction was not successful".into(),
        )),
        Err(err) => {
            tracing::warn!(tx_ref = %tx_ref, error = %err, "Return-URL verification failed");
            redirect_error(&err)
        }
    }
}

/// Download the receipt for a settled session
pub async fn receipt(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = SessionId::from_string(session_id);

    let document = state
        .lifecycle
        .session(&session_id)
        .and_then(|session| format_receipt(&session));

    match document {
        Ok(document) => (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"receipt-{session_id}.txt\""),
                ),
            ],
            document,
        )
            .into_response(),
        Err(err) => {
            let (status, _) = error_parts(&err);
            (status, Html(views::error_page(err.user_message()))).into_response()
        }
    }
}

/// Error view
pub async fn error_view(Query(query): Query<ReasonQuery>) -> Html<String> {
    let reason = query
        .reason
        .unwrap_or_else(|| "An error occurred processing your request.".into());
    Html(views::error_page(&reason))
}
