//! chapa-checkout HTTP Server
//!
//! Axum-based server for the subscription checkout flow: plan selection,
//! hosted-gateway handoff, verification callback, success page, and
//! receipt download.

mod config;
mod handlers;
mod state;
mod views;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkout_chapa::ChapaClient;
use checkout_core::{MemorySessionStore, PaymentGateway, SessionLifecycle};

use crate::config::ServerConfig;
use crate::handlers::{
    create_session, error_view, health_check, landing, payment_method_page, payment_success,
    plans_page, receipt, start_payment, verify_payment_path, verify_payment_query,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;

    // A missing gateway credential is fatal at startup, never a
    // per-request error.
    let gateway: Arc<dyn PaymentGateway> = Arc::new(ChapaClient::from_env()?);
    tracing::info!(gateway = %gateway.name(), "✓ Payment gateway configured");

    let store = Arc::new(MemorySessionStore::new());
    let lifecycle = Arc::new(SessionLifecycle::new(
        store,
        gateway.clone(),
        config.lifecycle_options(),
    ));

    let state = AppState {
        lifecycle,
        gateway_name: gateway.name().to_string(),
        config: Arc::new(config.clone()),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Pages
        .route("/", get(landing))
        .route("/plans", get(plans_page))
        .route("/payment-method", get(payment_method_page))
        .route("/error", get(error_view))
        // Health
        .route("/health", get(health_check))
        // Checkout API
        .route("/api/sessions", post(create_session))
        .route("/api/pay", post(start_payment))
        .route("/api/verify-payment", get(verify_payment_query))
        .route("/api/verify-payment/{tx_ref}", get(verify_payment_path))
        .route("/api/payment-success", get(payment_success))
        .route("/receipt/{session_id}", get(receipt))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 chapa-checkout server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /                        - Landing page");
    tracing::info!("  GET  /plans                   - Plan selection");
    tracing::info!("  GET  /health                  - Health check");
    tracing::info!("  POST /api/sessions            - Create purchase session");
    tracing::info!("  POST /api/pay                 - Redirect to hosted checkout");
    tracing::info!("  GET  /api/verify-payment/:ref - Gateway callback");
    tracing::info!("  GET  /api/payment-success     - Return URL");
    tracing::info!("  GET  /receipt/:session        - Receipt download");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
