//! Application State

use std::sync::Arc;

use checkout_core::SessionLifecycle;

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Session lifecycle manager (owns the store and gateway)
    pub lifecycle: Arc<SessionLifecycle>,

    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Gateway name, for the health endpoint
    pub gateway_name: String,
}
