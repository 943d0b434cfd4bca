//! Shared state for HTTP and WebSocket handlers

use std::sync::Arc;

use super::hub::WebSocketHub;

/// Shared application state
pub struct AppState {
    /// Connected clients and history
    pub hub: Arc<WebSocketHub>,
}

impl AppState {
    pub fn new(hub: Arc<WebSocketHub>) -> Self {
        Self { hub }
    }
}
