//! Telephony WebSocket route configuration
//!
//! This module configures the WebSocket endpoint the telephony provider
//! connects to when a call starts.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::telephony::telephony_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the telephony WebSocket router
///
/// # Endpoint
///
/// `GET /telephony` - WebSocket upgrade for a telephony media stream
///
/// # Protocol
///
/// After WebSocket upgrade, the telephony provider sends JSON events
/// (`connected`, `start`, `media`, `stop`). The gateway responds with
/// `media` events carrying agent audio and `clear` events on barge-in.
pub fn create_telephony_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/telephony", get(telephony_handler))
        .layer(TraceLayer::new_for_http())
}
