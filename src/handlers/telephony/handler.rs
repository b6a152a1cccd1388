//! Telephony WebSocket handler
//!
//! Upgrades the telephony provider's HTTP request to a WebSocket and runs
//! one [`Session`] over it for the lifetime of the call.

use axum::{
    extract::{State, WebSocketUpgrade, ws::WebSocket},
    response::Response,
};
use std::sync::Arc;
use tracing::info;

use crate::session::Session;
use crate::state::AppState;

/// Maximum WebSocket frame size (1 MB). Telephony media events are small;
/// anything larger is not this protocol.
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// Telephony WebSocket handler
///
/// One connection per phone call. The upgraded socket is handed to a
/// session which owns it until teardown.
pub async fn telephony_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("Telephony WebSocket connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_call(socket, state))
}

/// Run one call to completion.
async fn handle_call(socket: WebSocket, state: Arc<AppState>) {
    let session = Session::new();
    info!(session_id = %session.id(), "Incoming call");
    session.run(socket, state).await;
}
