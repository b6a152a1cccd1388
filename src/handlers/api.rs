//! Basic API handlers

use axum::Json;
use serde_json::{Value, json};

/// Health check endpoint
///
/// Returns a simple JSON payload confirming the gateway is up.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "hotline-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
