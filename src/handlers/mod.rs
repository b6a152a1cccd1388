//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `telephony` - Telephony media-stream WebSocket (one session per call)

pub mod api;
pub mod telephony;

// Re-export commonly used handlers for convenient access
pub use telephony::telephony_handler;
