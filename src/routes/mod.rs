//! Route configuration
//!
//! - `telephony` - WebSocket endpoint for the telephony media stream

pub mod telephony;
