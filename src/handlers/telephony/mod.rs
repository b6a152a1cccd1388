//! Telephony media-stream WebSocket handler
//!
//! The telephony provider opens one WebSocket per phone call and streams
//! JSON events over it. This module parses that protocol and hands each
//! accepted connection to a [`crate::session::Session`].

pub mod handler;
pub mod messages;

pub use handler::telephony_handler;
