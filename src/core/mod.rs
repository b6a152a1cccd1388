//! Core relay building blocks
//!
//! - `audio` - fixed-duration frame re-assembly for inbound telephony audio
//! - `agent` - WebSocket client for the speech-to-speech agent service

pub mod agent;
pub mod audio;
