//! Speech-to-speech agent service client
//!
//! The agent leg is an outbound WebSocket connection to a conversational
//! voice-agent service. After the handshake the gateway sends one JSON
//! settings object (including the advertised capability schema), then
//! streams raw binary audio up and receives binary audio or JSON control
//! messages back.
//!
//! # Modules
//! - `client` - connection establishment and settings handshake
//! - `config` - the settings object sent on connect
//! - `messages` - control message types received from and sent to the agent

pub mod client;
pub mod config;
pub mod messages;

pub use client::{AgentClient, AgentError, AgentResult, AgentWsStream};
pub use config::AgentSettings;
pub use messages::{AgentCommand, AgentEvent, FunctionCallRequest};
