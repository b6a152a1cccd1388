//! Agent control message types
//!
//! JSON text frames on the agent connection carry control messages with a
//! `type` discriminator. Binary frames are raw audio and never reach these
//! types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Control messages received from the agent service.
///
/// Message kinds the relay does not recognize deserialize to [`Unknown`]
/// rather than failing, so a protocol addition on the agent side never
/// breaks a live call.
///
/// [`Unknown`]: AgentEvent::Unknown
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum AgentEvent {
    /// Connection-level greeting sent once after the handshake
    Welcome {
        #[serde(default)]
        request_id: Option<String>,
    },

    /// The settings object was accepted
    SettingsApplied,

    /// A finished transcript line for either side of the conversation
    ConversationText { role: String, content: String },

    /// The caller started speaking while agent audio may still be playing
    /// (barge-in)
    UserStartedSpeaking,

    /// The agent is producing a response
    AgentThinking {
        #[serde(default)]
        content: Option<String>,
    },

    /// The agent finished sending audio for the current turn
    AgentAudioDone,

    /// The agent asks us to run a capability and return its result
    FunctionCallRequest(FunctionCallRequest),

    /// Echo of a function response executed on the agent side; observed
    /// only, never answered
    FunctionCallResponse {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        content: Option<String>,
    },

    /// Fatal condition reported by the agent service
    AgentError {
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },

    /// Non-fatal condition reported by the agent service
    AgentWarning {
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },

    /// Any message kind this relay does not handle
    #[serde(other)]
    Unknown,
}

/// A request from the agent to invoke a named capability.
///
/// `id` is the correlation id: the response must echo it unchanged.
/// `client_side` is true when execution belongs to this gateway; requests
/// flagged for remote execution are observed but never answered here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCallRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default = "default_client_side")]
    pub client_side: bool,
}

fn default_client_side() -> bool {
    true
}

/// Control messages sent to the agent service.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum AgentCommand {
    /// Result of a capability invocation, correlated by `id`
    FunctionCallResponse {
        id: String,
        name: String,
        /// JSON-serialized capability result
        content: String,
    },
}
