//! Agent settings object
//!
//! Sent as the first text frame after the agent WebSocket handshake. It
//! fixes the audio codec on both directions and advertises every
//! registered capability so the agent can call them by name.

use serde::Serialize;

use crate::capabilities::ToolSchema;
use crate::config::ServerConfig;

/// Default instructions when no prompt is configured.
const DEFAULT_PROMPT: &str = "You are the voice of a residential property complaint hotline. \
     Verify the caller's unit number before filing anything, keep answers \
     short and spoken-friendly, and read assurance messages word for word.";

/// The settings message sent once per session.
#[derive(Debug, Clone, Serialize)]
pub struct AgentSettings {
    #[serde(rename = "type")]
    kind: &'static str,
    audio: AudioSettings,
    agent: AgentSection,
}

#[derive(Debug, Clone, Serialize)]
struct AudioSettings {
    input: AudioFormat,
    output: AudioFormat,
}

#[derive(Debug, Clone, Serialize)]
struct AudioFormat {
    encoding: &'static str,
    sample_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    container: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
struct AgentSection {
    listen: ListenSettings,
    think: ThinkSettings,
    speak: SpeakSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    greeting: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ListenSettings {
    provider: Provider,
}

#[derive(Debug, Clone, Serialize)]
struct ThinkSettings {
    provider: Provider,
    prompt: String,
    functions: Vec<ToolSchema>,
}

#[derive(Debug, Clone, Serialize)]
struct SpeakSettings {
    provider: Provider,
}

#[derive(Debug, Clone, Serialize)]
struct Provider {
    #[serde(rename = "type")]
    kind: &'static str,
    model: String,
}

impl AgentSettings {
    /// Build the settings for one session from the server configuration
    /// and the advertised capability schemas.
    pub fn build(config: &ServerConfig, functions: Vec<ToolSchema>) -> Self {
        Self {
            kind: "Settings",
            audio: AudioSettings {
                input: AudioFormat {
                    encoding: "mulaw",
                    sample_rate: config.sample_rate,
                    container: None,
                },
                output: AudioFormat {
                    encoding: "mulaw",
                    sample_rate: config.sample_rate,
                    container: Some("none"),
                },
            },
            agent: AgentSection {
                listen: ListenSettings {
                    provider: Provider {
                        kind: "deepgram",
                        model: config.agent_listen_model.clone(),
                    },
                },
                think: ThinkSettings {
                    provider: Provider {
                        kind: "open_ai",
                        model: config.agent_think_model.clone(),
                    },
                    prompt: config
                        .agent_prompt
                        .clone()
                        .unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
                    functions,
                },
                speak: SpeakSettings {
                    provider: Provider {
                        kind: "deepgram",
                        model: config.agent_speak_model.clone(),
                    },
                },
                greeting: config.agent_greeting.clone(),
            },
        }
    }
}
