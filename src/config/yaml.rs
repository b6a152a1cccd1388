use serde::Deserialize;
use std::path::PathBuf;

use super::{ServerConfig, TlsConfig};

/// YAML configuration structure
///
/// All fields are optional to allow partial configuration; anything left
/// unset keeps the value already loaded from the environment or defaults.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 5000
///   tls_cert_path: "/etc/tls/cert.pem"
///   tls_key_path: "/etc/tls/key.pem"
///
/// agent:
///   url: "wss://agent.deepgram.com/v1/agent/converse"
///   api_key: "your-agent-key"
///   listen_model: "nova-3"
///   think_model: "gpt-4o-mini"
///   speak_model: "aura-2-thalia-en"
///   prompt: "You are the complaint hotline for a residential building."
///   greeting: "Hello, you've reached the tenant hotline."
///
/// audio:
///   sample_rate: 8000
///   frame_ms: 20
///
/// knowledge:
///   dir: "knowledge_base"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub agent: Option<AgentYaml>,
    pub audio: Option<AudioYaml>,
    pub knowledge: Option<KnowledgeYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
}

/// Agent service configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AgentYaml {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub listen_model: Option<String>,
    pub think_model: Option<String>,
    pub speak_model: Option<String>,
    pub prompt: Option<String>,
    pub greeting: Option<String>,
}

/// Telephony audio framing from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AudioYaml {
    pub sample_rate: Option<u32>,
    pub frame_ms: Option<u32>,
}

/// Knowledge base location from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct KnowledgeYaml {
    pub dir: Option<PathBuf>,
}

impl YamlConfig {
    /// Overlay values from this YAML document onto `config`.
    pub fn merge_into(self, config: &mut ServerConfig) {
        if let Some(server) = self.server {
            if let Some(host) = server.host {
                config.host = host;
            }
            if let Some(port) = server.port {
                config.port = port;
            }
            if let (Some(cert_path), Some(key_path)) = (server.tls_cert_path, server.tls_key_path)
            {
                config.tls = Some(TlsConfig {
                    cert_path,
                    key_path,
                });
            }
        }
        if let Some(agent) = self.agent {
            if let Some(url) = agent.url {
                config.agent_url = url;
            }
            if let Some(api_key) = agent.api_key {
                config.agent_api_key = Some(api_key);
            }
            if let Some(model) = agent.listen_model {
                config.agent_listen_model = model;
            }
            if let Some(model) = agent.think_model {
                config.agent_think_model = model;
            }
            if let Some(model) = agent.speak_model {
                config.agent_speak_model = model;
            }
            if let Some(prompt) = agent.prompt {
                config.agent_prompt = Some(prompt);
            }
            if let Some(greeting) = agent.greeting {
                config.agent_greeting = Some(greeting);
            }
        }
        if let Some(audio) = self.audio {
            if let Some(rate) = audio.sample_rate {
                config.sample_rate = rate;
            }
            if let Some(ms) = audio.frame_ms {
                config.frame_ms = ms;
            }
        }
        if let Some(knowledge) = self.knowledge
            && let Some(dir) = knowledge.dir
        {
            config.knowledge_dir = dir;
        }
    }
}
