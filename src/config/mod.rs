//! Configuration module for the Hotline Gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Example
//! ```rust,no_run
//! use hotline_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

mod yaml;

use yaml::YamlConfig;

/// Default agent service endpoint.
const DEFAULT_AGENT_URL: &str = "wss://agent.deepgram.com/v1/agent/converse";

/// Errors raised while loading or validating configuration.
///
/// A configuration fault is fatal: the process must refuse to accept
/// sessions rather than start with a broken setup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required secret is missing from the environment
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// A value was present but could not be parsed
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// The YAML configuration file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The YAML configuration file could not be parsed
    #[error("Failed to parse configuration file: {0}")]
    FileParse(#[from] serde_yaml::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains all configuration needed to run the Hotline Gateway, including:
/// - Server settings (host, port, TLS)
/// - Agent service settings (endpoint, API key, models, prompt)
/// - Telephony audio framing (sample rate, frame duration)
/// - Knowledge base location
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Agent service settings
    pub agent_url: String,
    pub agent_api_key: Option<String>,
    pub agent_listen_model: String,
    pub agent_think_model: String,
    pub agent_speak_model: String,
    pub agent_prompt: Option<String>,
    pub agent_greeting: Option<String>,

    // Telephony audio framing
    pub sample_rate: u32,
    pub frame_ms: u32,

    // Knowledge base
    pub knowledge_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            tls: None,
            agent_url: DEFAULT_AGENT_URL.to_string(),
            agent_api_key: None,
            agent_listen_model: "nova-3".to_string(),
            agent_think_model: "gpt-4o-mini".to_string(),
            agent_speak_model: "aura-2-thalia-en".to_string(),
            agent_prompt: None,
            agent_greeting: None,
            sample_rate: 8000,
            frame_ms: 20,
            knowledge_dir: PathBuf::from("knowledge_base"),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `.env` values if `dotenvy::dotenv()` was called beforehand.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, with environment variables
    /// filling anything the file leaves unset.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;
        let yaml: YamlConfig = serde_yaml::from_str(&contents)?;

        let mut config = Self::default();
        config.apply_env()?;
        yaml.merge_into(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// The socket address string the server binds to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether TLS serving is enabled.
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Bytes per fixed-duration audio frame forwarded to the agent.
    pub fn frame_bytes(&self) -> usize {
        (self.sample_rate as usize * self.frame_ms as usize) / 1000
    }

    fn apply_env(&mut self) -> ConfigResult<()> {
        if let Ok(host) = std::env::var("HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                field: "PORT".to_string(),
                reason: format!("'{port}' is not a valid port number"),
            })?;
        }
        if let Ok(url) = std::env::var("AGENT_URL") {
            self.agent_url = url;
        }
        if let Ok(key) = std::env::var("AGENT_API_KEY") {
            self.agent_api_key = Some(key);
        }
        if let Ok(model) = std::env::var("AGENT_LISTEN_MODEL") {
            self.agent_listen_model = model;
        }
        if let Ok(model) = std::env::var("AGENT_THINK_MODEL") {
            self.agent_think_model = model;
        }
        if let Ok(model) = std::env::var("AGENT_SPEAK_MODEL") {
            self.agent_speak_model = model;
        }
        if let Ok(prompt) = std::env::var("AGENT_PROMPT") {
            self.agent_prompt = Some(prompt);
        }
        if let Ok(greeting) = std::env::var("AGENT_GREETING") {
            self.agent_greeting = Some(greeting);
        }
        if let Ok(rate) = std::env::var("SAMPLE_RATE") {
            self.sample_rate = rate.parse().map_err(|_| ConfigError::InvalidValue {
                field: "SAMPLE_RATE".to_string(),
                reason: format!("'{rate}' is not a valid sample rate"),
            })?;
        }
        if let Ok(ms) = std::env::var("FRAME_MS") {
            self.frame_ms = ms.parse().map_err(|_| ConfigError::InvalidValue {
                field: "FRAME_MS".to_string(),
                reason: format!("'{ms}' is not a valid frame duration"),
            })?;
        }
        if let Ok(dir) = std::env::var("KNOWLEDGE_DIR") {
            self.knowledge_dir = PathBuf::from(dir);
        }
        if let (Ok(cert), Ok(key)) = (std::env::var("TLS_CERT_PATH"), std::env::var("TLS_KEY_PATH"))
        {
            self.tls = Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            });
        }
        Ok(())
    }

    /// Validate the configuration.
    ///
    /// A missing agent API key or a degenerate frame size prevents the
    /// process from accepting sessions.
    pub fn validate(&self) -> ConfigResult<()> {
        match &self.agent_api_key {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::MissingRequired(
                    "AGENT_API_KEY is not set".to_string(),
                ));
            }
        }
        if self.frame_bytes() == 0 {
            return Err(ConfigError::InvalidValue {
                field: "FRAME_MS".to_string(),
                reason: "sample_rate x frame_ms must produce at least one byte per frame"
                    .to_string(),
            });
        }
        if self.agent_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "AGENT_URL is empty".to_string(),
            ));
        }
        Ok(())
    }
}
