//! Agent WebSocket connection establishment
//!
//! Connects to the agent service over TLS, authenticating with the API key
//! on the handshake, and sends the settings object before handing the
//! stream to the session tasks.

use futures_util::SinkExt;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use super::config::AgentSettings;
use crate::config::ServerConfig;

/// The connected agent WebSocket stream.
pub type AgentWsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Errors raised while talking to the agent service.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The configured endpoint is not a valid WebSocket URL
    #[error("Invalid agent URL: {0}")]
    InvalidUrl(String),

    /// The API key is missing at connect time
    #[error("Agent API key is not configured")]
    MissingApiKey,

    /// The WebSocket handshake or transport failed
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// A message could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Client for opening agent connections.
///
/// One client is built per session from the shared configuration; the
/// connection it opens is owned by that session alone.
pub struct AgentClient {
    url: String,
    api_key: String,
}

impl AgentClient {
    /// Build a client from the server configuration.
    pub fn new(config: &ServerConfig) -> AgentResult<Self> {
        let api_key = config
            .agent_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AgentError::MissingApiKey)?;

        Ok(Self {
            url: config.agent_url.clone(),
            api_key,
        })
    }

    /// Connect to the agent service and send the settings object.
    ///
    /// Returns the raw stream; the caller splits it into the read and
    /// write halves the session tasks own.
    pub async fn connect(&self, settings: &AgentSettings) -> AgentResult<AgentWsStream> {
        let url =
            Url::parse(&self.url).map_err(|e| AgentError::InvalidUrl(format!("{}: {e}", self.url)))?;
        let host = url
            .host_str()
            .ok_or_else(|| AgentError::InvalidUrl(format!("{} has no host", self.url)))?;

        let request = http::Request::builder()
            .uri(&self.url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header(
                "Sec-WebSocket-Key",
                tungstenite::handshake::client::generate_key(),
            )
            .header("Sec-WebSocket-Version", "13")
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .header("Host", host)
            .body(())
            .map_err(|e| AgentError::InvalidUrl(e.to_string()))?;

        let (mut ws_stream, _response) = tokio_tungstenite::connect_async(request).await?;
        tracing::info!("Connected to agent service at {}", host);

        let settings_json = serde_json::to_string(settings)?;
        ws_stream.send(Message::Text(settings_json.into())).await?;
        tracing::debug!("Agent settings sent");

        Ok(ws_stream)
    }
}
