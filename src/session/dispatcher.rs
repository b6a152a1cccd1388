//! Agent control-message dispatcher
//!
//! Stateless switch over the control messages the agent ingress task
//! parses. Transcripts and informational events are logged; barge-in is
//! answered immediately with a telephony `clear`; function-call requests
//! are delegated to the bridge; agent warnings and errors are logged at
//! elevated severity without ending the session.

use std::fmt;

use axum::extract::ws::Message as WsMessage;
use futures_util::Sink;
use tokio_tungstenite::tungstenite::Message as AgentMessage;
use tracing::{debug, error, info, warn};

use super::{AgentTx, TelephonyTx};
use crate::capabilities::{CapabilityRegistry, bridge};
use crate::core::agent::AgentEvent;
use crate::handlers::telephony::messages::TelephonyOutbound;

/// Handle one control message.
///
/// Returns `false` when the ingress task should stop because a connection
/// write failed; every message-level problem is absorbed here.
pub async fn dispatch<TS, AS>(
    event: AgentEvent,
    stream_sid: &str,
    telephony: &TelephonyTx<TS>,
    agent: &AgentTx<AS>,
    capabilities: &CapabilityRegistry,
) -> bool
where
    TS: Sink<WsMessage> + Unpin,
    TS::Error: fmt::Display,
    AS: Sink<AgentMessage> + Unpin,
    AS::Error: fmt::Display,
{
    match event {
        AgentEvent::ConversationText { role, content } => {
            info!(role = %role, "{content}");
            true
        }

        // Barge-in is the latency-critical path: the clear goes out here,
        // synchronously, before any further agent audio is relayed.
        AgentEvent::UserStartedSpeaking => {
            if let Err(e) = telephony.send(&TelephonyOutbound::clear(stream_sid)).await {
                warn!("Failed to send barge-in clear to telephony: {e}");
                return false;
            }
            debug!("Barge-in: cleared queued playback");
            true
        }

        AgentEvent::FunctionCallRequest(request) => {
            bridge::handle_function_call(request, agent, capabilities).await
        }

        AgentEvent::Welcome { request_id } => {
            info!(request_id = ?request_id, "Agent event: Welcome");
            true
        }
        AgentEvent::SettingsApplied => {
            info!("Agent event: SettingsApplied");
            true
        }
        AgentEvent::AgentThinking { .. } => {
            info!("Agent event: AgentThinking");
            true
        }
        AgentEvent::AgentAudioDone => {
            info!("Agent event: AgentAudioDone");
            true
        }

        AgentEvent::FunctionCallResponse { id, name, .. } => {
            info!(id = ?id, name = ?name, "Observed server-side function response");
            true
        }

        AgentEvent::AgentWarning {
            description,
            message,
        } => {
            warn!(
                "Agent warning: {}",
                description.or(message).unwrap_or_default()
            );
            true
        }
        AgentEvent::AgentError {
            description,
            message,
        } => {
            error!(
                "Agent error: {}",
                description.or(message).unwrap_or_default()
            );
            true
        }

        AgentEvent::Unknown => {
            debug!("Unhandled agent event kind");
            true
        }
    }
}
