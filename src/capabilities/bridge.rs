//! Tool-call bridge
//!
//! Executes capability invocations requested by the agent and sends back
//! the correlated response. Unknown names and capability faults both
//! become failed results; nothing that happens in here can end a session
//! except the response write itself failing.

use std::fmt;

use futures_util::Sink;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message as AgentMessage;
use tracing::{error, info, warn};

use super::{CapabilityRegistry, CapabilityResult};
use crate::core::agent::{AgentCommand, FunctionCallRequest};
use crate::session::AgentTx;

/// Execute a named capability, converting every fault into a failed
/// result.
pub async fn execute(
    capabilities: &CapabilityRegistry,
    name: &str,
    arguments: Value,
) -> CapabilityResult {
    let Some(capability) = capabilities.get(name) else {
        warn!(function = name, "Unknown function requested");
        return CapabilityResult::fail(format!("Unknown function: {name}"));
    };

    match capability.invoke(arguments).await {
        Ok(result) => {
            info!(function = name, success = result.success, "Function executed");
            result
        }
        Err(e) => {
            error!(function = name, "Function raised: {e}");
            CapabilityResult::fail(e.to_string())
        }
    }
}

/// Handle one `FunctionCallRequest` end-to-end.
///
/// Requests flagged for remote execution are observed only. Everything
/// else is executed and answered with a `FunctionCallResponse` carrying
/// the same correlation id, whatever the outcome. Returns `false` only
/// when the response could not be written to the agent connection.
pub async fn handle_function_call<S>(
    request: FunctionCallRequest,
    agent: &AgentTx<S>,
    capabilities: &CapabilityRegistry,
) -> bool
where
    S: Sink<AgentMessage> + Unpin,
    S::Error: fmt::Display,
{
    info!(
        function = %request.name,
        id = %request.id,
        "Tool call requested"
    );

    if !request.client_side {
        info!(function = %request.name, "Server-side execution, observing only");
        return true;
    }

    let result = execute(capabilities, &request.name, request.arguments).await;
    let content = serde_json::to_string(&result)
        .unwrap_or_else(|_| r#"{"success":false,"error":"result serialization failed"}"#.into());

    let response = AgentCommand::FunctionCallResponse {
        id: request.id,
        name: request.name,
        content,
    };
    if let Err(e) = agent.send_command(&response).await {
        warn!("Failed to send function response to agent: {e}");
        return false;
    }
    true
}
