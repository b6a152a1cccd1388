//! Capability registry and tool-call types
//!
//! A capability is a named operation the voice agent can invoke with
//! structured arguments: filing a complaint, verifying a tenant, searching
//! the knowledge base. The registry is process-wide and read-mostly; it is
//! built once at startup and shared read-only across every session. The
//! relay core needs nothing from a capability beyond its advertised schema
//! and the uniform result shape.

pub mod bridge;
mod builtin;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use builtin::builtin_registry;

/// Errors a capability may raise during invocation.
///
/// The bridge converts every one of these into a failed
/// [`CapabilityResult`]; a capability fault never ends a session.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The arguments did not match the advertised parameter shape
    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    /// The capability itself failed
    #[error("{0}")]
    Failed(String),
}

/// Result type for capability invocations.
pub type CapabilityOutcome = Result<CapabilityResult, CapabilityError>;

/// Uniform result shape every capability returns.
///
/// `payload` is always a JSON object; its fields are flattened next to
/// `success` on the wire so the agent sees one flat result document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityResult {
    pub success: bool,
    #[serde(flatten)]
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CapabilityResult {
    /// A successful result carrying the given payload object.
    pub fn ok(payload: Value) -> Self {
        debug_assert!(payload.is_object(), "capability payloads are JSON objects");
        Self {
            success: true,
            payload: ensure_object(payload),
            error: None,
        }
    }

    /// A failed result with a caller-readable error message.
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: Value::Object(Default::default()),
            error: Some(error.into()),
        }
    }
}

fn ensure_object(value: Value) -> Value {
    if value.is_object() {
        value
    } else {
        Value::Object(Default::default())
    }
}

/// Advertised description of one capability: name, natural-language
/// description, JSON schema of the parameters, and whether execution
/// happens on this side of the agent connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    pub client_side: bool,
}

/// A named operation the agent can invoke.
#[async_trait]
pub trait Capability: Send + Sync {
    /// The schema advertised to the agent at session start.
    fn schema(&self) -> ToolSchema;

    /// Run the capability with the given arguments.
    async fn invoke(&self, arguments: Value) -> CapabilityOutcome;
}

/// Process-wide capability registry.
///
/// Registration order is preserved; it is the order capabilities are
/// advertised in.
#[derive(Default)]
pub struct CapabilityRegistry {
    entries: Vec<Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability. A later registration with the same name
    /// shadows the earlier one.
    pub fn register(&mut self, capability: Arc<dyn Capability>) {
        let name = capability.schema().name;
        self.entries.retain(|c| c.schema().name != name);
        self.entries.push(capability);
    }

    /// Look up a capability by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Capability>> {
        self.entries.iter().find(|c| c.schema().name == name)
    }

    /// Schemas of every registered capability, in registration order.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.entries.iter().map(|c| c.schema()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
