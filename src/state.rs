//! Shared application state
//!
//! One `AppState` is created at startup and shared by every session. It owns
//! the process-wide, read-mostly resources: the server configuration and the
//! capability registry (with the domain stores and the knowledge base wired
//! into the capabilities behind it).

use std::sync::Arc;

use crate::capabilities::{CapabilityRegistry, builtin_registry};
use crate::config::ServerConfig;
use crate::domain::knowledge::KnowledgeBase;
use crate::domain::tenants::TenantDirectory;
use crate::domain::tickets::TicketStore;

/// Process-wide state shared across sessions.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Capability registry advertised to the agent and used by the bridge
    pub capabilities: Arc<CapabilityRegistry>,
}

impl AppState {
    /// Create the application state.
    ///
    /// The knowledge base must already be built; index construction is a
    /// one-time startup step, not a per-session concern.
    pub fn new(config: ServerConfig, knowledge: Arc<KnowledgeBase>) -> Self {
        let tenants = Arc::new(TenantDirectory::seeded());
        let tickets = Arc::new(TicketStore::new());
        let capabilities = Arc::new(builtin_registry(tenants, tickets, knowledge));

        Self {
            config,
            capabilities,
        }
    }
}
