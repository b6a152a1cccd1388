pub mod capabilities;
pub mod config;
pub mod core;
pub mod domain;
pub mod handlers;
pub mod routes;
pub mod session;
pub mod state;

// Re-export commonly used items for convenience
pub use capabilities::{Capability, CapabilityRegistry, CapabilityResult, ToolSchema};
pub use config::ServerConfig;
pub use state::AppState;
