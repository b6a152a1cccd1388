//! Domain state behind the capability registry
//!
//! These stores hold the mutable state the capabilities operate on. They
//! are explicit, injected dependencies - never ambient globals - and each
//! record has a single owner:
//!
//! - `tenants` - read-only seeded tenant directory
//! - `tickets` - concurrent complaint ticket store with the category/SLA
//!   tables and assurance scripts
//! - `knowledge` - plain-text policy documents chunked into a searchable
//!   index once at startup

pub mod knowledge;
pub mod tenants;
pub mod tickets;
