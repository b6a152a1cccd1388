//! Built-in hotline capabilities
//!
//! Each capability maps one-to-one to a function the voice agent can call.
//! Schemas follow the parameter shapes the agent prompt is written
//! against; descriptions are the agent-facing documentation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Capability, CapabilityOutcome, CapabilityRegistry, CapabilityResult, ToolSchema};
use crate::domain::knowledge::{KnowledgeBase, TOP_K};
use crate::domain::tenants::TenantDirectory;
use crate::domain::tickets::{CATEGORY_TABLE, TicketStore, assurance_script, sla_to_words};

/// Build the registry with every hotline capability wired to its stores.
pub fn builtin_registry(
    tenants: Arc<TenantDirectory>,
    tickets: Arc<TicketStore>,
    knowledge: Arc<KnowledgeBase>,
) -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    registry.register(Arc::new(AgentFiller));
    registry.register(Arc::new(VerifyTenant { tenants }));
    registry.register(Arc::new(GetComplaintCategories));
    registry.register(Arc::new(FileComplaint {
        tickets: tickets.clone(),
    }));
    registry.register(Arc::new(CheckComplaintStatus {
        tickets: tickets.clone(),
    }));
    registry.register(Arc::new(ListTenantComplaints { tickets }));
    registry.register(Arc::new(SearchKnowledgeBase { knowledge }));
    registry
}

// ---------------------------------------------------------------------------
// agent_filler
// ---------------------------------------------------------------------------

struct AgentFiller;

#[derive(Deserialize)]
struct AgentFillerArgs {
    message: String,
}

#[async_trait]
impl Capability for AgentFiller {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "agent_filler".to_string(),
            description: "Speak a brief holding phrase while a lookup is in progress. \
                          ALWAYS call this before any other function so the tenant isn't \
                          greeted with silence."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "Short natural phrase, e.g. 'Let me pull that up for you.'"
                    }
                },
                "required": ["message"],
            }),
            client_side: true,
        }
    }

    async fn invoke(&self, arguments: Value) -> CapabilityOutcome {
        let args: AgentFillerArgs = serde_json::from_value(arguments)?;
        Ok(CapabilityResult::ok(json!({ "message": args.message })))
    }
}

// ---------------------------------------------------------------------------
// verify_tenant
// ---------------------------------------------------------------------------

struct VerifyTenant {
    tenants: Arc<TenantDirectory>,
}

#[derive(Deserialize)]
struct VerifyTenantArgs {
    unit_number: String,
}

#[async_trait]
impl Capability for VerifyTenant {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "verify_tenant".to_string(),
            description: "Verify a caller is a registered tenant by their unit number. \
                          Call this first for every new call before filing anything."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "unit_number": {
                        "type": "string",
                        "description": "The flat or unit number the caller gave, e.g. '101'.",
                    }
                },
                "required": ["unit_number"],
            }),
            client_side: true,
        }
    }

    async fn invoke(&self, arguments: Value) -> CapabilityOutcome {
        let args: VerifyTenantArgs = serde_json::from_value(arguments)?;

        let result = match self.tenants.lookup(&args.unit_number) {
            Some(tenant) => CapabilityResult::ok(json!({
                "verified": true,
                "unit_number": args.unit_number,
                "tenant_name": tenant.name,
            })),
            None => CapabilityResult::ok(json!({
                "verified": false,
                "message": format!(
                    "I couldn't find unit {} in our system. Could you double-check that \
                     number? If you've recently moved in, I can still take your complaint \
                     and we'll verify your details afterwards.",
                    args.unit_number
                ),
            })),
        };
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// get_complaint_categories
// ---------------------------------------------------------------------------

struct GetComplaintCategories;

#[async_trait]
impl Capability for GetComplaintCategories {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_complaint_categories".to_string(),
            description: "Return the full list of available complaint categories - both \
                          emergency and non-emergency - so you can guide an uncertain \
                          caller to the right option."
                .to_string(),
            parameters: json!({"type": "object", "properties": {}}),
            client_side: true,
        }
    }

    async fn invoke(&self, _arguments: Value) -> CapabilityOutcome {
        let describe = |emergency: bool| -> Vec<Value> {
            CATEGORY_TABLE
                .iter()
                .filter(|info| info.emergency == emergency)
                .map(|info| {
                    json!({
                        "category": info.key,
                        "label": info.label,
                        "sla": sla_to_words(info.sla_hours),
                    })
                })
                .collect()
        };

        Ok(CapabilityResult::ok(json!({
            "emergency_categories": describe(true),
            "non_emergency_categories": describe(false),
        })))
    }
}

// ---------------------------------------------------------------------------
// file_complaint
// ---------------------------------------------------------------------------

struct FileComplaint {
    tickets: Arc<TicketStore>,
}

#[derive(Deserialize)]
struct FileComplaintArgs {
    unit_number: String,
    category: String,
    description: String,
    tenant_name: String,
    #[serde(default)]
    contact_number: Option<String>,
}

#[async_trait]
impl Capability for FileComplaint {
    fn schema(&self) -> ToolSchema {
        let categories: Vec<&str> = CATEGORY_TABLE.iter().map(|info| info.key).collect();
        ToolSchema {
            name: "file_complaint".to_string(),
            description: "File a new complaint (emergency or non-emergency). Returns a \
                          ticket ID, SLA, a step-by-step response plan, and a full \
                          assurance message that you MUST read aloud word-for-word to \
                          the tenant."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "unit_number": {
                        "type": "string",
                        "description": "Tenant's unit number.",
                    },
                    "category": {
                        "type": "string",
                        "enum": categories,
                        "description": "Category that best matches the issue.",
                    },
                    "description": {
                        "type": "string",
                        "description": "Verbatim description of the problem as the tenant described it.",
                    },
                    "tenant_name": {
                        "type": "string",
                        "description": "Full name of the caller.",
                    },
                    "contact_number": {
                        "type": "string",
                        "description": "Best callback number. Optional if not provided.",
                    },
                },
                "required": ["unit_number", "category", "description", "tenant_name"],
            }),
            client_side: true,
        }
    }

    async fn invoke(&self, arguments: Value) -> CapabilityOutcome {
        let args: FileComplaintArgs = serde_json::from_value(arguments)?;

        let ticket = self.tickets.file(
            &args.unit_number,
            &args.category,
            &args.description,
            &args.tenant_name,
            args.contact_number,
        );

        Ok(CapabilityResult::ok(json!({
            "ticket_id": ticket.ticket_id,
            "is_emergency": ticket.is_emergency,
            "label": ticket.label,
            "team": ticket.team,
            "sla_hours": ticket.sla_hours,
            "sla_description": sla_to_words(ticket.sla_hours),
            "response_plan": ticket.response_plan,
            "assurance_message": assurance_script(&ticket.category),
        })))
    }
}

// ---------------------------------------------------------------------------
// check_complaint_status
// ---------------------------------------------------------------------------

struct CheckComplaintStatus {
    tickets: Arc<TicketStore>,
}

#[derive(Deserialize)]
struct CheckComplaintStatusArgs {
    ticket_id: String,
}

#[async_trait]
impl Capability for CheckComplaintStatus {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "check_complaint_status".to_string(),
            description: "Check the current status and remaining SLA for an existing \
                          complaint ticket."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "ticket_id": {
                        "type": "string",
                        "description": "Ticket reference, e.g. 'TKT-A1B2C3D4'.",
                    }
                },
                "required": ["ticket_id"],
            }),
            client_side: true,
        }
    }

    async fn invoke(&self, arguments: Value) -> CapabilityOutcome {
        let args: CheckComplaintStatusArgs = serde_json::from_value(arguments)?;

        let Some(ticket) = self.tickets.get(&args.ticket_id) else {
            return Ok(CapabilityResult::ok(json!({
                "found": false,
                "message": format!(
                    "I couldn't find ticket {}. The reference starts with TKT- followed \
                     by eight characters. Would you like to check whether you have the \
                     right number?",
                    args.ticket_id
                ),
            })));
        };

        let now = time::OffsetDateTime::now_utc();
        Ok(CapabilityResult::ok(json!({
            "found": true,
            "ticket_id": ticket.ticket_id,
            "label": ticket.label,
            "status": ticket.status,
            "team": ticket.team,
            "created_at": ticket.created_at,
            "sla_description": sla_to_words(ticket.sla_hours),
            "hours_remaining": ticket.hours_remaining(now),
            "response_plan": ticket.response_plan,
            "is_emergency": ticket.is_emergency,
        })))
    }
}

// ---------------------------------------------------------------------------
// list_tenant_complaints
// ---------------------------------------------------------------------------

struct ListTenantComplaints {
    tickets: Arc<TicketStore>,
}

#[derive(Deserialize)]
struct ListTenantComplaintsArgs {
    unit_number: String,
}

#[async_trait]
impl Capability for ListTenantComplaints {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_tenant_complaints".to_string(),
            description: "List all complaints on record for a given unit number.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "unit_number": {
                        "type": "string",
                        "description": "The unit number to look up.",
                    }
                },
                "required": ["unit_number"],
            }),
            client_side: true,
        }
    }

    async fn invoke(&self, arguments: Value) -> CapabilityOutcome {
        let args: ListTenantComplaintsArgs = serde_json::from_value(arguments)?;

        let tickets = self.tickets.for_unit(&args.unit_number);
        if tickets.is_empty() {
            return Ok(CapabilityResult::ok(json!({
                "found": false,
                "message": format!(
                    "There are no logged complaints for unit {}.",
                    args.unit_number
                ),
            })));
        }

        let complaints: Vec<Value> = tickets
            .iter()
            .map(|ticket| {
                json!({
                    "ticket_id": ticket.ticket_id,
                    "label": ticket.label,
                    "status": ticket.status,
                    "created_at": ticket.created_at,
                    "sla_description": sla_to_words(ticket.sla_hours),
                })
            })
            .collect();

        Ok(CapabilityResult::ok(json!({
            "found": true,
            "unit_number": args.unit_number,
            "count": complaints.len(),
            "complaints": complaints,
        })))
    }
}

// ---------------------------------------------------------------------------
// search_knowledge_base
// ---------------------------------------------------------------------------

struct SearchKnowledgeBase {
    knowledge: Arc<KnowledgeBase>,
}

#[derive(Deserialize)]
struct SearchKnowledgeBaseArgs {
    query: String,
}

#[async_trait]
impl Capability for SearchKnowledgeBase {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_knowledge_base".to_string(),
            description: "Search the property policy documents for an answer to a \
                          tenant's question - repair responsibilities, quiet hours, \
                          what counts as an emergency, and similar."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Natural language question from the tenant.",
                    }
                },
                "required": ["query"],
            }),
            client_side: true,
        }
    }

    async fn invoke(&self, arguments: Value) -> CapabilityOutcome {
        let args: SearchKnowledgeBaseArgs = serde_json::from_value(arguments)?;

        let response = self.knowledge.search(&args.query, TOP_K);
        Ok(CapabilityResult {
            success: response.success,
            payload: json!({
                "answer": response.answer,
                "sources": response.sources,
            }),
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CapabilityRegistry {
        builtin_registry(
            Arc::new(TenantDirectory::seeded()),
            Arc::new(TicketStore::new()),
            Arc::new(KnowledgeBase::default()),
        )
    }

    #[test]
    fn test_all_builtins_registered() {
        let registry = registry();
        for name in [
            "agent_filler",
            "verify_tenant",
            "get_complaint_categories",
            "file_complaint",
            "check_complaint_status",
            "list_tenant_complaints",
            "search_knowledge_base",
        ] {
            assert!(registry.get(name).is_some(), "missing {name}");
        }
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn test_schemas_are_client_side() {
        for schema in registry().schemas() {
            assert!(schema.client_side, "{} should be client side", schema.name);
            assert!(schema.parameters.is_object());
        }
    }

    #[tokio::test]
    async fn test_verify_known_tenant() {
        let registry = registry();
        let capability = registry.get("verify_tenant").unwrap();
        let result = capability
            .invoke(json!({"unit_number": "101"}))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.payload["verified"], true);
        assert_eq!(result.payload["tenant_name"], "Priya Sharma");
    }

    #[tokio::test]
    async fn test_verify_unknown_tenant_is_still_success() {
        let registry = registry();
        let capability = registry.get("verify_tenant").unwrap();
        let result = capability
            .invoke(json!({"unit_number": "999"}))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.payload["verified"], false);
        assert!(
            result.payload["message"]
                .as_str()
                .unwrap()
                .contains("unit 999")
        );
    }

    #[tokio::test]
    async fn test_missing_arguments_raise() {
        let registry = registry();
        let capability = registry.get("verify_tenant").unwrap();
        assert!(capability.invoke(json!({})).await.is_err());
    }

    #[tokio::test]
    async fn test_file_complaint_emergency_payload() {
        let registry = registry();
        let capability = registry.get("file_complaint").unwrap();
        let result = capability
            .invoke(json!({
                "unit_number": "202",
                "category": "gas_leak",
                "description": "smell of gas",
                "tenant_name": "James O'Brien",
            }))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.payload["is_emergency"], true);
        assert_eq!(result.payload["sla_description"], "within 1 hour");
        assert!(
            result.payload["ticket_id"]
                .as_str()
                .unwrap()
                .starts_with("TKT-")
        );
        assert!(
            result.payload["assurance_message"]
                .as_str()
                .unwrap()
                .contains("emergency")
        );
    }

    #[tokio::test]
    async fn test_complaint_lifecycle_across_capabilities() {
        let registry = registry();

        let filed = registry
            .get("file_complaint")
            .unwrap()
            .invoke(json!({
                "unit_number": "305",
                "category": "plumbing",
                "description": "dripping tap",
                "tenant_name": "Aisha Patel",
            }))
            .await
            .unwrap();
        let ticket_id = filed.payload["ticket_id"].as_str().unwrap().to_string();

        let status = registry
            .get("check_complaint_status")
            .unwrap()
            .invoke(json!({"ticket_id": ticket_id}))
            .await
            .unwrap();
        assert_eq!(status.payload["found"], true);
        assert_eq!(status.payload["status"], "open");

        let listed = registry
            .get("list_tenant_complaints")
            .unwrap()
            .invoke(json!({"unit_number": "305"}))
            .await
            .unwrap();
        assert_eq!(listed.payload["count"], 1);
    }

    #[tokio::test]
    async fn test_unknown_ticket_status() {
        let registry = registry();
        let result = registry
            .get("check_complaint_status")
            .unwrap()
            .invoke(json!({"ticket_id": "TKT-NOPE0000"}))
            .await
            .unwrap();
        assert_eq!(result.payload["found"], false);
    }

    #[tokio::test]
    async fn test_categories_split_by_emergency() {
        let registry = registry();
        let result = registry
            .get("get_complaint_categories")
            .unwrap()
            .invoke(json!({}))
            .await
            .unwrap();

        let emergency = result.payload["emergency_categories"].as_array().unwrap();
        let routine = result.payload["non_emergency_categories"]
            .as_array()
            .unwrap();
        assert_eq!(emergency.len(), 8);
        assert_eq!(emergency.len() + routine.len(), CATEGORY_TABLE.len());
    }

    #[tokio::test]
    async fn test_agent_filler_echoes() {
        let registry = registry();
        let result = registry
            .get("agent_filler")
            .unwrap()
            .invoke(json!({"message": "One moment please."}))
            .await
            .unwrap();
        assert_eq!(result.payload["message"], "One moment please.");
    }

    #[tokio::test]
    async fn test_empty_knowledge_base_reports_no_answer() {
        let registry = registry();
        let result = registry
            .get("search_knowledge_base")
            .unwrap()
            .invoke(json!({"query": "what are the quiet hours"}))
            .await
            .unwrap();
        assert!(!result.success);
    }
}
