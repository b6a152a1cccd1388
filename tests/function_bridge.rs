//! Function-call bridge scenarios
//!
//! Drives the agent ingress task with scripted `FunctionCallRequest`
//! control frames and checks the correlated responses that come back on
//! the agent connection.

mod common;

use std::sync::Arc;

use futures_util::stream;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message as AgentMessage;

use axum::extract::ws::Message as WsMessage;
use common::RecordingSink;
use hotline_gateway::capabilities::{CapabilityRegistry, builtin_registry};
use hotline_gateway::domain::{
    knowledge::KnowledgeBase, tenants::TenantDirectory, tickets::TicketStore,
};
use hotline_gateway::session::{AgentTx, TelephonyTx, agent_ingress};

fn test_registry() -> Arc<CapabilityRegistry> {
    Arc::new(builtin_registry(
        Arc::new(TenantDirectory::seeded()),
        Arc::new(TicketStore::new()),
        Arc::new(KnowledgeBase::default()),
    ))
}

fn request(value: Value) -> Result<AgentMessage, tokio_tungstenite::tungstenite::Error> {
    Ok(AgentMessage::Text(value.to_string().into()))
}

/// Run the ingress task over scripted control frames and return every
/// response sent back to the agent, parsed.
async fn run_requests(
    messages: Vec<Result<AgentMessage, tokio_tungstenite::tungstenite::Error>>,
) -> Vec<Value> {
    let agent_sink = RecordingSink::<AgentMessage>::new();
    let (responses, _) = agent_sink.handles();

    let (sid_tx, sid_rx) = oneshot::channel();
    sid_tx.send("MZ1".to_string()).unwrap();

    agent_ingress(
        stream::iter(messages),
        TelephonyTx::new(RecordingSink::<WsMessage>::new()),
        AgentTx::new(agent_sink),
        sid_rx,
        test_registry(),
    )
    .await;

    let responses = responses.lock().unwrap();
    responses
        .iter()
        .map(|message| {
            let AgentMessage::Text(text) = message else {
                panic!("expected text response, got {message:?}");
            };
            serde_json::from_str(text.as_str()).unwrap()
        })
        .collect()
}

#[tokio::test]
async fn test_verify_tenant_scenario() {
    let responses = run_requests(vec![request(json!({
        "type": "FunctionCallRequest",
        "id": "c1",
        "name": "verify_tenant",
        "arguments": {"unit_number": "101"},
        "client_side": true,
    }))])
    .await;

    assert_eq!(responses.len(), 1);
    let response = &responses[0];
    assert_eq!(response["type"], "FunctionCallResponse");
    assert_eq!(response["id"], "c1");
    assert_eq!(response["name"], "verify_tenant");

    let content: Value = serde_json::from_str(response["content"].as_str().unwrap()).unwrap();
    assert_eq!(content["success"], true);
    assert_eq!(content["verified"], true);
    assert_eq!(content["unit_number"], "101");
}

#[tokio::test]
async fn test_file_complaint_gas_leak_scenario() {
    let responses = run_requests(vec![request(json!({
        "type": "FunctionCallRequest",
        "id": "c2",
        "name": "file_complaint",
        "arguments": {
            "unit_number": "202",
            "category": "gas_leak",
            "description": "smell of gas",
            "tenant_name": "James O'Brien",
        },
        "client_side": true,
    }))])
    .await;

    assert_eq!(responses.len(), 1);
    let response = &responses[0];
    assert_eq!(response["id"], "c2");

    let content: Value = serde_json::from_str(response["content"].as_str().unwrap()).unwrap();
    assert_eq!(content["success"], true);
    assert_eq!(content["is_emergency"], true);
    assert!(content["ticket_id"].as_str().unwrap().starts_with("TKT-"));
    assert_eq!(content["sla_description"], "within 1 hour");
}

#[tokio::test]
async fn test_unknown_function_yields_failed_response_not_a_fault() {
    let responses = run_requests(vec![request(json!({
        "type": "FunctionCallRequest",
        "id": "c3",
        "name": "summon_elevator_music",
        "arguments": {},
        "client_side": true,
    }))])
    .await;

    assert_eq!(responses.len(), 1);
    let content: Value =
        serde_json::from_str(responses[0]["content"].as_str().unwrap()).unwrap();
    assert_eq!(content["success"], false);
    assert!(
        content["error"]
            .as_str()
            .unwrap()
            .contains("Unknown function")
    );
}

#[tokio::test]
async fn test_capability_fault_still_echoes_correlation_id() {
    // Missing required arguments raise inside the capability; the bridge
    // must convert that into a failed result carrying the same id.
    let responses = run_requests(vec![request(json!({
        "type": "FunctionCallRequest",
        "id": "c4",
        "name": "verify_tenant",
        "arguments": {},
        "client_side": true,
    }))])
    .await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], "c4");
    let content: Value =
        serde_json::from_str(responses[0]["content"].as_str().unwrap()).unwrap();
    assert_eq!(content["success"], false);
    assert!(content["error"].is_string());
}

#[tokio::test]
async fn test_server_side_request_is_observed_not_answered() {
    let responses = run_requests(vec![request(json!({
        "type": "FunctionCallRequest",
        "id": "c5",
        "name": "verify_tenant",
        "arguments": {"unit_number": "101"},
        "client_side": false,
    }))])
    .await;

    assert!(responses.is_empty());
}

#[tokio::test]
async fn test_distinct_correlation_ids_answered_independently() {
    let responses = run_requests(vec![
        request(json!({
            "type": "FunctionCallRequest",
            "id": "c6",
            "name": "agent_filler",
            "arguments": {"message": "One moment."},
            "client_side": true,
        })),
        request(json!({
            "type": "FunctionCallRequest",
            "id": "c7",
            "name": "get_complaint_categories",
            "arguments": {},
            "client_side": true,
        })),
    ])
    .await;

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], "c6");
    assert_eq!(responses[1]["id"], "c7");
}
