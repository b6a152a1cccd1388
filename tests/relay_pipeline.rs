//! Relay pipeline tests
//!
//! Drives the session tasks against scripted connections: telephony ingest
//! feeding the audio queue, agent egress draining it, and agent ingress
//! relaying audio and barge-in interrupts back to telephony.

mod common;

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::ws::Message as WsMessage;
use base64::prelude::*;
use futures_util::stream;
use serde_json::{Value, json};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message as AgentMessage;

use common::RecordingSink;
use hotline_gateway::capabilities::{CapabilityRegistry, builtin_registry};
use hotline_gateway::core::audio::FrameChunker;
use hotline_gateway::domain::{
    knowledge::KnowledgeBase, tenants::TenantDirectory, tickets::TicketStore,
};
use hotline_gateway::session::{
    AgentTx, QueueItem, TelephonyTx, agent_egress, agent_ingress, telephony_ingest,
};

const FRAME_BYTES: usize = 160;

fn text(value: Value) -> Result<WsMessage, Infallible> {
    Ok(WsMessage::Text(value.to_string().into()))
}

fn media_event(audio: &[u8]) -> Result<WsMessage, Infallible> {
    text(json!({
        "event": "media",
        "media": {"track": "inbound", "payload": BASE64_STANDARD.encode(audio)},
    }))
}

fn test_registry() -> Arc<CapabilityRegistry> {
    Arc::new(builtin_registry(
        Arc::new(TenantDirectory::seeded()),
        Arc::new(TicketStore::new()),
        Arc::new(KnowledgeBase::default()),
    ))
}

/// Run telephony ingest over scripted events and collect the queue.
async fn run_ingest(events: Vec<Result<WsMessage, Infallible>>) -> (Vec<QueueItem>, Option<String>) {
    let (queue_tx, mut queue_rx) = mpsc::unbounded_channel();
    let (sid_tx, sid_rx) = oneshot::channel();

    telephony_ingest(
        stream::iter(events),
        queue_tx,
        sid_tx,
        FrameChunker::new(FRAME_BYTES),
    )
    .await;

    let mut items = Vec::new();
    while let Ok(item) = queue_rx.try_recv() {
        items.push(item);
    }
    (items, sid_rx.await.ok())
}

#[tokio::test]
async fn test_ingest_chunks_frames_and_appends_sentinel() {
    // 400 bytes arrive in two media events; 160-byte framing leaves an
    // 80-byte residual that must never be forwarded.
    let audio: Vec<u8> = (0..=255).cycle().take(400).map(|b| b as u8).collect();
    let events = vec![
        text(json!({"event": "connected"})),
        text(json!({"event": "start", "streamSid": "MZ1"})),
        media_event(&audio[..250]),
        media_event(&audio[250..]),
        text(json!({"event": "stop"})),
    ];

    let (items, sid) = run_ingest(events).await;
    assert_eq!(sid.as_deref(), Some("MZ1"));

    let frames: Vec<_> = items
        .iter()
        .filter_map(|item| match item {
            QueueItem::Frame(frame) => Some(frame.data.clone()),
            QueueItem::EndOfStream => None,
        })
        .collect();
    assert_eq!(frames.len(), 2);
    assert!(frames.iter().all(|f| f.len() == FRAME_BYTES));

    // Conservation: forwarded frames are a prefix of the input
    let forwarded: Vec<u8> = frames.concat();
    assert_eq!(&forwarded[..], &audio[..320]);

    // Sentinel is last
    assert!(matches!(items.last(), Some(QueueItem::EndOfStream)));
}

#[tokio::test]
async fn test_ingest_skips_malformed_and_outbound_media() {
    let audio = vec![7u8; FRAME_BYTES];
    let events = vec![
        text(json!({"event": "start", "streamSid": "MZ2"})),
        Ok(WsMessage::Text("{not json".into())),
        text(json!({"event": "media", "media": {"track": "outbound", "payload": BASE64_STANDARD.encode(&audio)}})),
        text(json!({"event": "media", "media": {"track": "inbound", "payload": "!!!not-base64!!!"}})),
        media_event(&audio),
        text(json!({"event": "stop"})),
    ];

    let (items, _) = run_ingest(events).await;
    let frames: Vec<_> = items
        .iter()
        .filter(|item| matches!(item, QueueItem::Frame(_)))
        .collect();
    // Only the valid inbound media event produced a frame
    assert_eq!(frames.len(), 1);
    assert!(matches!(items.last(), Some(QueueItem::EndOfStream)));
}

#[tokio::test]
async fn test_ingest_closure_without_stop_still_sends_sentinel() {
    let events = vec![text(json!({"event": "start", "streamSid": "MZ3"}))];
    let (items, _) = run_ingest(events).await;
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], QueueItem::EndOfStream));
}

#[tokio::test]
async fn test_egress_preserves_fifo_order_and_closes_once() {
    let (queue_tx, queue_rx) = mpsc::unbounded_channel();

    let mut expected = Vec::new();
    for i in 0..32u8 {
        let frame = bytes::Bytes::from(vec![i; FRAME_BYTES]);
        expected.push(frame.clone());
        queue_tx
            .send(QueueItem::Frame(
                hotline_gateway::core::audio::AudioFrame::inbound(frame),
            ))
            .unwrap();
    }
    queue_tx.send(QueueItem::EndOfStream).unwrap();
    // Anything after the sentinel must never be forwarded
    queue_tx
        .send(QueueItem::Frame(
            hotline_gateway::core::audio::AudioFrame::inbound(bytes::Bytes::from(vec![
                99;
                FRAME_BYTES
            ])),
        ))
        .unwrap();
    drop(queue_tx);

    let sink = RecordingSink::<AgentMessage>::new();
    let (items, closes) = sink.handles();
    agent_egress(queue_rx, AgentTx::new(sink)).await;

    let sent = items.lock().unwrap();
    assert_eq!(sent.len(), 32, "all frames before the sentinel, none after");
    for (i, message) in sent.iter().enumerate() {
        match message {
            AgentMessage::Binary(data) => assert_eq!(data, &expected[i]),
            other => panic!("expected binary frame, got {other:?}"),
        }
    }
    assert_eq!(closes.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stop_mid_call_propagates_to_agent_close() {
    // Full scenario: telephony sends stop mid-call, the sentinel unwinds
    // egress, and the agent connection is closed exactly once.
    let audio = vec![1u8; FRAME_BYTES * 2];
    let events = vec![
        text(json!({"event": "start", "streamSid": "MZ4"})),
        media_event(&audio),
        text(json!({"event": "stop"})),
        // Media after stop must be ignored
        media_event(&audio),
    ];

    let (queue_tx, queue_rx) = mpsc::unbounded_channel();
    let (sid_tx, _sid_rx) = oneshot::channel();
    telephony_ingest(
        stream::iter(events),
        queue_tx,
        sid_tx,
        FrameChunker::new(FRAME_BYTES),
    )
    .await;

    let sink = RecordingSink::<AgentMessage>::new();
    let (items, closes) = sink.handles();
    agent_egress(queue_rx, AgentTx::new(sink)).await;

    assert_eq!(items.lock().unwrap().len(), 2);
    assert_eq!(closes.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_ingress_relays_audio_tagged_with_stream_sid() {
    let audio = bytes::Bytes::from(vec![5u8; 320]);
    let messages: Vec<Result<AgentMessage, tokio_tungstenite::tungstenite::Error>> =
        vec![Ok(AgentMessage::Binary(audio.clone()))];

    let telephony_sink = RecordingSink::<WsMessage>::new();
    let (sent, _) = telephony_sink.handles();
    let agent_sink = RecordingSink::<AgentMessage>::new();

    let (sid_tx, sid_rx) = oneshot::channel();
    sid_tx.send("MZ5".to_string()).unwrap();

    agent_ingress(
        stream::iter(messages),
        TelephonyTx::new(telephony_sink),
        AgentTx::new(agent_sink),
        sid_rx,
        test_registry(),
    )
    .await;

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let WsMessage::Text(text) = &sent[0] else {
        panic!("expected text frame");
    };
    let event: Value = serde_json::from_str(text.as_str()).unwrap();
    assert_eq!(event["event"], "media");
    assert_eq!(event["streamSid"], "MZ5");
    assert_eq!(
        event["media"]["payload"],
        BASE64_STANDARD.encode(&audio[..])
    );
}

#[tokio::test]
async fn test_barge_in_clear_precedes_following_audio() {
    // Audio, then the caller starts speaking, then more audio from the
    // same burst: the clear must land between them, never after.
    let burst1 = bytes::Bytes::from(vec![1u8; 160]);
    let burst2 = bytes::Bytes::from(vec![2u8; 160]);
    let messages: Vec<Result<AgentMessage, tokio_tungstenite::tungstenite::Error>> = vec![
        Ok(AgentMessage::Binary(burst1)),
        Ok(AgentMessage::Text(
            json!({"type": "UserStartedSpeaking"}).to_string().into(),
        )),
        Ok(AgentMessage::Binary(burst2)),
    ];

    let telephony_sink = RecordingSink::<WsMessage>::new();
    let (sent, _) = telephony_sink.handles();

    let (sid_tx, sid_rx) = oneshot::channel();
    sid_tx.send("MZ6".to_string()).unwrap();

    agent_ingress(
        stream::iter(messages),
        TelephonyTx::new(telephony_sink),
        AgentTx::new(RecordingSink::<AgentMessage>::new()),
        sid_rx,
        test_registry(),
    )
    .await;

    let sent = sent.lock().unwrap();
    let kinds: Vec<String> = sent
        .iter()
        .map(|message| {
            let WsMessage::Text(text) = message else {
                panic!("expected text frame");
            };
            let event: Value = serde_json::from_str(text.as_str()).unwrap();
            event["event"].as_str().unwrap().to_string()
        })
        .collect();

    assert_eq!(kinds, vec!["media", "clear", "media"]);
}

#[tokio::test]
async fn test_ingress_drops_malformed_control_frames() {
    let messages: Vec<Result<AgentMessage, tokio_tungstenite::tungstenite::Error>> = vec![
        Ok(AgentMessage::Text("{broken json".into())),
        Ok(AgentMessage::Binary(bytes::Bytes::from(vec![9u8; 160]))),
    ];

    let telephony_sink = RecordingSink::<WsMessage>::new();
    let (sent, _) = telephony_sink.handles();

    let (sid_tx, sid_rx) = oneshot::channel();
    sid_tx.send("MZ7".to_string()).unwrap();

    agent_ingress(
        stream::iter(messages),
        TelephonyTx::new(telephony_sink),
        AgentTx::new(RecordingSink::<AgentMessage>::new()),
        sid_rx,
        test_registry(),
    )
    .await;

    // The malformed frame is dropped; the audio after it still relays
    assert_eq!(sent.lock().unwrap().len(), 1);
}
