//! Per-call session relay
//!
//! One [`Session`] exists per phone call. It opens the agent connection,
//! sends the settings object, then runs exactly three tasks until the call
//! ends:
//!
//! - **telephony ingest** reads telephony events, re-frames caller audio
//!   through the [`FrameChunker`], and feeds the audio queue;
//! - **agent egress** drains the queue into the agent connection and closes
//!   it when the end-of-stream sentinel arrives;
//! - **agent ingress** relays agent audio back to telephony and hands
//!   control messages to the dispatcher.
//!
//! The queue is a single-producer/single-consumer FIFO owned by this
//! session alone. There is no artificial bound on it: a slow agent
//! connection grows it without limit, which is an accepted limitation of
//! the reference behavior. Teardown is closure-driven - whichever task
//! finishes first moves the session to `Closing`, the remaining tasks are
//! stopped and awaited, and both connections are closed before `Closed`.

pub mod dispatcher;

use std::fmt;
use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::core::agent::{AgentClient, AgentCommand, AgentSettings};
use crate::core::audio::{AudioFrame, FrameChunker};
use crate::handlers::telephony::messages::{TelephonyEvent, TelephonyOutbound};
use crate::state::AppState;
use tokio_tungstenite::tungstenite::Message as AgentMessage;

/// Items travelling through the session audio queue.
#[derive(Debug, Clone)]
pub enum QueueItem {
    /// One fixed-length frame of caller audio
    Frame(AudioFrame),
    /// No more frames will be produced; egress closes the agent connection
    EndOfStream,
}

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Active,
    Closing,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Initializing => write!(f, "initializing"),
            SessionState::Active => write!(f, "active"),
            SessionState::Closing => write!(f, "closing"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Shared write half of the agent connection.
///
/// Audio from the egress task and function responses from the bridge are
/// the only writers; the mutex serializes them without adding a task.
pub struct AgentTx<S> {
    sink: Arc<Mutex<S>>,
}

impl<S> Clone for AgentTx<S> {
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
        }
    }
}

impl<S> AgentTx<S>
where
    S: Sink<AgentMessage> + Unpin,
    S::Error: fmt::Display,
{
    pub fn new(sink: S) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    /// Forward one frame of audio, unmodified.
    pub async fn send_audio(&self, data: bytes::Bytes) -> Result<(), S::Error> {
        self.sink.lock().await.send(AgentMessage::Binary(data)).await
    }

    /// Send a JSON control message.
    pub async fn send_command(&self, command: &AgentCommand) -> Result<(), S::Error> {
        let json = match serde_json::to_string(command) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize agent command: {e}");
                return Ok(());
            }
        };
        self.sink.lock().await.send(AgentMessage::Text(json.into())).await
    }

    /// Close the agent connection. Safe to call when already closed.
    pub async fn close(&self) -> Result<(), S::Error> {
        self.sink.lock().await.close().await
    }
}

/// Shared write half of the telephony connection.
///
/// Written only from the ingress task (relayed audio and barge-in clears)
/// and by session teardown.
pub struct TelephonyTx<S> {
    sink: Arc<Mutex<S>>,
}

impl<S> Clone for TelephonyTx<S> {
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
        }
    }
}

impl<S> TelephonyTx<S>
where
    S: Sink<WsMessage> + Unpin,
    S::Error: fmt::Display,
{
    pub fn new(sink: S) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    /// Send one outbound telephony event as a JSON text frame.
    pub async fn send(&self, event: &TelephonyOutbound) -> Result<(), S::Error> {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize telephony event: {e}");
                return Ok(());
            }
        };
        self.sink.lock().await.send(WsMessage::Text(json.into())).await
    }

    /// Close the telephony connection. Safe to call when already closed.
    pub async fn close(&self) -> Result<(), S::Error> {
        self.sink.lock().await.close().await
    }
}

/// The full state and task set for one phone call.
pub struct Session {
    id: Uuid,
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Initializing,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to completion.
    ///
    /// Consumes the telephony socket; on return both connections are
    /// closed and no session task is left running.
    pub async fn run(mut self, telephony_socket: WebSocket, app: Arc<AppState>) {
        let span = info_span!("session", id = %self.id);
        async {
            info!(state = %self.state, "Session accepted");

            let client = match AgentClient::new(&app.config) {
                Ok(client) => client,
                Err(e) => {
                    error!("Cannot build agent client: {e}");
                    return;
                }
            };

            let settings = AgentSettings::build(&app.config, app.capabilities.schemas());
            let agent_stream = match client.connect(&settings).await {
                Ok(stream) => stream,
                Err(e) => {
                    error!("Agent connection failed: {e}");
                    let mut socket = telephony_socket;
                    let _ = socket.send(WsMessage::Close(None)).await;
                    return;
                }
            };

            self.state = SessionState::Active;
            info!(state = %self.state, "Agent connected, relay running");

            let (agent_sink, agent_rx) = agent_stream.split();
            let (telephony_sink, telephony_rx) = telephony_socket.split();

            let agent_tx = AgentTx::new(agent_sink);
            let telephony_tx = TelephonyTx::new(telephony_sink);

            let (queue_tx, queue_rx) = mpsc::unbounded_channel();
            let (sid_tx, sid_rx) = oneshot::channel();
            let chunker = FrameChunker::new(app.config.frame_bytes());

            let mut ingest = tokio::spawn(
                telephony_ingest(telephony_rx, queue_tx, sid_tx, chunker).in_current_span(),
            );
            let mut egress =
                tokio::spawn(agent_egress(queue_rx, agent_tx.clone()).in_current_span());
            let mut ingress = tokio::spawn(
                agent_ingress(
                    agent_rx,
                    telephony_tx.clone(),
                    agent_tx.clone(),
                    sid_rx,
                    app.capabilities.clone(),
                )
                .in_current_span(),
            );

            // Whichever task finishes first - normally or not - ends the call.
            tokio::select! {
                _ = &mut ingest => debug!("Telephony ingest finished first"),
                _ = &mut egress => debug!("Agent egress finished first"),
                _ = &mut ingress => debug!("Agent ingress finished first"),
            }

            self.state = SessionState::Closing;
            info!(state = %self.state, "Tearing down session tasks");

            ingest.abort();
            egress.abort();
            ingress.abort();
            for handle in [ingest, egress, ingress] {
                if let Err(e) = handle.await
                    && !e.is_cancelled()
                {
                    error!("Session task panicked: {e}");
                }
            }

            if let Err(e) = agent_tx.close().await {
                debug!("Agent connection close: {e}");
            }
            if let Err(e) = telephony_tx.close().await {
                debug!("Telephony connection close: {e}");
            }

            self.state = SessionState::Closed;
            info!(state = %self.state, "Session closed");
        }
        .instrument(span)
        .await
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Telephony ingest task.
///
/// Reads telephony events until closure or a `stop` event. Media payloads
/// on the inbound track are decoded and re-framed; every completed frame is
/// enqueued. The `start` event hands the stream id to the ingress task. On
/// exit the end-of-stream sentinel is always enqueued. A single malformed
/// message is logged and skipped, never fatal.
pub async fn telephony_ingest<St, E>(
    mut stream: St,
    queue: mpsc::UnboundedSender<QueueItem>,
    stream_sid_tx: oneshot::Sender<String>,
    mut chunker: FrameChunker,
) where
    St: Stream<Item = Result<WsMessage, E>> + Unpin,
    E: fmt::Display,
{
    let mut stream_sid_tx = Some(stream_sid_tx);

    'read: while let Some(next) = stream.next().await {
        let message = match next {
            Ok(message) => message,
            Err(e) => {
                warn!("Telephony connection error: {e}");
                break;
            }
        };

        let text = match message {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => {
                info!("Telephony connection closed by peer");
                break;
            }
            // The telephony protocol is JSON text only
            _ => continue,
        };

        let event = match serde_json::from_str::<TelephonyEvent>(&text) {
            Ok(event) => event,
            Err(e) => {
                warn!("Malformed telephony event skipped: {e}");
                continue;
            }
        };

        match event {
            TelephonyEvent::Connected | TelephonyEvent::Other => {}
            TelephonyEvent::Start { stream_sid } => {
                info!(stream_sid = %stream_sid, "Telephony stream started");
                if let Some(tx) = stream_sid_tx.take() {
                    let _ = tx.send(stream_sid);
                }
            }
            TelephonyEvent::Media { media } => {
                if !media.is_inbound() {
                    continue;
                }
                match media.decode() {
                    Ok(audio) => {
                        for frame in chunker.push(&audio) {
                            if queue
                                .send(QueueItem::Frame(AudioFrame::inbound(frame)))
                                .is_err()
                            {
                                debug!("Audio queue consumer gone");
                                break 'read;
                            }
                        }
                    }
                    Err(e) => warn!("Undecodable media payload skipped: {e}"),
                }
            }
            TelephonyEvent::Stop => {
                info!("Telephony stream stopped");
                break;
            }
        }
    }

    let _ = queue.send(QueueItem::EndOfStream);
}

/// Agent egress task.
///
/// Single consumer of the audio queue: forwards frames to the agent in
/// enqueue order; on the sentinel, closes the agent connection and
/// terminates.
pub async fn agent_egress<S>(mut queue: mpsc::UnboundedReceiver<QueueItem>, agent: AgentTx<S>)
where
    S: Sink<AgentMessage> + Unpin,
    S::Error: fmt::Display,
{
    while let Some(item) = queue.recv().await {
        match item {
            QueueItem::Frame(frame) => {
                if let Err(e) = agent.send_audio(frame.data).await {
                    warn!("Failed to forward audio to agent: {e}");
                    break;
                }
            }
            QueueItem::EndOfStream => {
                debug!("End of telephony stream, closing agent connection");
                if let Err(e) = agent.close().await {
                    debug!("Agent connection close: {e}");
                }
                break;
            }
        }
    }
}

/// Agent ingress task.
///
/// Reads the agent connection until it closes. Binary frames are wrapped
/// as telephony media events tagged with the session's stream id; text
/// frames are parsed and dispatched. Malformed JSON is dropped with a log
/// line. Any connection fault ends the task, which drives session
/// teardown.
pub async fn agent_ingress<St, TS, AS>(
    mut stream: St,
    telephony: TelephonyTx<TS>,
    agent: AgentTx<AS>,
    stream_sid_rx: oneshot::Receiver<String>,
    capabilities: Arc<crate::capabilities::CapabilityRegistry>,
) where
    St: Stream<Item = Result<AgentMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
    TS: Sink<WsMessage> + Unpin,
    TS::Error: fmt::Display,
    AS: Sink<AgentMessage> + Unpin,
    AS::Error: fmt::Display,
{
    // Outbound audio cannot be tagged until the telephony start event
    // delivers the stream id.
    let stream_sid = match stream_sid_rx.await {
        Ok(sid) => sid,
        Err(_) => {
            debug!("Telephony closed before the start event");
            return;
        }
    };

    while let Some(next) = stream.next().await {
        match next {
            Ok(AgentMessage::Binary(data)) => {
                let frame = AudioFrame::outbound(data);
                let event = TelephonyOutbound::media(&stream_sid, &frame.data);
                if let Err(e) = telephony.send(&event).await {
                    warn!("Failed to relay agent audio to telephony: {e}");
                    break;
                }
            }
            Ok(AgentMessage::Text(text)) => {
                match serde_json::from_str::<crate::core::agent::AgentEvent>(&text) {
                    Ok(event) => {
                        let keep_going = dispatcher::dispatch(
                            event,
                            &stream_sid,
                            &telephony,
                            &agent,
                            &capabilities,
                        )
                        .await;
                        if !keep_going {
                            break;
                        }
                    }
                    Err(e) => debug!("Malformed agent control message dropped: {e}"),
                }
            }
            Ok(AgentMessage::Close(_)) => {
                info!("Agent connection closed");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Agent connection error: {e}");
                break;
            }
        }
    }
}
