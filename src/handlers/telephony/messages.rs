//! Telephony WebSocket message types
//!
//! Inbound events arrive as JSON with an `event` discriminator
//! (`connected`, `start`, `media`, `stop`); outbound events carry agent
//! audio back to the caller or clear queued playback on barge-in.
//!
//! Historically two relay implementations disagreed on the stream id field
//! (`streamSid` vs `streamsid`) and on the interrupt event name (`clear` vs
//! `barge-in`). This schema is the unification: `streamSid` is canonical,
//! the lowercase spelling is accepted on input, and the interrupt event is
//! always emitted as `clear`.

use base64::prelude::*;
use serde::{Deserialize, Serialize};

/// Inbound telephony events, one JSON object per WebSocket text frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyEvent {
    /// Initial handshake confirmation; carries nothing the relay needs
    Connected,

    /// Stream start; records the id used to tag outbound frames
    Start {
        #[serde(rename = "streamSid", alias = "streamsid")]
        stream_sid: String,
    },

    /// A slice of call audio
    Media { media: MediaPayload },

    /// The call ended on the telephony side
    Stop,

    /// Any other event kind (marks, DTMF); ignored by the relay
    #[serde(other)]
    Other,
}

/// Payload of a `media` event.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaPayload {
    /// Base64-encoded fixed-codec audio
    pub payload: String,

    /// Which leg the audio belongs to (`inbound` from the caller,
    /// `outbound` echoes of our own playback)
    #[serde(default)]
    pub track: Option<String>,
}

impl MediaPayload {
    /// Whether this payload is caller audio that should reach the agent.
    ///
    /// Providers that do not send a `track` field only ever send caller
    /// audio, so a missing track counts as inbound.
    pub fn is_inbound(&self) -> bool {
        self.track.as_deref().is_none_or(|t| t == "inbound")
    }

    /// Decode the base64 audio payload.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64_STANDARD.decode(&self.payload)
    }
}

/// Outbound telephony events emitted by the relay.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyOutbound {
    /// Agent audio for playback to the caller
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMedia,
    },

    /// Barge-in interrupt: discard queued playback audio immediately
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

/// Media body of an outbound `media` event.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMedia {
    /// Base64-encoded audio
    pub payload: String,
}

impl TelephonyOutbound {
    /// Wrap raw agent audio as a playback event for the given stream.
    pub fn media(stream_sid: &str, audio: &[u8]) -> Self {
        Self::Media {
            stream_sid: stream_sid.to_string(),
            media: OutboundMedia {
                payload: BASE64_STANDARD.encode(audio),
            },
        }
    }

    /// Build the interrupt event for the given stream.
    pub fn clear(stream_sid: &str) -> Self {
        Self::Clear {
            stream_sid: stream_sid.to_string(),
        }
    }
}
