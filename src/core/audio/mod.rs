//! Fixed-duration audio framing
//!
//! The telephony leg delivers audio in whatever payload sizes the provider
//! chooses; the agent service expects a steady stream of fixed-duration
//! frames. [`FrameChunker`] sits between the two: it buffers arbitrary-sized
//! inputs and emits frames of exactly `frame_bytes`, holding any remainder
//! for the next input. It is pure and synchronous; all I/O happens in the
//! session tasks that feed and drain it.

use bytes::Bytes;

/// Direction of an audio frame relative to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioDirection {
    /// Caller audio travelling toward the agent
    Inbound,
    /// Agent audio travelling toward the caller
    Outbound,
}

/// An immutable slice of raw audio tagged with its direction.
///
/// Frames handed to the egress task always have exactly the configured
/// length; partial remainders stay inside the chunker and are never
/// forwarded.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub data: Bytes,
    pub direction: AudioDirection,
}

impl AudioFrame {
    pub fn inbound(data: Bytes) -> Self {
        Self {
            data,
            direction: AudioDirection::Inbound,
        }
    }

    pub fn outbound(data: Bytes) -> Self {
        Self {
            data,
            direction: AudioDirection::Outbound,
        }
    }
}

/// Re-assembles arbitrary-sized audio payloads into fixed-length frames.
#[derive(Debug)]
pub struct FrameChunker {
    frame_bytes: usize,
    residual: Vec<u8>,
}

impl FrameChunker {
    /// Create a chunker emitting frames of exactly `frame_bytes`.
    pub fn new(frame_bytes: usize) -> Self {
        debug_assert!(frame_bytes > 0, "frame size must be non-zero");
        Self {
            frame_bytes,
            residual: Vec::with_capacity(frame_bytes * 2),
        }
    }

    /// Append a payload and drain every complete frame it unlocks.
    ///
    /// Returns the completed frames in order. Whatever does not fill a
    /// whole frame stays buffered for the next call.
    pub fn push(&mut self, payload: &[u8]) -> Vec<Bytes> {
        self.residual.extend_from_slice(payload);

        let mut frames = Vec::new();
        while self.residual.len() >= self.frame_bytes {
            let frame: Vec<u8> = self.residual.drain(..self.frame_bytes).collect();
            frames.push(Bytes::from(frame));
        }
        frames
    }

    /// Bytes currently buffered, always strictly less than one frame after
    /// any `push` returns.
    pub fn residual_len(&self) -> usize {
        self.residual.len()
    }

    /// The configured frame length in bytes.
    pub fn frame_bytes(&self) -> usize {
        self.frame_bytes
    }
}
