//! Event emitter
//!
//! Thin adapter between the classifier and the external analytics sink.
//! Events are forwarded synchronously, in call order, and only while a
//! session token is active. The emitter also keeps the seek and buffer
//! intervals paired: a `seeked` without an open `seeking` (or a second
//! `seeking` while one is open) never reaches the sink, and likewise for
//! `buffered`/`buffering`.

use crate::{
    event::{CanonicalEvent, EventName},
    types::PlayerToken,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Configuration handed to the sink when a session opens
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// The sink must not infer rebuffering from playhead stalls
    pub disable_playhead_rebuffer_tracking: bool,
    /// Device, host and identity metadata
    pub data: Map<String, Value>,
}

/// Downstream analytics dispatcher.
///
/// Fire-and-forget: implementations must not block the callback thread.
pub trait AnalyticsSink: Send + Sync {
    /// A new session token was allocated
    fn configure(&self, token: &PlayerToken, config: &SinkConfig) {
        let _ = (token, config);
    }

    /// Deliver one canonical event
    fn dispatch(&self, token: &PlayerToken, event: &CanonicalEvent);
}

/// What happened to an emitted event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    /// Forwarded to the sink
    Dispatched,
    /// Dropped: no active session
    NoSession,
    /// Dropped: would break seek/buffer pairing
    Unpaired,
}

/// Session-gated sink adapter
pub struct Emitter {
    sink: Arc<dyn AnalyticsSink>,
    token: Option<PlayerToken>,
    seek_open: bool,
    buffer_open: bool,
    dispatched: u64,
}

impl Emitter {
    pub fn new(sink: Arc<dyn AnalyticsSink>) -> Self {
        Self {
            sink,
            token: None,
            seek_open: false,
            buffer_open: false,
            dispatched: 0,
        }
    }

    /// Active session token
    pub fn token(&self) -> Option<PlayerToken> {
        self.token
    }

    pub fn is_active(&self) -> bool {
        self.token.is_some()
    }

    /// Events forwarded since creation
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Bind a new token and configure the sink for it.
    ///
    /// Returns the token it replaced, if any.
    pub fn open(&mut self, token: PlayerToken, config: &SinkConfig) -> Option<PlayerToken> {
        self.reset_intervals();
        self.sink.configure(&token, config);
        self.token.replace(token)
    }

    /// Unbind the token; later events are dropped
    pub fn close(&mut self) -> Option<PlayerToken> {
        self.reset_intervals();
        self.token.take()
    }

    /// Forward an event under the active token
    pub fn emit(&mut self, event: &CanonicalEvent) -> Emission {
        let Some(token) = self.token else {
            return Emission::NoSession;
        };
        if !self.admit(event.name) {
            return Emission::Unpaired;
        }
        self.sink.dispatch(&token, event);
        self.dispatched += 1;
        Emission::Dispatched
    }

    fn admit(&mut self, name: EventName) -> bool {
        match name {
            EventName::Seeking => !std::mem::replace(&mut self.seek_open, true),
            EventName::Seeked => std::mem::replace(&mut self.seek_open, false),
            EventName::Buffering => !std::mem::replace(&mut self.buffer_open, true),
            EventName::Buffered => std::mem::replace(&mut self.buffer_open, false),
            _ => true,
        }
    }

    fn reset_intervals(&mut self) {
        self.seek_open = false;
        self.buffer_open = false;
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("token", &self.token)
            .field("seek_open", &self.seek_open)
            .field("buffer_open", &self.buffer_open)
            .field("dispatched", &self.dispatched)
            .finish()
    }
}
