//! Analytics sink implementations
//!
//! - [`RecordingSink`]: keeps every dispatch in memory, with sequence
//!   numbers and timestamps
//! - [`ChannelSink`]: forwards to a tokio channel for async processing
//! - [`TracingSink`]: logs dispatches through `tracing`

use crate::{
    emitter::{AnalyticsSink, SinkConfig},
    event::{CanonicalEvent, EventName},
    types::PlayerToken,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// A dispatched event with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRecord {
    /// Sequence number across all tokens
    pub sequence: u64,
    pub token: PlayerToken,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: CanonicalEvent,
}

#[derive(Debug, Default)]
struct Recorded {
    configs: Vec<(PlayerToken, SinkConfig)>,
    records: Vec<DispatchRecord>,
}

/// In-memory sink
#[derive(Debug, Default)]
pub struct RecordingSink {
    inner: Mutex<Recorded>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        // A panicking test thread must not hide what was recorded.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All dispatch records, in order
    pub fn records(&self) -> Vec<DispatchRecord> {
        self.lock().records.clone()
    }

    /// All dispatched events, in order
    pub fn events(&self) -> Vec<CanonicalEvent> {
        self.lock().records.iter().map(|r| r.event.clone()).collect()
    }

    /// Names of all dispatched events, in order
    pub fn names(&self) -> Vec<EventName> {
        self.lock().records.iter().map(|r| r.event.name).collect()
    }

    /// Names dispatched under one token
    pub fn names_for(&self, token: &PlayerToken) -> Vec<EventName> {
        self.lock()
            .records
            .iter()
            .filter(|r| &r.token == token)
            .map(|r| r.event.name)
            .collect()
    }

    /// Tokens the sink was configured for, in order
    pub fn configured_tokens(&self) -> Vec<PlayerToken> {
        self.lock().configs.iter().map(|(token, _)| *token).collect()
    }

    /// Configuration received for a token
    pub fn config_for(&self, token: &PlayerToken) -> Option<SinkConfig> {
        self.lock()
            .configs
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, config)| config.clone())
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.records.clear();
        inner.configs.clear();
    }
}

impl AnalyticsSink for RecordingSink {
    fn configure(&self, token: &PlayerToken, config: &SinkConfig) {
        self.lock().configs.push((*token, config.clone()));
    }

    fn dispatch(&self, token: &PlayerToken, event: &CanonicalEvent) {
        let mut inner = self.lock();
        let sequence = inner.records.len() as u64 + 1;
        inner.records.push(DispatchRecord {
            sequence,
            token: *token,
            recorded_at: Utc::now(),
            event: event.clone(),
        });
    }
}

/// Message delivered by [`ChannelSink`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkMessage {
    Configure { token: PlayerToken, config: SinkConfig },
    Dispatch { token: PlayerToken, event: CanonicalEvent },
}

/// Sink forwarding to an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkMessage>,
}

impl ChannelSink {
    /// Create the sink and the receiving end
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AnalyticsSink for ChannelSink {
    fn configure(&self, token: &PlayerToken, config: &SinkConfig) {
        let _ = self.tx.send(SinkMessage::Configure {
            token: *token,
            config: config.clone(),
        });
    }

    fn dispatch(&self, token: &PlayerToken, event: &CanonicalEvent) {
        // Receiver gone means nobody is listening; dropping is correct.
        let _ = self.tx.send(SinkMessage::Dispatch {
            token: *token,
            event: event.clone(),
        });
    }
}

/// Sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn configure(&self, token: &PlayerToken, config: &SinkConfig) {
        info!(
            token = %token,
            fields = config.data.len(),
            disable_playhead_rebuffer_tracking = config.disable_playhead_rebuffer_tracking,
            "Analytics session configured"
        );
    }

    fn dispatch(&self, token: &PlayerToken, event: &CanonicalEvent) {
        debug!(token = %token, event = %event.name, payload = ?event.payload, "Canonical event");
    }
}
