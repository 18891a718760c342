//! Canonical analytics events
//!
//! The normalizer's output vocabulary. Event names and payload field names
//! are the contract with the analytics sink and must not change.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload attached to a canonical event
pub type Payload = Map<String, Value>;

/// Payload field names understood by the analytics sink
pub mod fields {
    pub const PLAYER_PLAYHEAD_TIME: &str = "player_playhead_time";
    pub const PLAYER_ERROR_CODE: &str = "player_error_code";
    pub const PLAYER_ERROR_MESSAGE: &str = "player_error_message";
    pub const PLAYER_ERROR_CONTEXT: &str = "player_error_context";
    pub const VIDEO_SOURCE_BITRATE: &str = "video_source_bitrate";
    pub const VIDEO_SOURCE_WIDTH: &str = "video_source_width";
    pub const VIDEO_SOURCE_HEIGHT: &str = "video_source_height";
    pub const VIDEO_SOURCE_CODEC: &str = "video_source_codec";
}

/// Canonical event names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventName {
    Play,
    Pause,
    Seeking,
    Seeked,
    Buffering,
    Buffered,
    Playing,
    Timeupdate,
    VariantChanged,
    Ended,
    Error,
    PlayerReady,
    Destroy,
    VideoChange,
}

impl EventName {
    /// Wire name as the sink expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::Play => "play",
            EventName::Pause => "pause",
            EventName::Seeking => "seeking",
            EventName::Seeked => "seeked",
            EventName::Buffering => "buffering",
            EventName::Buffered => "buffered",
            EventName::Playing => "playing",
            EventName::Timeupdate => "timeupdate",
            EventName::VariantChanged => "variantChanged",
            EventName::Ended => "ended",
            EventName::Error => "error",
            EventName::PlayerReady => "playerReady",
            EventName::Destroy => "destroy",
            EventName::VideoChange => "videoChange",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized playback event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub name: EventName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl CanonicalEvent {
    /// Event without payload
    pub fn new(name: EventName) -> Self {
        Self { name, payload: None }
    }

    /// Event carrying a payload
    pub fn with_payload(name: EventName, payload: Payload) -> Self {
        Self {
            name,
            payload: Some(payload),
        }
    }

    /// `timeupdate` carrying the playhead in milliseconds
    pub fn timeupdate(playhead_ms: f64) -> Self {
        let mut payload = Payload::new();
        payload.insert(fields::PLAYER_PLAYHEAD_TIME.to_string(), number(playhead_ms));
        Self::with_payload(EventName::Timeupdate, payload)
    }

    /// Look up a payload field
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.as_ref().and_then(|p| p.get(key))
    }
}

impl From<EventName> for CanonicalEvent {
    fn from(name: EventName) -> Self {
        Self::new(name)
    }
}

/// Encode a host number as JSON, keeping whole numbers integral
pub fn number(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
