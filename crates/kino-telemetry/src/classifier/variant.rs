//! Variant (quality rendition) change detection
//!
//! A change qualifies only when bitrate, width and height all differ from
//! the stored descriptors in the same update. ABR bitrate jitter without a
//! resolution switch never produces `variantChanged`.

use super::Outcome;
use crate::{
    event::{fields, number, CanonicalEvent, EventName, Payload},
    raw::{BandwidthEvent, VideoTrack, VideoTracksEvent},
    state::NormalizerState,
    types::dimension,
};
use serde_json::Value;

/// Candidate rendition descriptor
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariantCandidate {
    pub bitrate: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Attached to the payload when present; never gates the decision
    pub codec: Option<String>,
}

impl From<&VideoTrack> for VariantCandidate {
    fn from(track: &VideoTrack) -> Self {
        Self {
            bitrate: track.bitrate,
            width: track.width,
            height: track.height,
            codec: track.codecs.clone(),
        }
    }
}

impl From<&BandwidthEvent> for VariantCandidate {
    fn from(event: &BandwidthEvent) -> Self {
        Self {
            bitrate: event.bitrate,
            width: event.width,
            height: event.height,
            codec: None,
        }
    }
}

/// Compare a candidate against the stored descriptors and emit
/// `variantChanged` when all three dimensions moved
pub fn on_variant(state: &mut NormalizerState, candidate: &VariantCandidate) -> Outcome {
    let mut out = Outcome::default();

    let bitrate = candidate
        .bitrate
        .filter(|b| b.is_finite() && *b != state.last_bitrate);
    let width = candidate
        .width
        .and_then(dimension)
        .filter(|w| state.video_width != Some(*w));
    let height = candidate
        .height
        .and_then(dimension)
        .filter(|h| state.video_height != Some(*h));

    let (Some(bitrate), Some(width), Some(height)) = (bitrate, width, height) else {
        return out;
    };

    state.last_bitrate = bitrate;
    state.video_width = Some(width);
    state.video_height = Some(height);

    let mut payload = Payload::new();
    payload.insert(fields::VIDEO_SOURCE_BITRATE.to_string(), number(bitrate));
    payload.insert(fields::VIDEO_SOURCE_WIDTH.to_string(), Value::from(width));
    payload.insert(fields::VIDEO_SOURCE_HEIGHT.to_string(), Value::from(height));
    if let Some(codec) = candidate.codec.as_deref().filter(|c| !c.trim().is_empty()) {
        payload.insert(fields::VIDEO_SOURCE_CODEC.to_string(), Value::from(codec));
    }

    out.push(CanonicalEvent::with_payload(EventName::VariantChanged, payload));
    out
}

/// Track list changed: the selected track (or the first) is the candidate
pub fn on_video_tracks(state: &mut NormalizerState, event: &VideoTracksEvent) -> Outcome {
    match event.active_track() {
        Some(track) => on_variant(state, &VariantCandidate::from(track)),
        None => Outcome::default(),
    }
}

/// Bandwidth estimate update
pub fn on_bandwidth(state: &mut NormalizerState, event: &BandwidthEvent) -> Outcome {
    on_variant(state, &VariantCandidate::from(event))
}
