//! Progress ticks and `timeupdate`

use super::Outcome;
use crate::{
    event::{CanonicalEvent, EventName},
    platform::PlatformProfile,
    raw::ProgressEvent,
    state::NormalizerState,
    types::Phase,
};

/// Classify a progress tick.
///
/// Ticks while paused only move the playhead. The first tick after a play
/// request confirms `playing`; a pending buffer stall is resolved by the
/// tick itself. Platforms with a progressive-seek window also watch the
/// gap between consecutive playheads for scrubbing.
pub fn on_progress(
    state: &mut NormalizerState,
    profile: &PlatformProfile,
    event: &ProgressEvent,
) -> Outcome {
    let mut out = Outcome::default();
    let playhead_ms = event.current_time * 1000.0;
    state.playhead_ms = playhead_ms;

    if state.is_phase(Phase::Paused) {
        return out;
    }

    if state.is_phase(Phase::PlayRequested) {
        state.phase = Phase::Playing;
        out.push(EventName::Playing);
        state.last_playing_ms = playhead_ms;
    }

    if state.is_phase(Phase::Playing) && state.is_buffering {
        state.is_buffering = false;
        if state.has_drifted {
            out.push(EventName::Seeked);
            state.has_drifted = false;
        } else if !profile.buffering_means_seek {
            out.push(EventName::Buffered);
        }
    }

    out.push(CanonicalEvent::timeupdate(playhead_ms));

    if let Some(window) = profile.progressive_seek {
        let gap_ms = playhead_ms - state.last_progress_ms;
        if window.is_jump(gap_ms) && state.is_phase(Phase::Playing) && !state.progressive_seeking {
            out.push(EventName::Seeking);
            state.progressive_seeking = true;
        } else if state.progressive_seeking && window.is_settled(gap_ms) {
            out.push(EventName::Seeked);
            state.progressive_seeking = false;
        }
    }

    state.last_progress_ms = playhead_ms;
    out
}
