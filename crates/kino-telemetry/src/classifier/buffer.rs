//! Buffer signal handling
//!
//! The buffering callback is the most overloaded signal: on platforms whose
//! profile sets `buffering_means_seek` it also fires for seeks and for
//! scrubbing while paused. Rules are evaluated in priority order and the
//! first match wins:
//!
//! 1. drag-seek heuristic armed, paused, not seeking: `seeking`, disarm if
//!    the seek attempt is older than the profile window
//! 2. paused, not buffering, signal on, not seeking: `seeking`
//! 3. paused, not buffering, signal off, seeking: `seeked`
//! 4. neither seeking nor armed: real buffer start/end while playing

use super::{buffered, seeked, seeking, Outcome};
use crate::{
    event::EventName, platform::PlatformProfile, raw::BufferEvent, state::NormalizerState,
    types::Phase,
};
use tracing::debug;

/// Classify a buffer toggle
pub fn on_buffer(
    state: &mut NormalizerState,
    profile: &PlatformProfile,
    event: &BufferEvent,
    now_ms: i64,
) -> Outcome {
    let mut out = Outcome::default();
    let signal = event.is_buffering;
    let paused = state.is_phase(Phase::Paused);
    let was_buffering = state.is_buffering;
    let armed = state.seek_attempt_armed;

    let drag_window = profile
        .seek_attempt_window_ms
        .filter(|_| armed && paused && !state.is_seeking);

    if let Some(window_ms) = drag_window {
        let elapsed = now_ms - state.last_seek_attempt_ms;
        let fresh = state.last_seek_attempt_ms > 0 && elapsed < window_ms;
        seeking(state, &mut out);
        if !fresh {
            debug!(elapsed_ms = elapsed, window_ms, "Stale seek attempt, disarming");
            state.seek_attempt_armed = false;
        }
    } else if paused && !was_buffering && signal && !armed && !state.is_seeking {
        seeking(state, &mut out);
    } else if paused && !was_buffering && !signal && state.is_seeking && !armed {
        seeked(state, &mut out);
    } else if !state.is_seeking && !armed {
        if signal && !was_buffering && state.is_phase(Phase::Playing) {
            buffer_started(state, profile, &mut out);
        } else if !signal && was_buffering {
            buffer_ended(state, profile, &mut out);
        }
    }

    out
}

fn buffer_started(state: &mut NormalizerState, profile: &PlatformProfile, out: &mut Outcome) {
    if profile.buffering_means_seek {
        // Only the first glitch of a paused stretch reads as a seek.
        if !state.has_drifted && state.is_phase(Phase::Paused) {
            out.push(EventName::Seeking);
            state.has_drifted = true;
        }
    } else {
        out.push(EventName::Buffering);
    }
    state.is_buffering = true;
}

fn buffer_ended(state: &mut NormalizerState, profile: &PlatformProfile, out: &mut Outcome) {
    if profile.buffering_means_seek {
        state.is_buffering = false;
        if state.has_drifted {
            out.push(EventName::Seeked);
            state.has_drifted = false;
        }
        state.last_playing_ms = state.playhead_ms;
    } else {
        buffered(state, out);
    }
}
