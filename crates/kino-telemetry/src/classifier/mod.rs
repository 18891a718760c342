//! Signal classifier
//!
//! Pure decision logic. Every entry point takes the session's
//! [`NormalizerState`] by mutable reference plus one raw signal, and returns
//! the canonical events to emit as an [`Outcome`]. Nothing here dispatches,
//! logs to the sink or reads a clock: the session supplies `now_ms` when a
//! rule needs wall time.

pub mod buffer;
pub mod lifecycle;
pub mod progress;
pub mod rate;
pub mod variant;

pub use buffer::on_buffer;
pub use lifecycle::{
    flush, on_end, on_error, on_fullscreen_dismiss, on_fullscreen_present, on_layout, on_load,
    on_playback_state, on_source_change, session_ready,
};
pub use progress::on_progress;
pub use rate::{on_playback_rate, run_deferred};
pub use variant::{on_bandwidth, on_variant, on_video_tracks, VariantCandidate};

use crate::{
    event::{CanonicalEvent, EventName},
    state::NormalizerState,
    types::Phase,
};

/// Work the classifier asks to run on the next scheduling turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Re-check a zero playback rate and emit `pause` if still warranted
    ConfirmPause,
}

/// Result of classifying one raw signal
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct Outcome {
    /// Events in emission order
    pub events: Vec<CanonicalEvent>,
    /// Check to run when the turn ends, replacing any pending one
    pub deferred: Option<Deferred>,
}

impl Outcome {
    pub fn push(&mut self, event: impl Into<CanonicalEvent>) {
        self.events.push(event.into());
    }

    pub fn defer(&mut self, deferred: Deferred) {
        self.deferred = Some(deferred);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.deferred.is_none()
    }

    /// Event names, for assertions and logging
    pub fn names(&self) -> Vec<EventName> {
        self.events.iter().map(|e| e.name).collect()
    }
}

// Shared transitions. Each one pairs its event with the flag changes that
// must accompany it.

pub(crate) fn request_play(state: &mut NormalizerState, out: &mut Outcome) {
    if state.is_seeking {
        seeked(state, out);
    }
    state.is_paused = false;
    state.seek_attempt_armed = false;
    state.destroyed = false;
    out.push(EventName::Play);
    state.phase = Phase::PlayRequested;
}

pub(crate) fn pause(state: &mut NormalizerState, out: &mut Outcome) {
    state.is_paused = true;
    if state.progressive_seeking {
        out.push(EventName::Seeked);
        state.progressive_seeking = false;
    }
    out.push(EventName::Pause);
    state.phase = Phase::Paused;
}

pub(crate) fn buffered(state: &mut NormalizerState, out: &mut Outcome) {
    state.is_buffering = false;
    out.push(EventName::Buffered);
    state.phase = Phase::Playing;
}

pub(crate) fn seeking(state: &mut NormalizerState, out: &mut Outcome) {
    out.push(EventName::Seeking);
    state.is_seeking = true;
}

pub(crate) fn seeked(state: &mut NormalizerState, out: &mut Outcome) {
    out.push(EventName::Seeked);
    state.is_seeking = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_closes_open_seek() {
        let mut state = NormalizerState::default();
        state.is_seeking = true;
        state.phase = Phase::Paused;
        state.is_paused = true;

        let mut out = Outcome::default();
        request_play(&mut state, &mut out);

        assert_eq!(out.names(), vec![EventName::Seeked, EventName::Play]);
        assert_eq!(state.phase, Phase::PlayRequested);
        assert!(!state.is_seeking);
        assert!(!state.is_paused);
    }

    #[test]
    fn test_pause_closes_progressive_seek() {
        let mut state = NormalizerState::default();
        state.phase = Phase::Playing;
        state.progressive_seeking = true;

        let mut out = Outcome::default();
        pause(&mut state, &mut out);

        assert_eq!(out.names(), vec![EventName::Seeked, EventName::Pause]);
        assert!(!state.progressive_seeking);
        assert!(state.is_paused);
    }
}
