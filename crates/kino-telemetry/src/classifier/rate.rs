//! Playback-rate transitions
//!
//! A rate of zero means paused, anything else means playing. Pauses on
//! debounced platforms are confirmed when the turn ends through
//! [`Deferred::ConfirmPause`], so a rate dip caused by a buffer stall
//! reported in the same turn never surfaces as `pause`.

use super::{pause, request_play, Deferred, Outcome};
use crate::{
    platform::PlatformProfile, raw::PlaybackRateEvent, state::NormalizerState, types::Phase,
};

/// Classify a playback-rate change
pub fn on_playback_rate(
    state: &mut NormalizerState,
    profile: &PlatformProfile,
    event: &PlaybackRateEvent,
) -> Outcome {
    let mut out = Outcome::default();
    let rate = event.playback_rate;
    let previous = state.prev_rate;

    let initial_play = state.configured_paused && previous.is_none() && rate != 0.0;
    let resuming = previous == Some(0.0) && rate != 0.0;
    let pausing = rate == 0.0;

    state.prev_rate = Some(rate);

    if state.destroyed && pausing {
        state.is_paused = true;
    }

    if previous == Some(rate) {
        return out;
    }

    if (initial_play || resuming) && !state.is_buffering {
        // An unconfirmed pause leaves the phase playing
        if !matches!(state.phase, Phase::PlayRequested | Phase::Playing) {
            request_play(state, &mut out);
        }
        return out;
    }

    if pausing && !state.destroyed && previous.is_some() {
        if profile.pause_debounce {
            out.defer(Deferred::ConfirmPause);
        } else {
            confirm_pause(state, &mut out);
        }
    }

    out
}

/// Run a check deferred by an earlier classification.
///
/// Preconditions are re-read from the current state, so a check overtaken
/// by later signals emits nothing.
pub fn run_deferred(state: &mut NormalizerState, deferred: Deferred) -> Outcome {
    let mut out = Outcome::default();
    match deferred {
        Deferred::ConfirmPause => {
            if !state.destroyed {
                confirm_pause(state, &mut out);
            }
        }
    }
    out
}

fn confirm_pause(state: &mut NormalizerState, out: &mut Outcome) {
    let active = matches!(state.phase, Phase::PlayRequested | Phase::Playing);
    if !state.is_buffering && active {
        pause(state, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classifier::on_buffer, event::EventName, raw::BufferEvent, types::Platform,
    };

    fn rate(state: &mut NormalizerState, profile: &PlatformProfile, value: f64) -> Outcome {
        on_playback_rate(state, profile, &PlaybackRateEvent { playback_rate: value })
    }

    #[test]
    fn test_initial_play_requires_configured_paused() {
        let profile = PlatformProfile::android();

        let mut state = NormalizerState::new(Platform::Android);
        state.configured_paused = true;
        assert_eq!(rate(&mut state, &profile, 1.0).names(), vec![EventName::Play]);
        assert_eq!(state.phase, Phase::PlayRequested);

        let mut autoplay = NormalizerState::new(Platform::Android);
        assert!(rate(&mut autoplay, &profile, 1.0).is_empty());
    }

    #[test]
    fn test_unchanged_rate_is_noop() {
        let profile = PlatformProfile::android();
        let mut state = NormalizerState::new(Platform::Android);
        state.phase = Phase::Playing;
        state.prev_rate = Some(1.0);

        assert!(rate(&mut state, &profile, 1.0).is_empty());
    }

    #[test]
    fn test_android_pause_is_deferred() {
        let profile = PlatformProfile::android();
        let mut state = NormalizerState::new(Platform::Android);
        state.phase = Phase::Playing;
        state.prev_rate = Some(1.0);

        let out = rate(&mut state, &profile, 0.0);
        assert!(out.events.is_empty());
        assert_eq!(out.deferred, Some(Deferred::ConfirmPause));
        assert_eq!(state.phase, Phase::Playing);

        let confirmed = run_deferred(&mut state, Deferred::ConfirmPause);
        assert_eq!(confirmed.names(), vec![EventName::Pause]);
        assert_eq!(state.phase, Phase::Paused);
    }

    #[test]
    fn test_stall_after_rate_dip_suppresses_pause() {
        let profile = PlatformProfile::android();
        let mut state = NormalizerState::new(Platform::Android);
        state.phase = Phase::Playing;
        state.prev_rate = Some(1.0);

        let deferred = rate(&mut state, &profile, 0.0).deferred;
        let stall = on_buffer(&mut state, &profile, &BufferEvent { is_buffering: true }, 0);
        assert_eq!(stall.names(), vec![EventName::Buffering]);

        assert_eq!(deferred, Some(Deferred::ConfirmPause));
        assert!(run_deferred(&mut state, Deferred::ConfirmPause).is_empty());
        assert_eq!(state.phase, Phase::Playing);
        assert!(!state.is_paused);
    }

    #[test]
    fn test_resume_before_pause_confirmed_is_silent() {
        let profile = PlatformProfile::android();
        let mut state = NormalizerState::new(Platform::Android);
        state.phase = Phase::Playing;
        state.prev_rate = Some(1.0);

        let _ = rate(&mut state, &profile, 0.0);
        assert!(rate(&mut state, &profile, 1.0).is_empty());
        assert_eq!(state.phase, Phase::Playing);
    }

    #[test]
    fn test_ios_pause_is_immediate() {
        let profile = PlatformProfile::ios();
        let mut state = NormalizerState::new(Platform::Ios);
        state.phase = Phase::Playing;
        state.prev_rate = Some(1.0);

        let out = rate(&mut state, &profile, 0.0);
        assert_eq!(out.names(), vec![EventName::Pause]);
        assert_eq!(out.deferred, None);
        assert!(state.is_paused);
    }

    #[test]
    fn test_resume_after_pause() {
        let profile = PlatformProfile::ios();
        let mut state = NormalizerState::new(Platform::Ios);
        state.phase = Phase::Paused;
        state.prev_rate = Some(0.0);

        assert_eq!(rate(&mut state, &profile, 1.0).names(), vec![EventName::Play]);
    }

    #[test]
    fn test_resume_blocked_while_buffering() {
        let profile = PlatformProfile::android();
        let mut state = NormalizerState::new(Platform::Android);
        state.phase = Phase::Paused;
        state.prev_rate = Some(0.0);
        state.is_buffering = true;

        assert!(rate(&mut state, &profile, 1.0).is_empty());
    }

    #[test]
    fn test_destroyed_session_only_marks_paused() {
        let profile = PlatformProfile::ios();
        let mut state = NormalizerState::new(Platform::Ios);
        state.phase = Phase::Playing;
        state.prev_rate = Some(1.0);
        state.destroyed = true;

        assert!(rate(&mut state, &profile, 0.0).is_empty());
        assert!(state.is_paused);
        assert_eq!(state.phase, Phase::Playing);
        assert!(run_deferred(&mut state, Deferred::ConfirmPause).is_empty());
    }
}
