//! Session lifecycle and the remaining host callbacks
//!
//! Load, layout and fullscreen callbacks only update state. Playback-state
//! reports, end, error and source changes produce events.

use super::{buffered, pause, request_play, seeked, seeking, Outcome};
use crate::{
    event::{fields, CanonicalEvent, EventName, Payload},
    platform::PlatformProfile,
    raw::{ErrorEvent, LayoutEvent, LoadEvent, PlaybackStateEvent},
    state::NormalizerState,
    types::{dimension, Phase, Size},
};
use serde_json::{Map, Value};

/// `playerReady`, then `play` unless the host starts paused
pub fn session_ready(state: &mut NormalizerState) -> Outcome {
    let mut out = Outcome::default();
    out.push(EventName::PlayerReady);
    if !state.configured_paused {
        request_play(state, &mut out);
    }
    out
}

/// Close every open sub-state before `destroy`
pub fn flush(state: &mut NormalizerState) -> Outcome {
    let mut out = Outcome::default();
    if state.seek_in_progress() {
        out.push(EventName::Seeked);
        state.clear_seeks();
    }
    if state.is_buffering {
        state.is_buffering = false;
        out.push(EventName::Buffered);
    }
    state.seek_attempt_armed = false;
    out
}

/// Media loaded: record duration and intrinsic size
pub fn on_load(state: &mut NormalizerState, event: &LoadEvent) {
    state.duration_ms = match event.duration {
        Some(seconds) if seconds.is_finite() && seconds > 0.0 => seconds * 1000.0,
        _ => 0.0,
    };

    if let Some(size) = event.natural_size {
        if let Some(width) = size.width.and_then(dimension) {
            state.video_width = Some(width);
        }
        if let Some(height) = size.height.and_then(dimension) {
            state.video_height = Some(height);
        }
    }
}

/// Widget laid out; non-positive sizes are ignored
pub fn on_layout(state: &mut NormalizerState, event: &LayoutEvent) {
    if let Some(size) = Size::from_raw(event.width, event.height) {
        state.player_size = Some(size);
    }
}

/// Fullscreen presented. `window` is the host window size if it could be
/// read; otherwise the widget size stands in.
pub fn on_fullscreen_present(state: &mut NormalizerState, window: Option<Size>) {
    state.fullscreen = true;
    state.window_size = window.or(state.player_size);
}

pub fn on_fullscreen_dismiss(state: &mut NormalizerState) {
    state.fullscreen = false;
}

/// Native playback-state report.
///
/// Arms the drag-seek heuristic on platforms that have one. On platforms
/// with native seek reporting the report itself opens and closes seeks.
pub fn on_playback_state(
    state: &mut NormalizerState,
    profile: &PlatformProfile,
    event: &PlaybackStateEvent,
    now_ms: i64,
) -> Outcome {
    let mut out = Outcome::default();

    if profile.seek_attempt_window_ms.is_some()
        && !event.is_playing
        && state.is_phase(Phase::Paused)
    {
        state.seek_attempt_armed = true;
        state.last_seek_attempt_ms = now_ms;
    }

    if !profile.native_seek_reporting {
        return out;
    }

    if event.is_seeking && !state.is_seeking && !state.is_phase(Phase::Paused) {
        if state.is_buffering {
            buffered(state, &mut out);
        }
        pause(state, &mut out);
        seeking(state, &mut out);
    } else if state.is_seeking && event.is_seeking && event.is_playing {
        seeked(state, &mut out);
    }

    out
}

/// Playback reached the end
pub fn on_end(state: &mut NormalizerState) -> Outcome {
    let mut out = Outcome::default();
    if !state.is_phase(Phase::Paused) {
        pause(state, &mut out);
    }
    out.push(EventName::Ended);
    out
}

/// Player-reported error. A report without error detail emits nothing.
pub fn on_error(event: &ErrorEvent) -> Outcome {
    let mut out = Outcome::default();
    let Some(error) = &event.error else {
        return out;
    };

    let mut payload = Payload::new();
    match error.error_code.filter(|code| *code != 0) {
        Some(code) => {
            payload.insert(fields::PLAYER_ERROR_CODE.to_string(), Value::from(code));
            if let Some(message) = &error.error_string {
                payload.insert(
                    fields::PLAYER_ERROR_MESSAGE.to_string(),
                    Value::from(message.as_str()),
                );
            }
            let context = error.error_stack_trace.as_ref().or(error.error_exception.as_ref());
            if let Some(context) = context {
                payload.insert(
                    fields::PLAYER_ERROR_CONTEXT.to_string(),
                    Value::from(context.to_string()),
                );
            }
        }
        None => {
            let message = serde_json::to_string(error).unwrap_or_default();
            payload.insert(fields::PLAYER_ERROR_CODE.to_string(), Value::from(-1));
            payload.insert(fields::PLAYER_ERROR_MESSAGE.to_string(), Value::from(message));
        }
    }

    out.push(CanonicalEvent::with_payload(EventName::Error, payload));
    out
}

/// Host source changed. The first URI is only recorded; a different URI
/// afterwards emits `videoChange` carrying the host's custom data.
pub fn on_source_change(
    state: &mut NormalizerState,
    uri: &str,
    custom_data: &Map<String, Value>,
) -> Outcome {
    let mut out = Outcome::default();
    if uri.is_empty() {
        return out;
    }

    match state.source_uri.as_deref() {
        None => state.source_uri = Some(uri.to_string()),
        Some(current) if current != uri => {
            state.source_uri = Some(uri.to_string());
            out.push(CanonicalEvent::with_payload(
                EventName::VideoChange,
                custom_data.clone(),
            ));
        }
        Some(_) => {}
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{NaturalSize, PlayerError};
    use crate::types::Platform;
    use serde_json::json;

    #[test]
    fn test_session_ready() {
        let mut autoplay = NormalizerState::default();
        assert_eq!(
            session_ready(&mut autoplay).names(),
            vec![EventName::PlayerReady, EventName::Play]
        );
        assert_eq!(autoplay.phase, Phase::PlayRequested);

        let mut paused = NormalizerState::default();
        paused.configured_paused = true;
        assert_eq!(session_ready(&mut paused).names(), vec![EventName::PlayerReady]);
        assert_eq!(paused.phase, Phase::Idle);
    }

    #[test]
    fn test_flush_closes_seek_and_buffer_once() {
        let mut state = NormalizerState::default();
        state.is_seeking = true;
        state.progressive_seeking = true;
        state.is_buffering = true;

        assert_eq!(flush(&mut state).names(), vec![EventName::Seeked, EventName::Buffered]);
        assert!(!state.seek_in_progress());
        assert!(!state.is_buffering);
        assert!(flush(&mut state).is_empty());
    }

    #[test]
    fn test_load_records_descriptors() {
        let mut state = NormalizerState::default();
        on_load(
            &mut state,
            &LoadEvent {
                duration: Some(12.5),
                natural_size: Some(NaturalSize { width: Some(1920.0), height: Some(0.0) }),
            },
        );
        assert_eq!(state.duration_ms, 12_500.0);
        assert_eq!(state.video_width, Some(1920));
        assert_eq!(state.video_height, None);

        on_load(&mut state, &LoadEvent { duration: Some(-1.0), natural_size: None });
        assert_eq!(state.duration_ms, 0.0);
    }

    #[test]
    fn test_layout_and_fullscreen() {
        let mut state = NormalizerState::default();
        on_layout(&mut state, &LayoutEvent { width: 0.0, height: 200.0 });
        assert_eq!(state.player_size, None);
        on_layout(&mut state, &LayoutEvent { width: 359.7, height: 202.4 });
        assert_eq!(state.player_size, Some(Size::new(360, 202)));

        on_fullscreen_present(&mut state, None);
        assert!(state.fullscreen);
        assert_eq!(state.window_size, Some(Size::new(360, 202)));

        on_fullscreen_present(&mut state, Some(Size::new(1080, 2340)));
        assert_eq!(state.effective_size(), Some(Size::new(1080, 2340)));

        on_fullscreen_dismiss(&mut state);
        assert_eq!(state.effective_size(), Some(Size::new(360, 202)));
    }

    #[test]
    fn test_native_seek_reporting() {
        let profile = PlatformProfile::android();
        let mut state = NormalizerState::new(Platform::Android);
        state.phase = Phase::Playing;
        state.is_buffering = true;

        let out = on_playback_state(
            &mut state,
            &profile,
            &PlaybackStateEvent { is_playing: false, is_seeking: true },
            0,
        );
        assert_eq!(
            out.names(),
            vec![EventName::Buffered, EventName::Pause, EventName::Seeking]
        );
        assert!(state.is_seeking);

        let out = on_playback_state(
            &mut state,
            &profile,
            &PlaybackStateEvent { is_playing: true, is_seeking: true },
            0,
        );
        assert_eq!(out.names(), vec![EventName::Seeked]);
        assert!(!state.is_seeking);
    }

    #[test]
    fn test_playback_state_arms_drag_seek() {
        let profile = PlatformProfile::ios();
        let mut state = NormalizerState::new(Platform::Ios);
        state.phase = Phase::Paused;

        let out = on_playback_state(
            &mut state,
            &profile,
            &PlaybackStateEvent { is_playing: false, is_seeking: true },
            42_000,
        );
        assert!(out.is_empty());
        assert!(state.seek_attempt_armed);
        assert_eq!(state.last_seek_attempt_ms, 42_000);
        assert!(!state.is_seeking);
    }

    #[test]
    fn test_end_pauses_first() {
        let mut state = NormalizerState::default();
        state.phase = Phase::Playing;
        assert_eq!(on_end(&mut state).names(), vec![EventName::Pause, EventName::Ended]);
        assert_eq!(on_end(&mut state).names(), vec![EventName::Ended]);
    }

    #[test]
    fn test_error_with_code() {
        let event = ErrorEvent {
            error: Some(PlayerError {
                error_code: Some(22004),
                error_string: Some("Source error".to_string()),
                error_stack_trace: Some(json!(["at decode", "at load"])),
                error_exception: None,
            }),
        };
        let out = on_error(&event);
        let error = &out.events[0];
        assert_eq!(error.name, EventName::Error);
        assert_eq!(error.field(fields::PLAYER_ERROR_CODE), Some(&json!(22004)));
        assert_eq!(error.field(fields::PLAYER_ERROR_MESSAGE), Some(&json!("Source error")));
        assert_eq!(
            error.field(fields::PLAYER_ERROR_CONTEXT),
            Some(&json!(r#"["at decode","at load"]"#))
        );
    }

    #[test]
    fn test_error_without_code_uses_sentinel() {
        let event = ErrorEvent {
            error: Some(PlayerError {
                error_string: Some("boom".to_string()),
                ..Default::default()
            }),
        };
        let out = on_error(&event);
        let error = &out.events[0];
        assert_eq!(error.field(fields::PLAYER_ERROR_CODE), Some(&json!(-1)));
        assert_eq!(
            error.field(fields::PLAYER_ERROR_MESSAGE),
            Some(&json!(r#"{"errorString":"boom"}"#))
        );

        assert!(on_error(&ErrorEvent::default()).is_empty());
    }

    #[test]
    fn test_source_change() {
        let mut state = NormalizerState::default();
        let mut custom = Map::new();
        custom.insert("video_title".to_string(), json!("Episode 2"));

        assert!(on_source_change(&mut state, "https://cdn/a.m3u8", &custom).is_empty());
        assert!(on_source_change(&mut state, "https://cdn/a.m3u8", &custom).is_empty());

        let out = on_source_change(&mut state, "https://cdn/b.m3u8", &custom);
        assert_eq!(out.names(), vec![EventName::VideoChange]);
        assert_eq!(out.events[0].field("video_title"), Some(&json!("Episode 2")));
        assert_eq!(state.source_uri.as_deref(), Some("https://cdn/b.m3u8"));
    }
}
