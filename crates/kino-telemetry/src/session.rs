//! Player Session - Per-player normalizer
//!
//! Coordinates:
//! - Session setup (platform, identity, device metadata, sink configuration)
//! - Classification of raw player callbacks
//! - Deferred pause confirmation
//! - Teardown and token lifecycle
//! - Caller passthroughs and diagnostics

use crate::{
    callbacks::PlayerCallbacks,
    classifier::{self, Deferred, Outcome},
    clock::{Clock, SystemClock},
    config::{NormalizerConfig, SessionOptions},
    device::{DeviceInfo, DeviceMetadataProvider, StaticDevice},
    diagnostics::{Diagnostic, DiagnosticBus, SuppressReason},
    emitter::{AnalyticsSink, Emission, Emitter, SinkConfig},
    event::{CanonicalEvent, EventName},
    identity::{
        IdentityProvider, MemoryStore, SessionIdentity, StoredIdentityProvider, SESSION_ID_KEY,
        SESSION_START_KEY, VIEWER_ID_KEY,
    },
    platform::PlatformProfile,
    raw::{
        BandwidthEvent, BufferEvent, ErrorEvent, LayoutEvent, LoadEvent, PlaybackRateEvent,
        PlaybackStateEvent, ProgressEvent, RawEvent, VideoTracksEvent,
    },
    state::{NormalizerState, StateData},
    types::{Platform, PlayerToken},
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, trace};

/// Normalizer for a single player widget
pub struct PlayerSession {
    /// Host options
    options: SessionOptions,
    /// Normalizer configuration
    config: NormalizerConfig,
    /// Heuristics for the platform chosen at setup
    profile: PlatformProfile,
    /// Classifier state
    state: NormalizerState,
    /// Token-gated sink adapter
    emitter: Emitter,
    identity: Arc<dyn IdentityProvider>,
    device: Arc<dyn DeviceMetadataProvider>,
    clock: Arc<dyn Clock>,
    diagnostics: DiagnosticBus,
    callbacks: PlayerCallbacks,
    /// Check deferred to the end of the turn
    pending: Option<Deferred>,
    /// Ids resolved at the last setup
    session_identity: Option<SessionIdentity>,
}

impl PlayerSession {
    /// Create a session for `options` dispatching into `sink`.
    ///
    /// Nothing is emitted until [`setup`](Self::setup).
    pub fn new(options: SessionOptions, sink: Arc<dyn AnalyticsSink>) -> Self {
        let config = NormalizerConfig::default();
        let mut state = NormalizerState::default();
        state.configured_paused = options.paused;
        state.fullscreen = options.fullscreen;
        state.source_uri = options.source_uri.clone().filter(|uri| !uri.is_empty());

        Self {
            options,
            identity: default_identity(&config),
            diagnostics: DiagnosticBus::new(config.diagnostics_capacity),
            profile: PlatformProfile::default(),
            config,
            state,
            emitter: Emitter::new(sink),
            device: Arc::new(StaticDevice::unavailable()),
            clock: Arc::new(SystemClock),
            callbacks: PlayerCallbacks::default(),
            pending: None,
            session_identity: None,
        }
    }

    /// Replace the configuration.
    ///
    /// Also rebuilds the default identity provider and the diagnostic bus,
    /// so call it before [`with_identity`](Self::with_identity) and before
    /// subscribing.
    pub fn with_config(mut self, config: NormalizerConfig) -> Self {
        self.identity = default_identity(&config);
        self.diagnostics = DiagnosticBus::new(config.diagnostics_capacity);
        self.config = config;
        self
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_device(mut self, device: Arc<dyn DeviceMetadataProvider>) -> Self {
        self.device = device;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_callbacks(mut self, callbacks: PlayerCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Share a diagnostic bus with other sessions
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticBus) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Subscribe to diagnostics
    pub fn subscribe_diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.diagnostics.subscribe()
    }

    pub fn state(&self) -> &NormalizerState {
        &self.state
    }

    /// Active session token
    pub fn token(&self) -> Option<PlayerToken> {
        self.emitter.token()
    }

    pub fn profile(&self) -> &PlatformProfile {
        &self.profile
    }

    pub fn platform(&self) -> Platform {
        self.state.platform
    }

    /// Ids resolved at the last setup
    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.session_identity.as_ref()
    }

    /// Progress cadence the host player must use (ms)
    pub fn progress_update_interval_ms(&self) -> u64 {
        self.config.progress_update_interval_ms
    }

    /// Snapshot for sink pull queries
    pub fn state_data(&self) -> StateData {
        self.state.state_data(self.options.poster_url.as_deref())
    }

    /// Last reported playhead (ms)
    pub fn playhead_ms(&self) -> f64 {
        self.state.playhead_ms
    }

    /// Events dispatched over the session's lifetime
    pub fn dispatched(&self) -> u64 {
        self.emitter.dispatched()
    }

    /// Whether a deferred check is waiting for the turn to end
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Bind the session: resolve identity, configure the sink under a fresh
    /// token and emit `playerReady` (plus `play` unless starting paused).
    ///
    /// Never fails. A missing player target leaves the session without a
    /// token; identity failures fall back to ephemeral ids.
    #[instrument(skip(self))]
    pub async fn setup(&mut self) {
        self.pending = None;

        let Some(player) = self.options.player.clone() else {
            self.diagnostics.report(Diagnostic::MissingPlayerTarget);
            self.teardown();
            return;
        };

        if let Some(stale) = self.emitter.token() {
            self.diagnostics
                .report(Diagnostic::StaleSessionReplaced { token: stale });
            self.teardown();
        }

        let applied = self.config.progress_update_interval_ms;
        if let Some(requested) = self
            .options
            .progress_update_interval_ms
            .filter(|requested| *requested > 0 && *requested != applied)
        {
            self.diagnostics.report(Diagnostic::ProgressIntervalOverridden {
                requested_ms: requested,
                applied_ms: applied,
            });
        }

        let os = self.device.os();
        let platform = self
            .options
            .platform
            .or_else(|| os.as_ref().map(|os| Platform::from_os_name(&os.name)))
            .unwrap_or_default();
        self.profile = self.config.platforms.profile(platform);
        self.state.begin_session(platform);
        if self.state.fullscreen {
            self.state.window_size = self.device.window_size().or(self.state.window_size);
        }

        if os.is_none() && self.device.device_details().is_none() {
            self.diagnostics.report(Diagnostic::DeviceMetadataUnavailable);
        }
        let device = DeviceInfo::collect(
            self.device.as_ref(),
            self.options.application_name.as_deref(),
            self.options.application_version.as_deref(),
        );

        let now_ms = self.clock.now_ms();
        let tracking = self.options.track_viewer;
        let identity = Arc::clone(&self.identity);
        let ids = match identity.resolve_ids(tracking, now_ms).await {
            Ok(ids) => ids,
            Err(e) => {
                self.diagnostics.report(Diagnostic::IdentityFallback {
                    code: e.error_code().to_string(),
                    reason: e.to_string(),
                });
                if tracking {
                    SessionIdentity::ephemeral(now_ms)
                } else {
                    SessionIdentity::anonymous(now_ms)
                }
            }
        };

        let mut data = device.to_map();
        data.extend(self.options.custom_data.clone());
        data.insert("player_software_name".into(), Value::from(player.software_name));
        data.insert("player_fastpix_sdk_name".into(), Value::from(env!("CARGO_PKG_NAME")));
        data.insert(
            "player_fastpix_sdk_version".into(),
            Value::from(env!("CARGO_PKG_VERSION")),
        );
        if let Some(viewer_id) = &ids.viewer_id {
            data.insert(VIEWER_ID_KEY.into(), Value::from(viewer_id.as_str()));
        }
        data.insert(SESSION_ID_KEY.into(), Value::from(ids.session_id.as_str()));
        data.insert(SESSION_START_KEY.into(), Value::from(ids.session_start));

        let config = SinkConfig {
            disable_playhead_rebuffer_tracking: !self.profile.playhead_rebuffer_tracking,
            data,
        };

        let token = PlayerToken::new();
        self.emitter.open(token, &config);
        self.session_identity = Some(ids);
        info!(token = %token, platform = %platform, "Session started");

        let out = classifier::session_ready(&mut self.state);
        self.apply(out);
    }

    /// Close open seek/buffer intervals, emit `destroy` and release the
    /// token. Does nothing without an active token.
    pub fn teardown(&mut self) {
        self.pending = None;
        if !self.emitter.is_active() {
            return;
        }

        let out = classifier::flush(&mut self.state);
        self.apply(out);
        self.emit(&EventName::Destroy.into());
        self.state.destroyed = true;

        if let Some(token) = self.emitter.close() {
            info!(token = %token, dispatched = self.emitter.dispatched(), "Session destroyed");
        }
    }

    /// Classify one raw callback and forward it to the caller's passthrough
    ///
    /// A check deferred by this or an earlier callback of the same turn stays
    /// pending until [`run_deferred`](Self::run_deferred) ends the turn.
    pub fn handle(&mut self, event: &RawEvent) {
        trace!(callback = event.callback_name(), "Raw callback");

        let now_ms = self.clock.now_ms();
        let state = &mut self.state;
        let profile = &self.profile;

        let out = match event {
            RawEvent::Buffer(e) => classifier::on_buffer(state, profile, e, now_ms),
            RawEvent::Load(e) => {
                classifier::on_load(state, e);
                Outcome::default()
            }
            RawEvent::Progress(e) => classifier::on_progress(state, profile, e),
            RawEvent::PlaybackRateChange(e) => {
                // A resume cancels the pause check of the same turn
                if e.playback_rate != 0.0 {
                    self.pending = None;
                }
                classifier::on_playback_rate(state, profile, e)
            }
            RawEvent::PlaybackStateChanged(e) => {
                classifier::on_playback_state(state, profile, e, now_ms)
            }
            RawEvent::VideoTracks(e) => classifier::on_video_tracks(state, e),
            RawEvent::BandwidthUpdate(e) => classifier::on_bandwidth(state, e),
            RawEvent::Layout(e) => {
                classifier::on_layout(state, e);
                Outcome::default()
            }
            RawEvent::FullscreenPlayerDidPresent => {
                classifier::on_fullscreen_present(state, self.device.window_size());
                Outcome::default()
            }
            RawEvent::FullscreenPlayerDidDismiss => {
                classifier::on_fullscreen_dismiss(state);
                Outcome::default()
            }
            RawEvent::Error(e) => classifier::on_error(e),
            RawEvent::End => classifier::on_end(state),
        };

        self.apply(out);
        self.callbacks.forward(event);
    }

    pub fn on_buffer(&mut self, event: BufferEvent) {
        self.handle(&RawEvent::Buffer(event));
    }

    pub fn on_load(&mut self, event: LoadEvent) {
        self.handle(&RawEvent::Load(event));
    }

    pub fn on_progress(&mut self, event: ProgressEvent) {
        self.handle(&RawEvent::Progress(event));
    }

    pub fn on_playback_rate_change(&mut self, event: PlaybackRateEvent) {
        self.handle(&RawEvent::PlaybackRateChange(event));
    }

    pub fn on_playback_state_changed(&mut self, event: PlaybackStateEvent) {
        self.handle(&RawEvent::PlaybackStateChanged(event));
    }

    pub fn on_video_tracks(&mut self, event: VideoTracksEvent) {
        self.handle(&RawEvent::VideoTracks(event));
    }

    pub fn on_bandwidth_update(&mut self, event: BandwidthEvent) {
        self.handle(&RawEvent::BandwidthUpdate(event));
    }

    pub fn on_layout(&mut self, event: LayoutEvent) {
        self.handle(&RawEvent::Layout(event));
    }

    pub fn on_fullscreen_present(&mut self) {
        self.handle(&RawEvent::FullscreenPlayerDidPresent);
    }

    pub fn on_fullscreen_dismiss(&mut self) {
        self.handle(&RawEvent::FullscreenPlayerDidDismiss);
    }

    pub fn on_error(&mut self, event: ErrorEvent) {
        self.handle(&RawEvent::Error(event));
    }

    pub fn on_end(&mut self) {
        self.handle(&RawEvent::End);
    }

    /// Host changed the `paused` option
    pub fn set_paused(&mut self, paused: bool) {
        self.options.paused = paused;
        self.state.configured_paused = paused;
    }

    /// Host changed the `fullscreen` option
    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.options.fullscreen = fullscreen;
        if fullscreen {
            classifier::on_fullscreen_present(&mut self.state, self.device.window_size());
        } else {
            classifier::on_fullscreen_dismiss(&mut self.state);
        }
    }

    /// Host changed the media source
    pub fn set_source(&mut self, uri: &str) {
        self.options.source_uri = Some(uri.to_string());
        let out = classifier::on_source_change(&mut self.state, uri, &self.options.custom_data);
        self.apply(out);
    }

    /// Replace the custom data attached to `videoChange`
    pub fn set_custom_data(&mut self, custom_data: Map<String, Value>) {
        self.options.custom_data = custom_data;
    }

    /// End the current turn by running the deferred check, if any.
    /// Returns whether one was pending.
    pub fn run_deferred(&mut self) -> bool {
        let Some(deferred) = self.pending.take() else {
            return false;
        };
        let out = classifier::run_deferred(&mut self.state, deferred);
        self.apply(out);
        true
    }

    fn apply(&mut self, outcome: Outcome) {
        for event in &outcome.events {
            self.emit(event);
        }
        if let Some(deferred) = outcome.deferred {
            self.pending = Some(deferred);
        }
    }

    fn emit(&mut self, event: &CanonicalEvent) {
        let reason = match self.emitter.emit(event) {
            Emission::Dispatched => {
                debug!(event = %event.name, "Dispatched");
                return;
            }
            Emission::NoSession => SuppressReason::NoSession,
            Emission::Unpaired => SuppressReason::Unpaired,
        };
        self.diagnostics.report(Diagnostic::EventSuppressed {
            event: event.name,
            reason,
        });
    }
}

fn default_identity(config: &NormalizerConfig) -> Arc<dyn IdentityProvider> {
    Arc::new(
        StoredIdentityProvider::new(MemoryStore::new()).with_session_ttl(config.session_ttl_ms),
    )
}

impl std::fmt::Debug for PlayerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerSession")
            .field("token", &self.emitter.token())
            .field("platform", &self.state.platform)
            .field("phase", &self.state.phase)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, sink::RecordingSink, types::Phase};
    use std::sync::Mutex;

    fn session(options: SessionOptions) -> (PlayerSession, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let session = PlayerSession::new(options, sink.clone())
            .with_clock(Arc::new(ManualClock::new(1_700_000_000_000)));
        (session, sink)
    }

    #[tokio::test]
    async fn test_setup_emits_ready_and_play() {
        let options = SessionOptions::for_player("Kino").platform(Platform::Android);
        let (mut session, sink) = session(options);
        session.setup().await;

        assert!(session.token().is_some());
        assert_eq!(sink.names(), vec![EventName::PlayerReady, EventName::Play]);
        assert_eq!(session.state().phase, Phase::PlayRequested);
    }

    #[tokio::test]
    async fn test_setup_configures_sink() {
        let mut options = SessionOptions::for_player("Kino").platform(Platform::Ios).paused(true);
        options.custom_data.insert("video_title".into(), Value::from("Pilot"));
        let (mut session, sink) = session(options);
        session.setup().await;

        let token = session.token().unwrap();
        let config = sink.config_for(&token).unwrap();
        assert!(!config.disable_playhead_rebuffer_tracking);
        assert_eq!(config.data["player_software_name"], Value::from("Kino"));
        assert_eq!(config.data["video_title"], Value::from("Pilot"));
        assert_eq!(config.data[SESSION_START_KEY], Value::from(1_700_000_000_000_i64));
        assert!(!config.data.contains_key(VIEWER_ID_KEY));
        assert_eq!(sink.names(), vec![EventName::PlayerReady]);
    }

    #[tokio::test]
    async fn test_missing_player_target_is_noop() {
        let (mut session, sink) = session(SessionOptions::default());
        let mut diagnostics = session.subscribe_diagnostics();
        session.setup().await;

        assert!(session.token().is_none());
        assert_eq!(diagnostics.try_recv().unwrap(), Diagnostic::MissingPlayerTarget);

        session.on_playback_rate_change(PlaybackRateEvent { playback_rate: 1.0 });
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent() {
        let (mut session, sink) = session(SessionOptions::for_player("Kino"));
        session.setup().await;
        session.teardown();
        session.teardown();

        let destroys = sink
            .names()
            .into_iter()
            .filter(|name| *name == EventName::Destroy)
            .count();
        assert_eq!(destroys, 1);
        assert!(session.token().is_none());
        assert!(session.state().destroyed);
    }

    #[tokio::test]
    async fn test_debounced_pause_confirmed_at_end_of_turn() {
        let options = SessionOptions::for_player("Kino").platform(Platform::Android);
        let (mut session, sink) = session(options);
        session.setup().await;
        session.on_playback_rate_change(PlaybackRateEvent { playback_rate: 1.0 });
        sink.clear();

        session.on_playback_rate_change(PlaybackRateEvent { playback_rate: 0.0 });
        assert!(session.has_pending());

        // Later callbacks of the same turn leave the check pending
        session.on_progress(ProgressEvent { current_time: 3.0 });
        assert!(session.has_pending());
        assert!(sink.events().is_empty());

        assert!(session.run_deferred());
        assert!(!session.has_pending());
        assert_eq!(sink.names(), vec![EventName::Pause]);
    }

    #[tokio::test]
    async fn test_stall_in_same_turn_suppresses_debounced_pause() {
        let options = SessionOptions::for_player("Kino").platform(Platform::Android);
        let (mut session, sink) = session(options);
        session.setup().await;
        session.on_progress(ProgressEvent { current_time: 0.25 });
        session.on_playback_rate_change(PlaybackRateEvent { playback_rate: 1.0 });
        sink.clear();

        session.on_playback_rate_change(PlaybackRateEvent { playback_rate: 0.0 });
        session.on_buffer(BufferEvent { is_buffering: true });
        assert!(session.run_deferred());

        assert_eq!(sink.names(), vec![EventName::Buffering]);
        assert_eq!(session.state().phase, Phase::Playing);
    }

    #[tokio::test]
    async fn test_rate_blip_in_same_turn_is_silent() {
        let options = SessionOptions::for_player("Kino").platform(Platform::Android);
        let (mut session, sink) = session(options);
        session.setup().await;
        session.on_progress(ProgressEvent { current_time: 0.25 });
        session.on_playback_rate_change(PlaybackRateEvent { playback_rate: 1.0 });
        sink.clear();

        session.on_playback_rate_change(PlaybackRateEvent { playback_rate: 0.0 });
        session.on_playback_rate_change(PlaybackRateEvent { playback_rate: 1.0 });
        assert!(!session.has_pending());
        assert!(!session.run_deferred());
        assert!(sink.events().is_empty());

        // A repeated zero keeps the first check
        session.on_playback_rate_change(PlaybackRateEvent { playback_rate: 0.0 });
        session.on_playback_rate_change(PlaybackRateEvent { playback_rate: 0.0 });
        assert!(session.run_deferred());
        assert_eq!(sink.names(), vec![EventName::Pause]);
    }

    #[tokio::test]
    async fn test_passthrough_fires_once_with_unmodified_event() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let callbacks = PlayerCallbacks::new()
            .on_playback_rate_change(move |e| recorder.lock().unwrap().push(e.playback_rate));

        let options = SessionOptions::for_player("Kino").platform(Platform::Android);
        let (session, _sink) = session(options);
        let mut session = session.with_callbacks(callbacks);
        session.setup().await;
        session.on_playback_rate_change(PlaybackRateEvent { playback_rate: 0.0 });

        assert_eq!(*seen.lock().unwrap(), vec![0.0]);
    }

    #[tokio::test]
    async fn test_progress_interval_override() {
        let mut options = SessionOptions::for_player("Kino");
        options.progress_update_interval_ms = Some(1000);
        let (mut session, _sink) = session(options);
        let mut diagnostics = session.subscribe_diagnostics();
        session.setup().await;

        assert_eq!(session.progress_update_interval_ms(), 250);
        assert_eq!(
            diagnostics.try_recv().unwrap(),
            Diagnostic::ProgressIntervalOverridden {
                requested_ms: 1000,
                applied_ms: 250
            }
        );
    }

    #[tokio::test]
    async fn test_source_change_emits_video_change() {
        let options = SessionOptions::for_player("Kino").source("https://cdn.example.com/a.m3u8");
        let (mut session, sink) = session(options);
        session.setup().await;
        sink.clear();

        session.set_source("https://cdn.example.com/a.m3u8");
        assert!(sink.events().is_empty());
        session.set_source("https://cdn.example.com/b.m3u8");
        assert_eq!(sink.names(), vec![EventName::VideoChange]);
    }
}
