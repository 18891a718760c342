//! Caller-supplied passthrough callbacks
//!
//! Every raw callback the session handles is forwarded, unmodified, to the
//! matching passthrough after classification.

use crate::raw::{
    BandwidthEvent, BufferEvent, ErrorEvent, LayoutEvent, LoadEvent, PlaybackRateEvent,
    PlaybackStateEvent, ProgressEvent, RawEvent, VideoTracksEvent,
};

type Callback<T> = Box<dyn FnMut(&T) + Send>;
type Notify = Box<dyn FnMut() + Send>;

/// Optional host handlers, one per raw callback
#[derive(Default)]
pub struct PlayerCallbacks {
    buffer: Option<Callback<BufferEvent>>,
    load: Option<Callback<LoadEvent>>,
    progress: Option<Callback<ProgressEvent>>,
    playback_rate: Option<Callback<PlaybackRateEvent>>,
    playback_state: Option<Callback<PlaybackStateEvent>>,
    video_tracks: Option<Callback<VideoTracksEvent>>,
    bandwidth: Option<Callback<BandwidthEvent>>,
    layout: Option<Callback<LayoutEvent>>,
    fullscreen_present: Option<Notify>,
    fullscreen_dismiss: Option<Notify>,
    error: Option<Callback<ErrorEvent>>,
    end: Option<Notify>,
    any: Option<Callback<RawEvent>>,
}

impl PlayerCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_buffer(mut self, f: impl FnMut(&BufferEvent) + Send + 'static) -> Self {
        self.buffer = Some(Box::new(f));
        self
    }

    pub fn on_load(mut self, f: impl FnMut(&LoadEvent) + Send + 'static) -> Self {
        self.load = Some(Box::new(f));
        self
    }

    pub fn on_progress(mut self, f: impl FnMut(&ProgressEvent) + Send + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn on_playback_rate_change(
        mut self,
        f: impl FnMut(&PlaybackRateEvent) + Send + 'static,
    ) -> Self {
        self.playback_rate = Some(Box::new(f));
        self
    }

    pub fn on_playback_state_changed(
        mut self,
        f: impl FnMut(&PlaybackStateEvent) + Send + 'static,
    ) -> Self {
        self.playback_state = Some(Box::new(f));
        self
    }

    pub fn on_video_tracks(mut self, f: impl FnMut(&VideoTracksEvent) + Send + 'static) -> Self {
        self.video_tracks = Some(Box::new(f));
        self
    }

    pub fn on_bandwidth_update(mut self, f: impl FnMut(&BandwidthEvent) + Send + 'static) -> Self {
        self.bandwidth = Some(Box::new(f));
        self
    }

    pub fn on_layout(mut self, f: impl FnMut(&LayoutEvent) + Send + 'static) -> Self {
        self.layout = Some(Box::new(f));
        self
    }

    pub fn on_fullscreen_present(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.fullscreen_present = Some(Box::new(f));
        self
    }

    pub fn on_fullscreen_dismiss(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.fullscreen_dismiss = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&ErrorEvent) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    pub fn on_end(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.end = Some(Box::new(f));
        self
    }

    /// Receives every raw event after its specific handler
    pub fn on_any(mut self, f: impl FnMut(&RawEvent) + Send + 'static) -> Self {
        self.any = Some(Box::new(f));
        self
    }

    /// Forward a raw event to its handler, then to the catch-all
    pub fn forward(&mut self, event: &RawEvent) {
        match event {
            RawEvent::Buffer(e) => call(&mut self.buffer, e),
            RawEvent::Load(e) => call(&mut self.load, e),
            RawEvent::Progress(e) => call(&mut self.progress, e),
            RawEvent::PlaybackRateChange(e) => call(&mut self.playback_rate, e),
            RawEvent::PlaybackStateChanged(e) => call(&mut self.playback_state, e),
            RawEvent::VideoTracks(e) => call(&mut self.video_tracks, e),
            RawEvent::BandwidthUpdate(e) => call(&mut self.bandwidth, e),
            RawEvent::Layout(e) => call(&mut self.layout, e),
            RawEvent::FullscreenPlayerDidPresent => notify(&mut self.fullscreen_present),
            RawEvent::FullscreenPlayerDidDismiss => notify(&mut self.fullscreen_dismiss),
            RawEvent::Error(e) => call(&mut self.error, e),
            RawEvent::End => notify(&mut self.end),
        }
        call(&mut self.any, event);
    }
}

fn call<T>(callback: &mut Option<Callback<T>>, event: &T) {
    if let Some(f) = callback.as_mut() {
        f(event);
    }
}

fn notify(callback: &mut Option<Notify>) {
    if let Some(f) = callback.as_mut() {
        f();
    }
}

impl std::fmt::Debug for PlayerCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerCallbacks")
            .field("buffer", &self.buffer.is_some())
            .field("progress", &self.progress.is_some())
            .field("playback_rate", &self.playback_rate.is_some())
            .field("any", &self.any.is_some())
            .finish_non_exhaustive()
    }
}
