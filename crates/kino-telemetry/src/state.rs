//! Per-session normalizer state
//!
//! One [`NormalizerState`] exists per player session and is mutated only by
//! the classifier, on the thread delivering player callbacks.

use crate::types::{Phase, Platform, Size};
use serde::Serialize;

/// Mutable record the classifier reads and updates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizerState {
    /// Coarse playback phase
    pub phase: Phase,
    /// Platform fixed at setup
    pub platform: Platform,

    // Host options
    /// Host configured the player paused
    pub configured_paused: bool,
    pub fullscreen: bool,
    pub source_uri: Option<String>,

    // Disambiguation flags
    /// Reported to the sink as `player_is_paused`
    pub is_paused: bool,
    pub is_buffering: bool,
    pub is_seeking: bool,
    /// Drag-seek heuristic armed by a paused not-playing report
    pub seek_attempt_armed: bool,
    pub progressive_seeking: bool,
    /// A buffering glitch was reinterpreted as a seek
    pub has_drifted: bool,
    /// Teardown happened and no play has been requested since
    pub destroyed: bool,

    // Media descriptors
    pub duration_ms: f64,
    pub video_width: Option<u32>,
    pub video_height: Option<u32>,
    pub last_bitrate: f64,

    // Timing
    pub playhead_ms: f64,
    pub last_progress_ms: f64,
    pub last_playing_ms: f64,
    /// Wall clock of the last drag-seek arm (ms since epoch, 0 = never)
    pub last_seek_attempt_ms: i64,
    pub prev_rate: Option<f64>,

    // Layout
    pub player_size: Option<Size>,
    pub window_size: Option<Size>,
}

impl NormalizerState {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            ..Default::default()
        }
    }

    /// Reset playback tracking for a new session.
    ///
    /// Host options, media descriptors and layout survive a re-setup; the
    /// phase, flags and rate history do not.
    pub fn begin_session(&mut self, platform: Platform) {
        *self = Self {
            platform,
            configured_paused: self.configured_paused,
            fullscreen: self.fullscreen,
            source_uri: self.source_uri.take(),
            duration_ms: self.duration_ms,
            video_width: self.video_width,
            video_height: self.video_height,
            last_bitrate: self.last_bitrate,
            player_size: self.player_size,
            window_size: self.window_size,
            ..Default::default()
        };
    }

    pub fn is_phase(&self, phase: Phase) -> bool {
        self.phase == phase
    }

    /// A seek opened by any of the three seek paths is still unmatched
    pub fn seek_in_progress(&self) -> bool {
        self.is_seeking || self.has_drifted || self.progressive_seeking
    }

    /// Clear every seek flag
    pub fn clear_seeks(&mut self) {
        self.is_seeking = false;
        self.has_drifted = false;
        self.progressive_seeking = false;
    }

    /// Player height/width as reported to the sink: the window while
    /// fullscreen, the widget layout otherwise
    pub fn effective_size(&self) -> Option<Size> {
        match (self.fullscreen, self.window_size) {
            (true, Some(window)) => Some(window),
            _ => self.player_size,
        }
    }

    /// Snapshot for sink pull queries
    pub fn state_data(&self, poster_url: Option<&str>) -> StateData {
        let size = self.effective_size();
        StateData {
            player_is_paused: self.is_paused,
            video_source_height: self.video_height,
            video_source_width: self.video_width,
            player_is_fullscreen: self.fullscreen,
            player_autoplay_on: !self.configured_paused,
            video_source_url: self.source_uri.clone(),
            video_source_duration: self.duration_ms,
            video_poster_url: poster_url.unwrap_or_default().to_string(),
            player_height: size.map(|s| s.height),
            player_width: size.map(|s| s.width),
        }
    }
}

/// Player state the sink may query at any time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateData {
    pub player_is_paused: bool,
    pub video_source_height: Option<u32>,
    pub video_source_width: Option<u32>,
    pub player_is_fullscreen: bool,
    pub player_autoplay_on: bool,
    pub video_source_url: Option<String>,
    pub video_source_duration: f64,
    pub video_poster_url: String,
    pub player_height: Option<u32>,
    pub player_width: Option<u32>,
}
