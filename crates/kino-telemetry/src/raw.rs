//! Raw callbacks delivered by the host player widget
//!
//! Field names follow the host's camelCase callback shapes so traces recorded
//! from a device deserialize directly.

use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Buffer state toggle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferEvent {
    pub is_buffering: bool,
}

/// Intrinsic size reported on load
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NaturalSize {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

/// Media loaded
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadEvent {
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub natural_size: Option<NaturalSize>,
}

/// Periodic progress tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Playhead in seconds
    pub current_time: f64,
}

/// Playback rate changed; zero means paused
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackRateEvent {
    pub playback_rate: f64,
}

/// Native playback state report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStateEvent {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub is_seeking: bool,
}

/// One entry of the video track list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoTrack {
    #[serde(default)]
    pub bitrate: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub codecs: Option<String>,
    #[serde(default)]
    pub selected: bool,
}

/// Video track list changed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTracksEvent {
    #[serde(default)]
    pub video_tracks: Vec<VideoTrack>,
}

impl VideoTracksEvent {
    /// The selected track, or the first one when nothing is flagged
    pub fn active_track(&self) -> Option<&VideoTrack> {
        self.video_tracks
            .iter()
            .find(|track| track.selected)
            .or_else(|| self.video_tracks.first())
    }
}

/// ABR bandwidth estimate update
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BandwidthEvent {
    #[serde(default)]
    pub bitrate: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

/// Widget layout pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutEvent {
    pub width: f64,
    pub height: f64,
}

/// Error detail reported by the player
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerError {
    /// Numeric code; Android reports it as a string
    #[serde(
        default,
        deserialize_with = "lenient_error_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub error_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_stack_trace: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_exception: Option<Value>,
}

/// Accept a number or a numeric string. Anything else, and zero, is absent.
fn lenient_error_code<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Integer(i64),
        Float(f64),
        Text(String),
        Other(IgnoredAny),
    }

    let code = match Option::<Code>::deserialize(deserializer)? {
        Some(Code::Integer(code)) => Some(code),
        Some(Code::Float(code)) if code.is_finite() && code.fract() == 0.0 => Some(code as i64),
        Some(Code::Text(text)) => text.trim().parse().ok(),
        _ => None,
    };
    Ok(code.filter(|code| *code != 0))
}

/// Player error callback
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorEvent {
    #[serde(default)]
    pub error: Option<PlayerError>,
}

/// Any raw host callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RawEvent {
    Buffer(BufferEvent),
    Load(LoadEvent),
    Progress(ProgressEvent),
    PlaybackRateChange(PlaybackRateEvent),
    PlaybackStateChanged(PlaybackStateEvent),
    VideoTracks(VideoTracksEvent),
    BandwidthUpdate(BandwidthEvent),
    Layout(LayoutEvent),
    FullscreenPlayerDidPresent,
    FullscreenPlayerDidDismiss,
    Error(ErrorEvent),
    End,
}

impl RawEvent {
    /// Callback name as the host widget spells it
    pub fn callback_name(&self) -> &'static str {
        match self {
            RawEvent::Buffer(_) => "onBuffer",
            RawEvent::Load(_) => "onLoad",
            RawEvent::Progress(_) => "onProgress",
            RawEvent::PlaybackRateChange(_) => "onPlaybackRateChange",
            RawEvent::PlaybackStateChanged(_) => "onPlaybackStateChanged",
            RawEvent::VideoTracks(_) => "onVideoTracks",
            RawEvent::BandwidthUpdate(_) => "onBandwidthUpdate",
            RawEvent::Layout(_) => "onLayout",
            RawEvent::FullscreenPlayerDidPresent => "onFullscreenPlayerDidPresent",
            RawEvent::FullscreenPlayerDidDismiss => "onFullscreenPlayerDidDismiss",
            RawEvent::Error(_) => "onError",
            RawEvent::End => "onEnd",
        }
    }
}
