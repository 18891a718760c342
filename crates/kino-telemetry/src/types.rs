//! Core types for Kino Telemetry

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque token identifying one active analytics session with the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerToken(pub Uuid);

impl PlayerToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operating platform the host player runs on.
///
/// `Ios` is the platform whose buffering callback doubles as a seek and
/// scrub signal; `Android` reports seeking natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Unknown,
}

impl Platform {
    /// Map an OS name as reported by the host to a platform
    pub fn from_os_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "ios" | "ipados" => Platform::Ios,
            "android" => Platform::Android,
            _ => Platform::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Unknown => "unknown",
        }
    }

    /// All known platforms, in table order
    pub const ALL: [Platform; 3] = [Platform::Ios, Platform::Android, Platform::Unknown];
}

impl Default for Platform {
    fn default() -> Self {
        Platform::Unknown
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse playback phase driving the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing requested yet
    Idle,
    /// `play` emitted, waiting for the first progress tick
    PlayRequested,
    /// Progress ticks are flowing
    Playing,
    /// `pause` emitted
    Paused,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Idle
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::PlayRequested => write!(f, "play_requested"),
            Phase::Playing => write!(f, "playing"),
            Phase::Paused => write!(f, "paused"),
        }
    }
}

/// Width/height pair in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Build a size from raw host numbers, rounding; both sides must be positive
    pub fn from_raw(width: f64, height: f64) -> Option<Self> {
        Some(Self::new(dimension(width)?, dimension(height)?))
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Convert a raw host number into a pixel dimension.
///
/// Returns `None` for non-finite, zero or negative values.
pub fn dimension(value: f64) -> Option<u32> {
    if value.is_finite() && value > 0.0 {
        Some(value.round().min(u32::MAX as f64) as u32)
    } else {
        None
    }
}
