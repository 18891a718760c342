//! Per-platform heuristic parameters
//!
//! Platform quirks are data, not branches: the classifier reads a
//! [`PlatformProfile`] and never matches on [`Platform`] directly. Adding a
//! platform means adding a row to [`PlatformTable`].

use crate::types::Platform;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Playhead-gap window used to detect scrubbing from progress ticks alone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressiveSeekWindow {
    /// A gap above this between ticks is a jump (ms)
    pub jump_gap_ms: f64,
    /// Exclusive lower bound of a settled tick cadence (ms)
    pub settle_min_ms: f64,
    /// Exclusive upper bound of a settled tick cadence (ms)
    pub settle_max_ms: f64,
}

impl ProgressiveSeekWindow {
    pub fn is_jump(&self, gap_ms: f64) -> bool {
        gap_ms > self.jump_gap_ms
    }

    /// Both bounds are exclusive
    pub fn is_settled(&self, gap_ms: f64) -> bool {
        gap_ms > self.settle_min_ms && gap_ms < self.settle_max_ms
    }
}

impl Default for ProgressiveSeekWindow {
    // Tuned against a 250 ms progress cadence; recalibrate per device.
    fn default() -> Self {
        Self {
            jump_gap_ms: 500.0,
            settle_min_ms: 240.0,
            settle_max_ms: 255.0,
        }
    }
}

/// Heuristic switches for one platform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformProfile {
    /// The buffering callback is reused for seeks and scrubbing
    pub buffering_means_seek: bool,
    /// Window after a paused not-playing report in which a buffer toggle is a drag-seek (ms)
    pub seek_attempt_window_ms: Option<i64>,
    /// Detect scrubbing from progress gaps
    pub progressive_seek: Option<ProgressiveSeekWindow>,
    /// Confirm pauses when the turn ends instead of immediately
    pub pause_debounce: bool,
    /// Playback-state reports carry a trustworthy `isSeeking`
    pub native_seek_reporting: bool,
    /// The sink may derive rebuffering from playhead stalls
    pub playhead_rebuffer_tracking: bool,
}

impl PlatformProfile {
    /// Buffering reused as seek, drag-seek window, progressive seek detection
    pub fn ios() -> Self {
        Self {
            buffering_means_seek: true,
            seek_attempt_window_ms: Some(1000),
            progressive_seek: Some(ProgressiveSeekWindow::default()),
            pause_debounce: false,
            native_seek_reporting: false,
            playhead_rebuffer_tracking: true,
        }
    }

    pub fn android() -> Self {
        Self {
            buffering_means_seek: false,
            seek_attempt_window_ms: None,
            progressive_seek: None,
            pause_debounce: true,
            native_seek_reporting: true,
            playhead_rebuffer_tracking: false,
        }
    }

    /// Android semantics, but the sink keeps playhead rebuffer tracking
    pub fn unknown() -> Self {
        Self {
            playhead_rebuffer_tracking: true,
            ..Self::android()
        }
    }

    /// Built-in profile for a platform
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Ios => Self::ios(),
            Platform::Android => Self::android(),
            Platform::Unknown => Self::unknown(),
        }
    }
}

impl Default for PlatformProfile {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Lookup table of platform profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformTable {
    profiles: HashMap<Platform, PlatformProfile>,
}

impl PlatformTable {
    /// Profile for `platform`; platforms missing from the table use the built-in row
    pub fn profile(&self, platform: Platform) -> PlatformProfile {
        self.profiles
            .get(&platform)
            .copied()
            .unwrap_or_else(|| PlatformProfile::for_platform(platform))
    }

    /// Replace one row
    pub fn set(&mut self, platform: Platform, profile: PlatformProfile) {
        self.profiles.insert(platform, profile);
    }

    /// Rows in [`Platform::ALL`] order
    pub fn rows(&self) -> Vec<(Platform, PlatformProfile)> {
        Platform::ALL.iter().map(|p| (*p, self.profile(*p))).collect()
    }
}

impl Default for PlatformTable {
    fn default() -> Self {
        let profiles = Platform::ALL
            .iter()
            .map(|p| (*p, PlatformProfile::for_platform(*p)))
            .collect();
        Self { profiles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_bounds_are_exclusive() {
        let window = ProgressiveSeekWindow::default();
        assert!(!window.is_settled(240.0));
        assert!(window.is_settled(240.5));
        assert!(window.is_settled(250.0));
        assert!(window.is_settled(254.9));
        assert!(!window.is_settled(255.0));
        assert!(window.is_jump(500.1));
        assert!(!window.is_jump(500.0));
    }

    #[test]
    fn test_table_defaults() {
        let table = PlatformTable::default();
        assert!(table.profile(Platform::Ios).buffering_means_seek);
        assert!(table.profile(Platform::Android).pause_debounce);
        assert!(table.profile(Platform::Unknown).playhead_rebuffer_tracking);
        assert!(!table.profile(Platform::Android).playhead_rebuffer_tracking);
    }

    #[test]
    fn test_table_override_from_json() {
        let json = r#"{"ios": {
            "buffering_means_seek": true,
            "seek_attempt_window_ms": 1500,
            "progressive_seek": {"jump_gap_ms": 900, "settle_min_ms": 480, "settle_max_ms": 520}
        }}"#;
        let table: PlatformTable = serde_json::from_str(json).unwrap();
        let ios = table.profile(Platform::Ios);
        assert_eq!(ios.seek_attempt_window_ms, Some(1500));
        assert_eq!(ios.progressive_seek.map(|w| w.jump_gap_ms), Some(900.0));
        // rows not present fall back to the built-ins
        assert_eq!(table.profile(Platform::Android), PlatformProfile::android());
    }
}
