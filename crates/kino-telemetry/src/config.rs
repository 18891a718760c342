//! Normalizer configuration and host session options

use crate::{platform::PlatformTable, types::Platform, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Progress cadence the heuristics are tuned for (ms)
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 250;

/// Stored sessions older than this are replaced (ms)
pub const DEFAULT_SESSION_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Normalizer-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Heuristic parameters per platform
    pub platforms: PlatformTable,
    /// Progress cadence forced on the host player (ms)
    pub progress_update_interval_ms: u64,
    /// Stored session lifetime (ms)
    pub session_ttl_ms: i64,
    /// Diagnostic channel capacity
    pub diagnostics_capacity: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            platforms: PlatformTable::default(),
            progress_update_interval_ms: DEFAULT_PROGRESS_INTERVAL_MS,
            session_ttl_ms: DEFAULT_SESSION_TTL_MS,
            diagnostics_capacity: 64,
        }
    }
}

impl NormalizerConfig {
    /// Parse a JSON configuration; omitted fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.progress_update_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "progress_update_interval_ms must be positive".to_string(),
            ));
        }
        if self.session_ttl_ms <= 0 {
            return Err(Error::InvalidConfig("session_ttl_ms must be positive".to_string()));
        }
        for (platform, profile) in self.platforms.rows() {
            if let Some(window) = profile.progressive_seek {
                if window.settle_min_ms >= window.settle_max_ms {
                    return Err(Error::InvalidConfig(format!(
                        "{platform}: progressive seek settle window is empty"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The renderable player the handlers are attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDescriptor {
    /// Reported as `player_software_name`
    pub software_name: String,
}

impl PlayerDescriptor {
    pub fn new(software_name: impl Into<String>) -> Self {
        Self {
            software_name: software_name.into(),
        }
    }
}

/// Options supplied by the host when binding a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Player target; `None` runs the session as a no-op
    pub player: Option<PlayerDescriptor>,
    /// Host starts the player paused
    pub paused: bool,
    /// Host starts the player fullscreen
    pub fullscreen: bool,
    pub source_uri: Option<String>,
    pub poster_url: Option<String>,
    /// Persist a viewer id across sessions
    pub track_viewer: bool,
    /// Skip device detection and force a platform
    pub platform: Option<Platform>,
    /// Progress cadence the host asked for (ms)
    pub progress_update_interval_ms: Option<u64>,
    pub application_name: Option<String>,
    pub application_version: Option<String>,
    /// Host metadata merged into the sink configuration and `videoChange`
    pub custom_data: Map<String, Value>,
}

impl SessionOptions {
    /// Options for a player rendered by `software_name`
    pub fn for_player(software_name: impl Into<String>) -> Self {
        Self {
            player: Some(PlayerDescriptor::new(software_name)),
            ..Default::default()
        }
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn source(mut self, uri: impl Into<String>) -> Self {
        self.source_uri = Some(uri.into());
        self
    }
}
