//! Output formatting for CLI

use kino_telemetry::{CanonicalEvent, Platform, PlatformProfile, PlayerToken};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

pub fn is_text(format: &str) -> bool {
    matches!(OutputFormat::from(format), OutputFormat::Text)
}

/// A canonical event as it reached the sink during replay
#[derive(Debug, Clone, Serialize)]
pub struct ReplayedEvent {
    pub sequence: u64,
    /// Replay clock at dispatch (ms)
    pub at_ms: i64,
    pub token: PlayerToken,
    #[serde(flatten)]
    pub event: CanonicalEvent,
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "#")]
    sequence: u64,
    #[tabled(rename = "At (ms)")]
    at_ms: i64,
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "Payload")]
    payload: String,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "Buffer = seek")]
    buffering_means_seek: bool,
    #[tabled(rename = "Drag window")]
    seek_attempt_window: String,
    #[tabled(rename = "Progressive seek")]
    progressive_seek: String,
    #[tabled(rename = "Pause debounce")]
    pause_debounce: bool,
    #[tabled(rename = "Native seek")]
    native_seek_reporting: bool,
    #[tabled(rename = "Rebuffer tracking")]
    playhead_rebuffer_tracking: bool,
}

fn payload_text(event: &CanonicalEvent) -> String {
    event
        .payload
        .as_ref()
        .map(|p| serde_json::to_string(p).unwrap_or_default())
        .unwrap_or_default()
}

fn to_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// Print replayed events in the selected format
pub fn print_events(events: &[ReplayedEvent], format: &str) {
    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&events)),
        OutputFormat::Table => {
            let rows = events.iter().map(|e| EventRow {
                sequence: e.sequence,
                at_ms: e.at_ms,
                event: e.event.name.to_string(),
                payload: payload_text(&e.event),
            });
            println!("{}", Table::new(rows));
        }
        OutputFormat::Text => {
            println!("Canonical events:");
            for e in events {
                println!(
                    "  {:>4} {:>10}ms  {:<15} {}",
                    e.sequence,
                    e.at_ms,
                    e.event.name,
                    payload_text(&e.event)
                );
            }
        }
    }
}

/// Print the profile table in the selected format
pub fn print_profiles(rows: &[(Platform, PlatformProfile)], format: &str) {
    match OutputFormat::from(format) {
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = rows
                .iter()
                .map(|(platform, profile)| {
                    (
                        platform.to_string(),
                        serde_json::to_value(profile).unwrap_or_default(),
                    )
                })
                .collect();
            println!("{}", to_json(&map));
        }
        OutputFormat::Table | OutputFormat::Text => {
            let rows = rows.iter().map(|(platform, profile)| ProfileRow {
                platform: platform.to_string(),
                buffering_means_seek: profile.buffering_means_seek,
                seek_attempt_window: profile
                    .seek_attempt_window_ms
                    .map(|ms| format!("{}ms", ms))
                    .unwrap_or_else(|| "-".to_string()),
                progressive_seek: profile
                    .progressive_seek
                    .map(|w| {
                        format!(
                            "jump >{}ms, settle {}..{}ms",
                            w.jump_gap_ms, w.settle_min_ms, w.settle_max_ms
                        )
                    })
                    .unwrap_or_else(|| "-".to_string()),
                pause_debounce: profile.pause_debounce,
                native_seek_reporting: profile.native_seek_reporting,
                playhead_rebuffer_tracking: profile.playhead_rebuffer_tracking,
            });
            println!("{}", Table::new(rows));
        }
    }
}
