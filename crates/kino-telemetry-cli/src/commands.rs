//! CLI command implementations

use crate::output::{self, ReplayedEvent};
use anyhow::{bail, Context};
use kino_telemetry::{
    AnalyticsSink, CanonicalEvent, Clock, Diagnostic, HostMessage, ManualClock, NormalizerConfig,
    Platform, PlayerSession, PlayerToken, SessionOptions, SinkConfig,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Player name reported for replayed sessions
const REPLAY_PLAYER: &str = "kino-telemetry-replay";

/// One line of a trace: a host message, optionally stamped with wall time
#[derive(Debug, Deserialize)]
struct TraceEntry {
    #[serde(default)]
    at_ms: Option<i64>,
    #[serde(flatten)]
    message: HostMessage,
}

/// Sink collecting events stamped with the replay clock
struct ReplaySink {
    clock: ManualClock,
    events: Mutex<Vec<ReplayedEvent>>,
}

impl ReplaySink {
    fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            events: Mutex::new(Vec::new()),
        }
    }

    fn take(&self) -> Vec<ReplayedEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl AnalyticsSink for ReplaySink {
    fn configure(&self, token: &PlayerToken, config: &SinkConfig) {
        debug!(token = %token, fields = config.data.len(), "Replay session configured");
    }

    fn dispatch(&self, token: &PlayerToken, event: &CanonicalEvent) {
        if let Ok(mut events) = self.events.lock() {
            let sequence = events.len() as u64 + 1;
            events.push(ReplayedEvent {
                sequence,
                at_ms: self.clock.now_ms(),
                token: *token,
                event: event.clone(),
            });
        }
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<NormalizerConfig> {
    match path {
        Some(path) => NormalizerConfig::from_file(&path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(NormalizerConfig::default()),
    }
}

fn parse_platform(name: &str) -> anyhow::Result<Platform> {
    match name.to_lowercase().as_str() {
        "ios" => Ok(Platform::Ios),
        "android" => Ok(Platform::Android),
        "unknown" => Ok(Platform::Unknown),
        other => bail!("Unknown platform '{}' (expected ios, android or unknown)", other),
    }
}

fn parse_trace(contents: &str) -> anyhow::Result<Vec<TraceEntry>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid trace entry on line {}", i + 1))
        })
        .collect()
}

/// Consecutive lines stamped with the same time share a turn; unstamped
/// lines are turns of their own.
fn same_turn(previous: Option<i64>, next: Option<i64>) -> bool {
    matches!((previous, next), (Some(a), Some(b)) if a == b)
}

/// Feed trace entries to a fresh session on a replay clock
async fn run_trace(
    entries: Vec<TraceEntry>,
    options: SessionOptions,
    config: NormalizerConfig,
) -> (Vec<ReplayedEvent>, Vec<Diagnostic>) {
    let clock = ManualClock::new(0);
    let sink = Arc::new(ReplaySink::new(clock.clone()));
    let mut session = PlayerSession::new(options, sink.clone())
        .with_config(config)
        .with_clock(Arc::new(clock.clone()));
    let mut diagnostics = session.subscribe_diagnostics();

    let mut turn_at = None;
    for entry in entries {
        if !same_turn(turn_at, entry.at_ms) {
            session.run_deferred();
        }
        turn_at = entry.at_ms;
        if let Some(at_ms) = entry.at_ms {
            clock.set(at_ms);
        }
        session.process(entry.message).await;
    }
    session.run_deferred();
    session.teardown();

    let mut warnings = Vec::new();
    while let Ok(diagnostic) = diagnostics.try_recv() {
        if diagnostic.is_warning() {
            warnings.push(diagnostic);
        }
    }

    (sink.take(), warnings)
}

/// Replay a trace through a fresh session
pub async fn replay(
    trace: &Path,
    platform: &str,
    paused: bool,
    track_viewer: bool,
    config: Option<PathBuf>,
    format: &str,
) -> anyhow::Result<()> {
    let platform = parse_platform(platform)?;
    let config = load_config(config)?;
    let contents = tokio::fs::read_to_string(trace)
        .await
        .with_context(|| format!("Failed to read trace {}", trace.display()))?;
    let entries = parse_trace(&contents)?;

    info!(entries = entries.len(), platform = %platform, "Replaying trace");

    let mut options = SessionOptions::for_player(REPLAY_PLAYER)
        .platform(platform)
        .paused(paused);
    options.track_viewer = track_viewer;

    let replayed = entries.len();
    let (events, warnings) = run_trace(entries, options, config).await;

    output::print_events(&events, format);
    if output::is_text(format) {
        println!(
            "\nReplayed {} entries: {} events, {} warnings",
            replayed,
            events.len(),
            warnings.len()
        );
        for warning in &warnings {
            println!("  warning: {}", warning);
        }
    }

    Ok(())
}

/// Show the effective platform profiles
pub fn profiles(config: Option<PathBuf>, format: &str) -> anyhow::Result<()> {
    let config = load_config(config)?;
    output::print_profiles(&config.platforms.rows(), format);
    Ok(())
}
