//! Structured diagnostics
//!
//! Configuration problems and fallbacks are published on a broadcast bus the
//! host can subscribe to, and mirrored to `tracing`. Nothing is printed to
//! standard output.

use crate::{event::EventName, types::PlayerToken};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Why an event was dropped before reaching the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    NoSession,
    Unpaired,
}

/// Something the host should know about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Setup ran without a renderable player; the session is a no-op
    MissingPlayerTarget,
    /// The host's progress cadence was replaced
    ProgressIntervalOverridden { requested_ms: u64, applied_ms: u64 },
    /// Identity storage failed; ephemeral ids were generated
    IdentityFallback { code: String, reason: String },
    /// The device provider returned nothing
    DeviceMetadataUnavailable,
    /// Setup replaced a session that was never torn down
    StaleSessionReplaced { token: PlayerToken },
    /// An event was classified but not dispatched
    EventSuppressed { event: EventName, reason: SuppressReason },
}

impl Diagnostic {
    /// Warnings indicate host misconfiguration; the rest is informational
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Diagnostic::MissingPlayerTarget
                | Diagnostic::ProgressIntervalOverridden { .. }
                | Diagnostic::IdentityFallback { .. }
        )
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MissingPlayerTarget => {
                write!(f, "no player target supplied; analytics disabled for this session")
            }
            Diagnostic::ProgressIntervalOverridden { requested_ms, applied_ms } => write!(
                f,
                "progress update interval overridden from {requested_ms}ms to {applied_ms}ms"
            ),
            Diagnostic::IdentityFallback { code, reason } => {
                write!(f, "identity storage unavailable ({code}): {reason}")
            }
            Diagnostic::DeviceMetadataUnavailable => write!(f, "device metadata unavailable"),
            Diagnostic::StaleSessionReplaced { token } => {
                write!(f, "session {token} replaced without teardown")
            }
            Diagnostic::EventSuppressed { event, reason } => {
                write!(f, "{event} suppressed: {reason:?}")
            }
        }
    }
}

/// Broadcast channel for [`Diagnostic`]s.
///
/// Publishing never blocks; without subscribers diagnostics are only logged.
#[derive(Clone, Debug)]
pub struct DiagnosticBus {
    tx: broadcast::Sender<Diagnostic>,
}

impl DiagnosticBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Log and publish
    pub fn report(&self, diagnostic: Diagnostic) {
        if diagnostic.is_warning() {
            warn!(diagnostic = ?diagnostic, "{diagnostic}");
        } else {
            debug!(diagnostic = ?diagnostic, "{diagnostic}");
        }
        let _ = self.tx.send(diagnostic);
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Diagnostic> {
        self.tx.subscribe()
    }
}

impl Default for DiagnosticBus {
    fn default() -> Self {
        Self::new(64)
    }
}
