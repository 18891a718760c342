//! Kino Telemetry - Playback Event Normalizer for Kino
//!
//! This crate turns the raw, platform-specific callbacks of a video player
//! widget into a canonical analytics lifecycle stream:
//! - Buffer/seek disambiguation per platform profile
//! - Progress ticks, `playing` confirmation and `timeupdate`
//! - Playback-rate play/pause transitions with a debounced pause
//! - Variant (rendition) change detection
//! - Session setup, identity resolution and teardown
//! - Structured diagnostics
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Kino Telemetry                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │   Raw Host   │  │   Identity   │  │    Device    │           │
//! │  │  Callbacks   │  │   Provider   │  │   Metadata   │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐        ┌──────────────┐      │
//! │                    │   Player    │───────▶│  Classifier  │      │
//! │                    │   Session   │◀───────│  (Outcome)   │      │
//! │                    └──────┬──────┘        └──────────────┘      │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐            │
//! │  │  Diagnostic  │  │    Event    │  │  Analytics   │            │
//! │  │     Bus      │  │   Emitter   │─▶│     Sink     │            │
//! │  └──────────────┘  └─────────────┘  └──────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod callbacks;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod device;
pub mod diagnostics;
pub mod driver;
pub mod emitter;
pub mod error;
pub mod event;
pub mod identity;
pub mod platform;
pub mod raw;
pub mod session;
pub mod sink;
pub mod state;
pub mod types;

pub use callbacks::PlayerCallbacks;
pub use classifier::{Deferred, Outcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{NormalizerConfig, PlayerDescriptor, SessionOptions};
pub use device::{DeviceInfo, DeviceMetadataProvider, StaticDevice};
pub use diagnostics::{Diagnostic, DiagnosticBus, SuppressReason};
pub use driver::{drive, HostMessage};
pub use emitter::{AnalyticsSink, Emission, Emitter, SinkConfig};
pub use error::{Error, Result};
pub use event::{CanonicalEvent, EventName, Payload};
pub use identity::{
    EphemeralIdentity, IdentityProvider, IdentityStore, MemoryStore, SessionIdentity,
    StoredIdentityProvider,
};
pub use platform::{PlatformProfile, PlatformTable, ProgressiveSeekWindow};
pub use raw::RawEvent;
pub use session::PlayerSession;
pub use sink::{ChannelSink, RecordingSink, SinkMessage, TracingSink};
pub use state::{NormalizerState, StateData};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at host start-up
pub fn init() {
    tracing::info!(version = VERSION, "Kino Telemetry initialized");
}
