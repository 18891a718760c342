//! Async host driver
//!
//! Hosts that deliver player callbacks from a message loop send
//! [`HostMessage`]s down a channel; [`drive`] applies them in order and runs
//! a deferred pause check one scheduling turn later.

use crate::{raw::RawEvent, session::PlayerSession};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// One host-side message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    Setup,
    Teardown,
    SetPaused { paused: bool },
    SetFullscreen { fullscreen: bool },
    SetSource { uri: String },
    /// A raw player callback
    Callback { event: RawEvent },
}

impl HostMessage {
    pub fn callback(event: RawEvent) -> Self {
        HostMessage::Callback { event }
    }
}

impl From<RawEvent> for HostMessage {
    fn from(event: RawEvent) -> Self {
        HostMessage::Callback { event }
    }
}

impl PlayerSession {
    /// Apply one host message
    pub async fn process(&mut self, message: HostMessage) {
        match message {
            HostMessage::Setup => self.setup().await,
            HostMessage::Teardown => self.teardown(),
            HostMessage::SetPaused { paused } => self.set_paused(paused),
            HostMessage::SetFullscreen { fullscreen } => self.set_fullscreen(fullscreen),
            HostMessage::SetSource { uri } => self.set_source(&uri),
            HostMessage::Callback { event } => self.handle(&event),
        }
    }
}

/// Run a session until the channel closes, then tear it down.
///
/// Returns the session so the host can inspect its final state.
pub async fn drive(
    mut session: PlayerSession,
    mut rx: mpsc::Receiver<HostMessage>,
) -> PlayerSession {
    info!("Driver started");

    while let Some(message) = rx.recv().await {
        session.process(message).await;

        if session.has_pending() {
            tokio::task::yield_now().await;
            // Messages already queued belong to the same turn.
            while let Ok(message) = rx.try_recv() {
                session.process(message).await;
            }
            if session.run_deferred() {
                debug!("Deferred check ran");
            }
        }
    }

    session.teardown();
    info!(dispatched = session.dispatched(), "Driver stopped");
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::SessionOptions,
        event::EventName,
        raw::{BufferEvent, PlaybackRateEvent, ProgressEvent},
        sink::RecordingSink,
        types::Platform,
    };
    use std::sync::Arc;

    #[test]
    fn test_host_message_json() {
        let message: HostMessage = serde_json::from_str(
            r#"{"type": "callback", "event": {"type": "playbackRateChange", "playbackRate": 0}}"#,
        )
        .unwrap();
        assert_eq!(
            message,
            HostMessage::callback(RawEvent::PlaybackRateChange(PlaybackRateEvent {
                playback_rate: 0.0
            }))
        );

        let message: HostMessage =
            serde_json::from_str(r#"{"type": "setPaused", "paused": true}"#).unwrap();
        assert_eq!(message, HostMessage::SetPaused { paused: true });
    }

    #[tokio::test]
    async fn test_drive_confirms_pause_and_tears_down() {
        let sink = Arc::new(RecordingSink::new());
        let session = PlayerSession::new(
            SessionOptions::for_player("Kino").platform(Platform::Android),
            sink.clone(),
        );
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(drive(session, rx));

        tx.send(HostMessage::Setup).await.unwrap();
        tx.send(RawEvent::Progress(ProgressEvent { current_time: 0.25 }).into())
            .await
            .unwrap();
        tx.send(RawEvent::PlaybackRateChange(PlaybackRateEvent { playback_rate: 1.0 }).into())
            .await
            .unwrap();
        tx.send(RawEvent::PlaybackRateChange(PlaybackRateEvent { playback_rate: 0.0 }).into())
            .await
            .unwrap();
        drop(tx);

        let session = handle.await.unwrap();
        assert!(session.token().is_none());
        assert_eq!(
            sink.names(),
            vec![
                EventName::PlayerReady,
                EventName::Play,
                EventName::Playing,
                EventName::Timeupdate,
                EventName::Pause,
                EventName::Destroy,
            ]
        );
    }

    #[tokio::test]
    async fn test_drive_stall_in_same_turn_suppresses_pause() {
        let sink = Arc::new(RecordingSink::new());
        let session = PlayerSession::new(
            SessionOptions::for_player("Kino").platform(Platform::Android),
            sink.clone(),
        );
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(drive(session, rx));

        tx.send(HostMessage::Setup).await.unwrap();
        tx.send(RawEvent::Progress(ProgressEvent { current_time: 0.25 }).into())
            .await
            .unwrap();
        tx.send(RawEvent::PlaybackRateChange(PlaybackRateEvent { playback_rate: 1.0 }).into())
            .await
            .unwrap();
        tx.send(RawEvent::PlaybackRateChange(PlaybackRateEvent { playback_rate: 0.0 }).into())
            .await
            .unwrap();
        tx.send(RawEvent::Buffer(BufferEvent { is_buffering: true }).into())
            .await
            .unwrap();
        drop(tx);

        handle.await.unwrap();
        assert_eq!(
            sink.names(),
            vec![
                EventName::PlayerReady,
                EventName::Play,
                EventName::Playing,
                EventName::Timeupdate,
                EventName::Buffering,
                EventName::Buffered,
                EventName::Destroy,
            ]
        );
    }
}
