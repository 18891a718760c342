//! Viewer and session identity
//!
//! Resolution is a capability-checked operation: it either yields a
//! [`SessionIdentity`] or an [`Error`] explaining why storage could not be
//! used. Falling back to [`SessionIdentity::ephemeral`] is the caller's
//! explicit second step.

use crate::{config::DEFAULT_SESSION_TTL_MS, Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Storage key for the persistent viewer id
pub const VIEWER_ID_KEY: &str = "fastpix_viewer_id";
/// Storage key for the current session id
pub const SESSION_ID_KEY: &str = "session_id";
/// Storage key for the current session start (ms since epoch)
pub const SESSION_START_KEY: &str = "session_start";

/// Identifiers attached to every analytics session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// Persistent viewer id; absent when viewer tracking is off
    pub viewer_id: Option<String>,
    pub session_id: String,
    /// Session start, ms since epoch
    pub session_start: i64,
}

impl SessionIdentity {
    /// Fresh session with no viewer id
    pub fn anonymous(now_ms: i64) -> Self {
        Self {
            viewer_id: None,
            session_id: new_id(),
            session_start: now_ms,
        }
    }

    /// Fresh viewer and session ids, used when storage failed
    pub fn ephemeral(now_ms: i64) -> Self {
        Self {
            viewer_id: Some(new_id()),
            session_id: new_id(),
            session_start: now_ms,
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Resolves viewer/session identifiers at session setup
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve_ids(&self, tracking_enabled: bool, now_ms: i64) -> Result<SessionIdentity>;
}

/// Provider that never persists anything
#[derive(Debug, Clone, Copy, Default)]
pub struct EphemeralIdentity;

#[async_trait]
impl IdentityProvider for EphemeralIdentity {
    async fn resolve_ids(&self, tracking_enabled: bool, now_ms: i64) -> Result<SessionIdentity> {
        Ok(if tracking_enabled {
            SessionIdentity::ephemeral(now_ms)
        } else {
            SessionIdentity::anonymous(now_ms)
        })
    }
}

/// Key/value storage backing [`StoredIdentityProvider`]
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Provider persisting the viewer id and a rolling session in a store
#[derive(Debug)]
pub struct StoredIdentityProvider<S> {
    store: Option<S>,
    session_ttl_ms: i64,
}

impl<S: IdentityStore> StoredIdentityProvider<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Some(store),
            session_ttl_ms: DEFAULT_SESSION_TTL_MS,
        }
    }

    /// Provider whose storage binding is missing; tracked resolutions fail
    pub fn unavailable() -> Self {
        Self {
            store: None,
            session_ttl_ms: DEFAULT_SESSION_TTL_MS,
        }
    }

    pub fn with_session_ttl(mut self, ttl_ms: i64) -> Self {
        self.session_ttl_ms = ttl_ms;
        self
    }

    async fn viewer_id(store: &S) -> Result<String> {
        match store.get(VIEWER_ID_KEY).await? {
            Some(id) if !id.is_empty() => Ok(id),
            _ => {
                let id = new_id();
                store.set(VIEWER_ID_KEY, &id).await?;
                Ok(id)
            }
        }
    }
}

#[async_trait]
impl<S: IdentityStore> IdentityProvider for StoredIdentityProvider<S> {
    async fn resolve_ids(&self, tracking_enabled: bool, now_ms: i64) -> Result<SessionIdentity> {
        if !tracking_enabled {
            return Ok(SessionIdentity::anonymous(now_ms));
        }

        let store = self.store.as_ref().ok_or(Error::StorageUnavailable)?;
        let viewer_id = Self::viewer_id(store).await?;

        // Unparsable starts count as expired.
        let stored_start = store
            .get(SESSION_START_KEY)
            .await?
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0);
        let expired = stored_start <= 0 || now_ms - stored_start > self.session_ttl_ms;
        let stored_session = store.get(SESSION_ID_KEY).await?.filter(|id| !id.is_empty());

        match stored_session {
            Some(session_id) if !expired => Ok(SessionIdentity {
                viewer_id: Some(viewer_id),
                session_id,
                session_start: stored_start,
            }),
            _ => {
                let session_id = new_id();
                store.set(SESSION_ID_KEY, &session_id).await?;
                store.set(SESSION_START_KEY, &now_ms.to_string()).await?;
                debug!(session_id = %session_id, expired, "Started new stored session");
                Ok(SessionIdentity {
                    viewer_id: Some(viewer_id),
                    session_id,
                    session_start: now_ms,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: i64 = 60 * 60 * 1000;

    struct BrokenStore;

    #[async_trait]
    impl IdentityStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::storage("native module missing"))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::storage("native module missing"))
        }
    }

    #[tokio::test]
    async fn test_untracked_has_no_viewer() {
        let provider = StoredIdentityProvider::new(MemoryStore::new());
        let ids = provider.resolve_ids(false, 1_000).await.unwrap();
        assert!(ids.viewer_id.is_none());
        assert!(!ids.session_id.is_empty());
        assert_eq!(ids.session_start, 1_000);
    }

    #[tokio::test]
    async fn test_session_reused_within_ttl() {
        let provider = StoredIdentityProvider::new(MemoryStore::new());
        let first = provider.resolve_ids(true, 10 * HOUR_MS).await.unwrap();
        let second = provider.resolve_ids(true, 11 * HOUR_MS).await.unwrap();

        assert_eq!(first.viewer_id, second.viewer_id);
        assert_eq!(first.session_id, second.session_id);
        assert_eq!(second.session_start, 10 * HOUR_MS);
    }

    #[tokio::test]
    async fn test_session_expires_after_ttl() {
        let provider = StoredIdentityProvider::new(MemoryStore::new());
        let first = provider.resolve_ids(true, HOUR_MS).await.unwrap();
        let later = provider.resolve_ids(true, 26 * HOUR_MS).await.unwrap();

        assert_eq!(first.viewer_id, later.viewer_id);
        assert_ne!(first.session_id, later.session_id);
        assert_eq!(later.session_start, 26 * HOUR_MS);
    }

    #[tokio::test]
    async fn test_corrupt_start_starts_new_session() {
        let store = MemoryStore::new();
        store.set(SESSION_ID_KEY, "old-session").await.unwrap();
        store.set(SESSION_START_KEY, "not-a-number").await.unwrap();
        let provider = StoredIdentityProvider::new(store);

        let ids = provider.resolve_ids(true, 5_000).await.unwrap();
        assert_ne!(ids.session_id, "old-session");
        assert_eq!(ids.session_start, 5_000);
    }

    #[tokio::test]
    async fn test_unavailable_and_failing_storage() {
        let missing = StoredIdentityProvider::<MemoryStore>::unavailable();
        assert!(matches!(
            missing.resolve_ids(true, 0).await,
            Err(Error::StorageUnavailable)
        ));
        // Untracked sessions never touch storage
        assert!(missing.resolve_ids(false, 0).await.is_ok());

        let broken = StoredIdentityProvider::new(BrokenStore);
        assert!(matches!(broken.resolve_ids(true, 0).await, Err(Error::Storage(_))));
    }

    #[test]
    fn test_ephemeral_provider() {
        let tracked = tokio_test::block_on(EphemeralIdentity.resolve_ids(true, 7)).unwrap();
        assert!(tracked.viewer_id.is_some());
        let untracked = tokio_test::block_on(EphemeralIdentity.resolve_ids(false, 7)).unwrap();
        assert!(untracked.viewer_id.is_none());
        assert_eq!(untracked.session_start, 7);
    }

    #[test]
    fn test_ephemeral_identity() {
        let ids = SessionIdentity::ephemeral(99);
        assert!(ids.viewer_id.is_some());
        assert_ne!(ids.viewer_id.as_deref(), Some(ids.session_id.as_str()));
        assert_eq!(ids.session_start, 99);
    }
}
