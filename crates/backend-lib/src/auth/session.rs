// ============================
// backend-lib/src/auth/session.rs
// ============================
//! Live refresh-token tracking.
//!
//! At most one refresh token per user is live. Login overwrites it, refresh
//! compares against it, expiry drops it.
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use dashmap::DashMap;
use metrics::{counter, gauge};
use thiserror::Error;
use uuid::Uuid;

use crate::metrics::{SESSION_ACTIVE, SESSION_EXPIRED};

/// Errors reported by a session cache backend
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("session cache unavailable: {0}")]
    Unavailable(String),
}

/// Cache key holding the live refresh token of `subject`
pub fn refresh_key(subject: Uuid) -> String {
    format!("refresh:{subject}")
}

/// Key-value store with expiry tracking the live refresh token per user
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Record `token` as the only live refresh token of `subject`
    async fn set_live_refresh(&self, subject: Uuid, token: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Current live refresh token, `None` if absent or expired
    async fn get_live_refresh(&self, subject: Uuid) -> Result<Option<String>, CacheError>;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process session cache
#[derive(Clone, Default)]
pub struct MemorySessionCache {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries and return how many were removed
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        let after = self.entries.len();
        let removed = before.saturating_sub(after);

        if removed > 0 {
            counter!(SESSION_EXPIRED).increment(removed as u64);
        }
        gauge!(SESSION_ACTIVE).set(after as f64);
        removed
    }

    /// Spawn a task sweeping expired entries every `interval`
    pub fn spawn_cleanup(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.sweep();
                if removed > 0 {
                    tracing::debug!(removed, "swept expired refresh tokens");
                }
            }
        })
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn set_live_refresh(&self, subject: Uuid, token: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Unavailable("refresh ttl out of range".to_string()))?;
        self.entries.insert(
            refresh_key(subject),
            Entry {
                value: token.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get_live_refresh(&self, subject: Uuid) -> Result<Option<String>, CacheError> {
        let key = refresh_key(subject);
        let now = Instant::now();

        if let Some(entry) = self.entries.get(&key) {
            if now < entry.expires_at {
                return Ok(Some(entry.value.clone()));
            }
        }

        // Guard dropped above; evict lazily
        self.entries.remove_if(&key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }
}
