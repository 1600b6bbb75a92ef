// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory credential store.
//!
//! A single `parking_lot::Mutex` guards the whole map, which makes every
//! operation (including increment-then-expire) atomic. Expiry is measured
//! with `tokio::time::Instant`, so tests can drive windows with
//! `tokio::time::pause` and `tokio::time::advance`.
//!
//! Clones share the same map.
//!
//! Expired entries are dropped lazily on access and swept in bulk on writes,
//! either once the map doubles past its last swept size or after
//! [`SWEEP_INTERVAL`], so keys that are never read again still go away.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::{keys, SessionStore, WindowCounter, SESSION_ACTIVE};
use crate::error::{StoreError, StoreResult};

/// Map size below which writes never trigger a size-based sweep.
pub const SWEEP_THRESHOLD: usize = 1024;

/// Longest time between two sweeps while writes keep arriving.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

// =============================================================================
// Entry
// =============================================================================

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Counter(i64),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

#[derive(Debug)]
struct Sweep {
    next_len: usize,
    last: Instant,
}

impl Default for Sweep {
    fn default() -> Self {
        Self {
            next_len: SWEEP_THRESHOLD,
            last: Instant::now(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: Mutex<HashMap<String, Entry>>,
    sweep: Mutex<Sweep>,
    unavailable: AtomicBool,
}

impl Inner {
    /// Drops expired entries when the map has grown or the interval elapsed.
    ///
    /// Called with the entries lock held; the sweep lock is always taken second.
    fn maybe_sweep(&self, entries: &mut HashMap<String, Entry>, now: Instant) {
        let mut sweep = self.sweep.lock();
        if entries.len() < sweep.next_len && now < sweep.last + SWEEP_INTERVAL {
            return;
        }

        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        sweep.next_len = (entries.len() * 2).max(SWEEP_THRESHOLD);
        sweep.last = now;

        let dropped = before - entries.len();
        if dropped > 0 {
            tracing::trace!(dropped, remaining = entries.len(), "Swept expired entries");
        }
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// Process-local store implementing [`SessionStore`] and [`WindowCounter`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an outage: while unavailable every operation fails with
    /// [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.inner.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Returns the live text or counter value at `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let entries = self.inner.entries.lock();
        entries.get(key).filter(|e| e.is_live(now)).map(|e| match &e.value {
            Value::Text(s) => s.clone(),
            Value::Counter(n) => n.to_string(),
        })
    }

    /// Returns the remaining time-to-live of a live key.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.inner.entries.lock();
        entries
            .get(key)
            .filter(|e| e.is_live(now))
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    /// Writes a text value directly.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>, ttl: Option<Duration>) {
        let now = Instant::now();
        let mut entries = self.inner.entries.lock();
        self.inner.maybe_sweep(&mut entries, now);
        entries.insert(
            key.into(),
            Entry {
                value: Value::Text(value.into()),
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );
    }

    /// Drops every expired entry now, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.inner.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        before - entries.len()
    }

    /// Removes a key, returning `true` if a live entry was present.
    pub fn remove(&self, key: &str) -> bool {
        let now = Instant::now();
        self.inner
            .entries
            .lock()
            .remove(key)
            .is_some_and(|e| e.is_live(now))
    }

    /// Returns the number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .entries
            .lock()
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    /// Returns `true` if no live keys are present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::unavailable("memory store marked unavailable"))
        } else {
            Ok(())
        }
    }

    fn get_text(&self, key: &str) -> StoreResult<Option<String>> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.inner.entries.lock();
        match entries.get(key) {
            Some(entry) if !entry.is_live(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(Entry {
                value: Value::Text(s),
                ..
            }) => Ok(Some(s.clone())),
            Some(Entry {
                value: Value::Counter(_),
                ..
            }) => Err(StoreError::corrupted(key, "expected text, found counter")),
            None => Ok(None),
        }
    }

    fn set_text(&self, key: String, value: &str, ttl: Duration) -> StoreResult<()> {
        self.check_available()?;
        self.insert(key, value, Some(ttl));
        Ok(())
    }
}

// =============================================================================
// SessionStore
// =============================================================================

#[async_trait]
impl SessionStore for MemoryStore {
    async fn session_status(&self, subject: &str) -> StoreResult<Option<String>> {
        self.get_text(&keys::session(subject))
    }

    async fn store_session(&self, subject: &str, ttl: Duration) -> StoreResult<()> {
        self.set_text(keys::session(subject), SESSION_ACTIVE, ttl)
    }

    async fn refresh_subject(&self, jti: &str) -> StoreResult<Option<String>> {
        self.get_text(&keys::refresh(jti))
    }

    async fn store_refresh(&self, jti: &str, subject: &str, ttl: Duration) -> StoreResult<()> {
        self.set_text(keys::refresh(jti), subject, ttl)
    }

    async fn revoke(&self, subject: &str, jti: &str) -> StoreResult<()> {
        self.check_available()?;
        let mut entries = self.inner.entries.lock();
        entries.remove(&keys::session(subject));
        entries.remove(&keys::refresh(jti));
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_available()
    }
}

// =============================================================================
// WindowCounter
// =============================================================================

#[async_trait]
impl WindowCounter for MemoryStore {
    async fn incr_window(&self, key: &str, window: Duration) -> StoreResult<i64> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.inner.entries.lock();

        let live = entries.get_mut(key).filter(|e| e.is_live(now));
        match live {
            Some(Entry {
                value: Value::Counter(n),
                ..
            }) => {
                *n += 1;
                Ok(*n)
            }
            Some(_) => Err(StoreError::corrupted(key, "expected counter, found text")),
            None => {
                self.inner.maybe_sweep(&mut entries, now);
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: Value::Counter(1),
                        expires_at: Some(now + window),
                    },
                );
                Ok(1)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_session_marker_expires() {
        let store = MemoryStore::new();
        store
            .store_session("user-1", Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(
            store.session_status("user-1").await.unwrap().as_deref(),
            Some("active")
        );

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(store.session_status("user-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = MemoryStore::new();
        store
            .store_session("user-1", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .store_refresh("jti-1", "user-1", Duration::from_secs(60))
            .await
            .unwrap();

        store.revoke("user-1", "jti-1").await.unwrap();
        store.revoke("user-1", "jti-1").await.unwrap();

        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_incr_window_sets_expiry_once() {
        let store = MemoryStore::new();
        let key = "rate_limit:login:1.2.3.4";

        assert_eq!(store.incr_window(key, Duration::from_secs(60)).await.unwrap(), 1);
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(store.incr_window(key, Duration::from_secs(60)).await.unwrap(), 2);

        // Second increment must not push the expiry out.
        assert_eq!(store.ttl(key), Some(Duration::from_secs(30)));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(store.incr_window(key, Duration::from_secs(60)).await.unwrap(), 1);
    }

    fn stored_entries(store: &MemoryStore) -> usize {
        store.inner.entries.lock().len()
    }

    #[tokio::test(start_paused = true)]
    async fn test_unread_expired_counters_are_swept() {
        let store = MemoryStore::new();
        for i in 0..10_000 {
            let key = keys::rate_limit(&format!("login:10.0.{}.{}", i / 256, i % 256));
            store.incr_window(&key, Duration::from_secs(1)).await.unwrap();
        }
        assert_eq!(stored_entries(&store), 10_000);

        tokio::time::advance(Duration::from_secs(5) + SWEEP_INTERVAL).await;
        store
            .incr_window("rate_limit:login:1.2.3.4", Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(stored_entries(&store), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_growth_triggers_sweep_before_interval() {
        let store = MemoryStore::new();
        for i in 0..SWEEP_THRESHOLD {
            store.insert(format!("stale:{}", i), "x", Some(Duration::from_millis(10)));
        }
        tokio::time::advance(Duration::from_secs(1)).await;

        // Map is at the threshold, so this write sweeps without waiting for the interval.
        store.insert("fresh", "x", None);
        assert_eq!(stored_entries(&store), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = MemoryStore::new();
        store.insert("a", "x", Some(Duration::from_secs(1)));
        store.insert("b", "x", None);
        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(stored_entries(&store), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = MemoryStore::new();
        store.set_available(false);

        assert!(matches!(
            store.session_status("user-1").await,
            Err(StoreError::Unavailable { .. })
        ));
        assert!(store
            .incr_window("k", Duration::from_secs(1))
            .await
            .is_err());

        store.set_available(true);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_counter_read_as_text_is_corrupted() {
        let store = MemoryStore::new();
        store
            .incr_window(&keys::session("user-1"), Duration::from_secs(5))
            .await
            .unwrap();

        assert!(matches!(
            store.session_status("user-1").await,
            Err(StoreError::Corrupted { .. })
        ));
    }
}
