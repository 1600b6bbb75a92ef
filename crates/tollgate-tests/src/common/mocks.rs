// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! - [`StaticUsers`]: plain-text credential table
//! - [`RecordingLimiter`]: rate limiter that records every key it sees
//! - [`CountingLookup`]: capability lookup that counts calls or fails
//! - [`FailingStore`]: store wrapper with per-operation failure injection
//! - [`recording_interceptor`]: interceptor that logs its name and forwards

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{body::Body, http::Request};
use parking_lot::Mutex;
use tollgate_api::middleware::{interceptor_fn, Interceptor, Next};
use tollgate_api::{ApiResult, CredentialVerifier};
use tollgate_core::{
    CapabilityLookup, CapabilitySet, MemoryStore, PermissionError, RateLimitError, RateLimiter,
    SessionStore, StaticCapabilities, StoreError, StoreResult, WindowCounter,
};

// =============================================================================
// StaticUsers
// =============================================================================

/// Credential verifier over a plain-text table.
#[derive(Debug, Clone, Default)]
pub struct StaticUsers {
    users: HashMap<String, (String, String)>,
}

impl StaticUsers {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user.
    pub fn with_user(mut self, username: &str, password: &str, subject: &str) -> Self {
        self.users
            .insert(username.to_string(), (password.to_string(), subject.to_string()));
        self
    }
}

#[async_trait]
impl CredentialVerifier for StaticUsers {
    async fn verify(&self, username: &str, password: &str) -> ApiResult<Option<String>> {
        Ok(self
            .users
            .get(username)
            .filter(|(expected, _)| expected == password)
            .map(|(_, subject)| subject.clone()))
    }
}

// =============================================================================
// RecordingLimiter
// =============================================================================

/// Rate limiter with a fixed verdict that records the keys it is asked about.
#[derive(Debug, Default)]
pub struct RecordingLimiter {
    keys: Mutex<Vec<String>>,
    deny: AtomicBool,
    fail: AtomicBool,
}

impl RecordingLimiter {
    /// Creates a limiter that admits everything.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Denies every request from now on.
    pub fn deny_all(&self) {
        self.deny.store(true, Ordering::SeqCst);
    }

    /// Fails every request with a store error from now on.
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Returns the scope keys seen so far.
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().clone()
    }
}

#[async_trait]
impl RateLimiter for RecordingLimiter {
    async fn allow(&self, scope_key: &str, _window: Duration) -> Result<bool, RateLimitError> {
        self.keys.lock().push(scope_key.to_string());

        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("injected limiter failure").into());
        }
        Ok(!self.deny.load(Ordering::SeqCst))
    }
}

// =============================================================================
// CountingLookup
// =============================================================================

/// Wraps a static table, counting lookups; can be switched to fail.
#[derive(Debug)]
pub struct CountingLookup {
    inner: StaticCapabilities,
    calls: AtomicU64,
    fail: AtomicBool,
}

impl CountingLookup {
    /// Wraps a table.
    pub fn new(inner: StaticCapabilities) -> Self {
        Self {
            inner,
            calls: AtomicU64::new(0),
            fail: AtomicBool::new(false),
        }
    }

    /// Makes every later lookup fail.
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Returns the number of lookups performed.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapabilityLookup for CountingLookup {
    async fn capabilities(&self, subject: &str) -> Result<CapabilitySet, PermissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PermissionError::lookup("injected lookup failure"));
        }
        self.inner.capabilities(subject).await
    }
}

// =============================================================================
// FailingStore
// =============================================================================

/// Operations [`FailingStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// `session_status`
    SessionRead,
    /// `store_session`
    SessionWrite,
    /// `refresh_subject`
    RefreshRead,
    /// `store_refresh`
    RefreshWrite,
    /// `revoke`
    Revoke,
    /// `incr_window`
    Increment,
}

/// [`MemoryStore`] wrapper that fails selected operations.
#[derive(Debug, Clone, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    failing: Arc<Mutex<Vec<StoreOp>>>,
}

impl FailingStore {
    /// Wraps a fresh memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Starts failing `op`.
    pub fn fail(&self, op: StoreOp) {
        self.failing.lock().push(op);
    }

    /// Stops failing every operation.
    pub fn heal(&self) {
        self.failing.lock().clear();
    }

    fn check(&self, op: StoreOp) -> StoreResult<()> {
        if self.failing.lock().contains(&op) {
            Err(StoreError::unavailable(format!("injected {:?} failure", op)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionStore for FailingStore {
    async fn session_status(&self, subject: &str) -> StoreResult<Option<String>> {
        self.check(StoreOp::SessionRead)?;
        self.inner.session_status(subject).await
    }

    async fn store_session(&self, subject: &str, ttl: Duration) -> StoreResult<()> {
        self.check(StoreOp::SessionWrite)?;
        self.inner.store_session(subject, ttl).await
    }

    async fn refresh_subject(&self, jti: &str) -> StoreResult<Option<String>> {
        self.check(StoreOp::RefreshRead)?;
        self.inner.refresh_subject(jti).await
    }

    async fn store_refresh(&self, jti: &str, subject: &str, ttl: Duration) -> StoreResult<()> {
        self.check(StoreOp::RefreshWrite)?;
        self.inner.store_refresh(jti, subject, ttl).await
    }

    async fn revoke(&self, subject: &str, jti: &str) -> StoreResult<()> {
        self.check(StoreOp::Revoke)?;
        self.inner.revoke(subject, jti).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

#[async_trait]
impl WindowCounter for FailingStore {
    async fn incr_window(&self, key: &str, window: Duration) -> StoreResult<i64> {
        self.check(StoreOp::Increment)?;
        self.inner.incr_window(key, window).await
    }
}

// =============================================================================
// Recording Interceptor
// =============================================================================

/// Shared log of interceptor names in the order they ran.
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

/// Interceptor that appends `name` to `log` and forwards.
pub fn recording_interceptor(log: CallLog, name: &'static str) -> impl Interceptor {
    interceptor_fn(move |req: Request<Body>, next: Next| {
        let log = log.clone();
        async move {
            log.lock().push(name);
            next.run(req).await
        }
    })
}
