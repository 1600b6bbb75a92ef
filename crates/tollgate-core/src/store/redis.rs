// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Redis-backed credential store.
//!
//! Uses a multiplexed [`ConnectionManager`], which reconnects on its own and is
//! cheap to clone per call. Every round trip is bounded by
//! `operation_timeout`; when the caller's future is dropped the in-flight
//! command is abandoned with it.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use serde::{Deserialize, Serialize};

use super::{keys, SessionStore, WindowCounter, SESSION_ACTIVE};
use crate::error::{StoreError, StoreResult};

/// Increment, and set the expiry only when this call created the key.
const INCR_WINDOW_SCRIPT: &str = r#"
local current = redis.call("INCR", KEYS[1])
if tonumber(current) == 1 then
    redis.call("PEXPIRE", KEYS[1], ARGV[1])
end
return current
"#;

// =============================================================================
// RedisStoreConfig
// =============================================================================

/// Connection settings for [`RedisStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisStoreConfig {
    /// Connection URL (`redis://host:port/db`).
    pub url: String,
    /// Deadline for a single store round trip.
    #[serde(with = "humantime_serde")]
    pub operation_timeout: Duration,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/0".to_string(),
            operation_timeout: Duration::from_secs(2),
        }
    }
}

// =============================================================================
// RedisStore
// =============================================================================

/// Store implementation backed by Redis.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    incr_window: Script,
    operation_timeout: Duration,
}

impl RedisStore {
    /// Connects to Redis.
    pub async fn connect(config: &RedisStoreConfig) -> StoreResult<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let conn = tokio::time::timeout(config.operation_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::timeout(config.operation_timeout))??;

        tracing::info!(url = %redact_url(&config.url), "Connected to Redis credential store");

        Ok(Self {
            conn,
            incr_window: Script::new(INCR_WINDOW_SCRIPT),
            operation_timeout: config.operation_timeout,
        })
    }

    async fn bounded<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.operation_timeout, op).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::timeout(self.operation_timeout)),
        }
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn session_status(&self, subject: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let key = keys::session(subject);
        self.bounded(async move { conn.get(key).await }).await
    }

    async fn store_session(&self, subject: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let key = keys::session(subject);
        let millis = ttl_millis(ttl);
        self.bounded(async move { conn.pset_ex(key, SESSION_ACTIVE, millis).await })
            .await
    }

    async fn refresh_subject(&self, jti: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let key = keys::refresh(jti);
        self.bounded(async move { conn.get(key).await }).await
    }

    async fn store_refresh(&self, jti: &str, subject: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let key = keys::refresh(jti);
        let subject = subject.to_string();
        let millis = ttl_millis(ttl);
        self.bounded(async move { conn.pset_ex(key, subject, millis).await })
            .await
    }

    async fn revoke(&self, subject: &str, jti: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(keys::session(subject))
            .ignore()
            .del(keys::refresh(jti))
            .ignore();
        self.bounded(async move {
            let result: redis::RedisResult<()> = pipe.query_async(&mut conn).await;
            result
        })
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        self.bounded(async move {
            let pong: redis::RedisResult<String> =
                redis::cmd("PING").query_async(&mut conn).await;
            pong.map(|_| ())
        })
        .await
    }
}

#[async_trait]
impl WindowCounter for RedisStore {
    async fn incr_window(&self, key: &str, window: Duration) -> StoreResult<i64> {
        let mut conn = self.conn.clone();
        let mut invocation = self.incr_window.key(key);
        invocation.arg(ttl_millis(window));
        // EVALSHA with a transparent EVAL fallback when the script cache was flushed.
        self.bounded(async move {
            let count: redis::RedisResult<i64> = invocation.invoke_async(&mut conn).await;
            count
        })
        .await
    }
}

/// Converts a TTL to whole milliseconds, never zero (Redis rejects 0).
fn ttl_millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

/// Strips credentials from a connection URL for logging.
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
