// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Credential store abstractions.
//!
//! The store is the only owner of session and rate state. Components never
//! see a concrete backend; they depend on two narrow contracts:
//!
//! - [`SessionStore`]: session markers, refresh entries, atomic revoke
//! - [`WindowCounter`]: the atomic increment-and-expire used by rate limiting
//!
//! Both are implemented by [`MemoryStore`] (tests, single process) and, with
//! the `redis` feature, by `RedisStore`.
//!
//! # Key Namespace
//!
//! ```text
//! session:{subject}              -> "active"
//! refresh:{jti}                  -> subject
//! rate_limit:{scope}:{callerKey} -> integer
//! ```

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreResult;

mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::{RedisStore, RedisStoreConfig};

/// Value stored under a live session marker.
pub const SESSION_ACTIVE: &str = "active";

// =============================================================================
// Keys
// =============================================================================

/// Key builders for the store namespace.
pub mod keys {
    /// Session marker key for a subject.
    pub fn session(subject: &str) -> String {
        format!("session:{}", subject)
    }

    /// Refresh entry key for a token identifier.
    pub fn refresh(jti: &str) -> String {
        format!("refresh:{}", jti)
    }

    /// Rate limit counter key for a scope key (`{tag}:{caller}`).
    pub fn rate_limit(scope_key: &str) -> String {
        format!("rate_limit:{}", scope_key)
    }
}

// =============================================================================
// SessionStore
// =============================================================================

/// Storage contract for session markers and refresh entries.
///
/// Every method is a single round trip. Absence is reported as `Ok(None)`;
/// `Err` always means the store itself failed.
#[async_trait]
pub trait SessionStore: Send + Sync + Debug {
    /// Returns the session marker value for a subject.
    async fn session_status(&self, subject: &str) -> StoreResult<Option<String>>;

    /// Writes the session marker for a subject.
    async fn store_session(&self, subject: &str, ttl: Duration) -> StoreResult<()>;

    /// Returns the subject bound to a refresh token identifier.
    async fn refresh_subject(&self, jti: &str) -> StoreResult<Option<String>>;

    /// Binds a refresh token identifier to a subject.
    async fn store_refresh(&self, jti: &str, subject: &str, ttl: Duration) -> StoreResult<()>;

    /// Deletes the session marker and one refresh entry atomically.
    ///
    /// Missing keys are not an error.
    async fn revoke(&self, subject: &str, jti: &str) -> StoreResult<()>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> StoreResult<()>;
}

// =============================================================================
// WindowCounter
// =============================================================================

/// Atomic fixed-window counter.
#[async_trait]
pub trait WindowCounter: Send + Sync + Debug {
    /// Increments the counter at `key` and returns the new value.
    ///
    /// When the new value is 1 the key's expiry is set to `window` within the
    /// same indivisible operation, so every window ends.
    async fn incr_window(&self, key: &str, window: Duration) -> StoreResult<i64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_namespace() {
        assert_eq!(keys::session("user-1"), "session:user-1");
        assert_eq!(keys::refresh("abc"), "refresh:abc");
        assert_eq!(
            keys::rate_limit("login:1.2.3.4"),
            "rate_limit:login:1.2.3.4"
        );
    }
}
