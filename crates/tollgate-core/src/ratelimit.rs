// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Fixed-window rate limiting.
//!
//! Each `(scope, caller)` pair owns one counter in the store. The first
//! request of a window creates the counter at 1 and sets its expiry in the
//! same atomic step; later requests only increment. When the key expires the
//! next request opens a new window.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RateLimitError;
use crate::store::{keys, WindowCounter};

/// Builds the scope key `{tag}:{caller}`.
pub fn scope_key(tag: &str, caller: &str) -> String {
    format!("{}:{}", tag, caller)
}

// =============================================================================
// RateLimitRule
// =============================================================================

/// A ceiling of `max_requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRule {
    /// Maximum requests admitted per window.
    pub max_requests: u32,
    /// Window length.
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

impl RateLimitRule {
    /// Creates a rule.
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Five requests per minute.
    pub const fn login() -> Self {
        Self::new(5, Duration::from_secs(60))
    }

    /// Sixty requests per ten seconds.
    pub const fn api() -> Self {
        Self::new(60, Duration::from_secs(10))
    }
}

// =============================================================================
// RateLimiter
// =============================================================================

/// Admission decision for a scope key.
#[async_trait]
pub trait RateLimiter: Send + Sync + std::fmt::Debug {
    /// Records one request against `scope_key` and reports whether it fits
    /// under the ceiling for the current `window`.
    async fn allow(&self, scope_key: &str, window: Duration) -> Result<bool, RateLimitError>;
}

/// Fixed-window limiter over an atomic [`WindowCounter`].
#[derive(Debug, Clone)]
pub struct FixedWindowLimiter {
    counter: Arc<dyn WindowCounter>,
    max_requests: u32,
}

impl FixedWindowLimiter {
    /// Creates a limiter admitting `max_requests` per window.
    pub fn new(counter: Arc<dyn WindowCounter>, max_requests: u32) -> Self {
        Self {
            counter,
            max_requests,
        }
    }

    /// Returns the configured ceiling.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn allow(&self, scope_key: &str, window: Duration) -> Result<bool, RateLimitError> {
        let count = self
            .counter
            .incr_window(&keys::rate_limit(scope_key), window)
            .await?;

        let allowed = count <= i64::from(self.max_requests);
        if !allowed {
            tracing::debug!(
                scope = %scope_key,
                count,
                max = self.max_requests,
                "Rate ceiling exceeded"
            );
        }
        Ok(allowed)
    }
}

// =============================================================================
// Tests
// =============================================================================
