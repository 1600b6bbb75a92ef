// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Rate limiting interceptor.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tollgate_core::ratelimit::RateLimitRule;
use tollgate_core::{scope_key, FixedWindowLimiter, RateLimiter, WindowCounter};

use super::{Interceptor, Next};
use crate::error::ApiError;
use crate::extractors::caller_identity;

/// Admits at most the limiter's ceiling per window for each caller within a
/// scope tag.
///
/// Store failures fail closed with 500.
#[derive(Debug, Clone)]
pub struct RateLimitInterceptor {
    limiter: Arc<dyn RateLimiter>,
    tag: String,
    window: Duration,
}

impl RateLimitInterceptor {
    /// Creates an interceptor for scope `tag`.
    pub fn new(limiter: Arc<dyn RateLimiter>, tag: impl Into<String>, window: Duration) -> Self {
        Self {
            limiter,
            tag: tag.into(),
            window,
        }
    }

    /// Creates a fixed-window interceptor enforcing `rule` over `counter`.
    pub fn from_rule(
        counter: Arc<dyn WindowCounter>,
        tag: impl Into<String>,
        rule: RateLimitRule,
    ) -> Self {
        let limiter = FixedWindowLimiter::new(counter, rule.max_requests);
        Self::new(Arc::new(limiter), tag, rule.window)
    }

    /// Returns the scope tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

#[async_trait]
impl Interceptor for RateLimitInterceptor {
    async fn intercept(&self, req: Request<Body>, next: Next) -> Response {
        let caller = caller_identity(req.headers(), req.extensions());
        let key = scope_key(&self.tag, &caller);

        match self.limiter.allow(&key, self.window).await {
            Ok(true) => next.run(req).await,
            Ok(false) => {
                tracing::debug!(scope = %self.tag, caller = %caller, "Rate limit exceeded");
                ApiError::rate_limit_exceeded(Some(self.window.as_secs().max(1))).into_response()
            }
            Err(e) => ApiError::from(e).into_response(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
