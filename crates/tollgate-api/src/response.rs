// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.

use serde::{Deserialize, Serialize};
use tollgate_core::IssuedToken;

// =============================================================================
// Token Response
// =============================================================================

/// Body returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type (always "Bearer").
    pub token_type: String,
    /// Expires in seconds.
    pub expires_in: u64,
}

impl TokenResponse {
    /// Creates a response for a freshly minted access token.
    pub fn new(access: &IssuedToken) -> Self {
        Self {
            access_token: access.token.clone(),
            token_type: "Bearer".to_string(),
            expires_in: access.remaining().as_secs(),
        }
    }
}

// =============================================================================
// Identity Response
// =============================================================================

/// Body returned by `GET /api/auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityResponse {
    /// Authenticated subject.
    pub subject: String,
    /// Whether this request silently rotated the access token.
    pub rotated: bool,
}

// =============================================================================
// Health Responses
// =============================================================================

/// Liveness body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok".
    pub status: String,
    /// Crate version.
    pub version: String,
}

impl HealthResponse {
    /// Creates a healthy response.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// Readiness body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// "ready" when the credential store answered.
    pub status: String,
    /// Store round trip in milliseconds.
    pub store_latency_ms: u64,
}
