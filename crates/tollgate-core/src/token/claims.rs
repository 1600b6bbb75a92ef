// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token claims.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two kinds of credential the codec mints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived bearer credential.
    Access,
    /// Long-lived credential used to mint new access tokens.
    Refresh,
}

impl TokenKind {
    /// Returns the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried by both access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    // =========================================================================
    // Registered claims (RFC 7519)
    // =========================================================================
    /// Subject - the caller identity.
    pub sub: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at time (Unix timestamp).
    pub iat: i64,

    /// Not before time (Unix timestamp).
    pub nbf: i64,

    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Token identifier, present on refresh tokens only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    // =========================================================================
    // Private claims
    // =========================================================================
    /// Token kind.
    pub typ: TokenKind,
}

impl Claims {
    /// Creates claims for `subject` valid from now for `ttl_secs` seconds.
    ///
    /// Refresh claims receive a fresh random `jti`.
    pub fn new(subject: impl Into<String>, kind: TokenKind, ttl_secs: i64) -> Self {
        let now = Utc::now().timestamp();

        Self {
            sub: subject.into(),
            exp: now + ttl_secs,
            iat: now,
            nbf: now,
            iss: None,
            jti: match kind {
                TokenKind::Access => None,
                TokenKind::Refresh => Some(Uuid::new_v4().to_string()),
            },
            typ: kind,
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// Returns the subject.
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Returns the token identifier, if any.
    pub fn jti(&self) -> Option<&str> {
        self.jti.as_deref()
    }

    /// Returns `true` if the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the time remaining until expiration.
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(Duration::from_secs((self.exp - now) as u64))
        } else {
            None
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
