// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error hierarchy for the session layer.
//!
//! Errors are split along the component boundaries:
//!
//! ```text
//! StoreError       - credential store round trips
//! TokenError       - minting and verifying signed tokens
//! SessionError     - issue / validate / rotate / revoke
//! RateLimitError   - fixed-window counter failures
//! PermissionError  - capability lookup failures
//! ```
//!
//! Every error knows whether it is an infrastructure failure (5xx) or a
//! credential problem (401). Infrastructure failures are never reported as
//! "revoked" or "denied".

use std::time::Duration;

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

// =============================================================================
// StoreError
// =============================================================================

/// Errors returned by a credential store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or rejected the command.
    #[error("Credential store unavailable: {message}")]
    Unavailable {
        /// Backend error message.
        message: String,
    },

    /// The round trip did not complete within the configured deadline.
    #[error("Credential store operation timed out after {timeout:?}")]
    Timeout {
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// A key held a value of an unexpected shape.
    #[error("Corrupted value at '{key}': {message}")]
    Corrupted {
        /// The offending key.
        key: String,
        /// What was wrong with it.
        message: String,
    },
}

impl StoreError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    /// Creates a corrupted-value error.
    pub fn corrupted(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Corrupted {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::unavailable(err.to_string())
    }
}

// =============================================================================
// TokenError
// =============================================================================

/// Why a token failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// The `exp` claim is in the past.
    Expired,
    /// The `nbf` claim is in the future.
    NotYetValid,
    /// The signature does not match the configured secret.
    BadSignature,
    /// The token could not be decoded.
    Malformed,
    /// The token is well-formed but of the wrong kind (access vs refresh).
    WrongKind,
    /// A required claim is missing or does not match (issuer, jti).
    BadClaims,
}

impl InvalidReason {
    /// Returns a short description of the reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::Expired => "token has expired",
            InvalidReason::NotYetValid => "token is not yet valid",
            InvalidReason::BadSignature => "invalid token signature",
            InvalidReason::Malformed => "malformed token",
            InvalidReason::WrongKind => "wrong token kind",
            InvalidReason::BadClaims => "invalid token claims",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by the token codec.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature, structure, or time bounds are not acceptable.
    #[error("Token invalid: {reason}")]
    Invalid {
        /// The specific failure.
        reason: InvalidReason,
    },

    /// Signing failed.
    #[error("Token generation failed: {message}")]
    Generation {
        /// Error message.
        message: String,
    },
}

impl TokenError {
    /// Creates an invalid-token error.
    pub fn invalid(reason: InvalidReason) -> Self {
        Self::Invalid { reason }
    }

    /// Creates a generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        let reason = match err.kind() {
            ErrorKind::ExpiredSignature => InvalidReason::Expired,
            ErrorKind::ImmatureSignature => InvalidReason::NotYetValid,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                InvalidReason::BadSignature
            }
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => InvalidReason::BadClaims,
            _ => InvalidReason::Malformed,
        };
        TokenError::invalid(reason)
    }
}

// =============================================================================
// SessionError
// =============================================================================

/// Errors produced by the session manager.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Neither an access nor a refresh credential was presented.
    #[error("No credentials presented")]
    NoCredentials,

    /// Bad signature, malformed, expired, or not yet valid.
    #[error("Token invalid: {reason}")]
    TokenInvalid {
        /// The specific failure.
        reason: InvalidReason,
    },

    /// The session marker for the subject is missing or not active.
    #[error("Session not found or inactive")]
    SessionNotFound,

    /// The refresh entry is missing or bound to another subject.
    #[error("Refresh token not found or mismatched")]
    RefreshTokenInvalid,

    /// The store could not answer a validation query.
    #[error("Session store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// A token could not be signed.
    #[error("Token generation failed: {message}")]
    TokenGeneration {
        /// Error message.
        message: String,
    },

    /// Freshly minted credentials could not be persisted.
    #[error("Session storage failed: {0}")]
    SessionStorage(#[source] StoreError),
}

impl SessionError {
    /// Returns `true` for failures of the backing infrastructure.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            SessionError::StoreUnavailable(_)
                | SessionError::TokenGeneration { .. }
                | SessionError::SessionStorage(_)
        )
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        if self.is_infrastructure() {
            500
        } else {
            401
        }
    }

    /// Returns the error code for logging and metrics.
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::NoCredentials => "NO_CREDENTIALS",
            SessionError::TokenInvalid { .. } => "TOKEN_INVALID",
            SessionError::SessionNotFound => "SESSION_NOT_FOUND",
            SessionError::RefreshTokenInvalid => "REFRESH_TOKEN_INVALID",
            SessionError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            SessionError::TokenGeneration { .. } => "TOKEN_GENERATION",
            SessionError::SessionStorage(_) => "SESSION_STORAGE",
        }
    }
}

impl From<TokenError> for SessionError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid { reason } => SessionError::TokenInvalid { reason },
            TokenError::Generation { message } => SessionError::TokenGeneration { message },
        }
    }
}

// =============================================================================
// RateLimitError
// =============================================================================

/// Errors produced by a rate limiter.
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// The counter store could not be reached.
    #[error("Rate limit store error: {0}")]
    Store(#[from] StoreError),
}

// =============================================================================
// PermissionError
// =============================================================================

/// Errors produced while resolving capabilities.
#[derive(Debug, Error)]
pub enum PermissionError {
    /// The capability source failed.
    #[error("Permission lookup failed: {message}")]
    Lookup {
        /// Error message.
        message: String,
    },
}

impl PermissionError {
    /// Creates a lookup error.
    pub fn lookup(message: impl Into<String>) -> Self {
        Self::Lookup {
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
