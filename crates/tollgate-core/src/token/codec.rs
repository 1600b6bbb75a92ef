// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Signing and verification of access and refresh tokens.
//!
//! The codec is purely cryptographic and structural: it never consults the
//! credential store. Liveness and revocation live in the session manager.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{Claims, TokenKind};
use crate::error::{InvalidReason, TokenError};

/// Minimum recommended secret length in bytes.
const RECOMMENDED_SECRET_LEN: usize = 32;

// =============================================================================
// TokenConfig
// =============================================================================

/// Token signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Shared HMAC secret.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Issuer placed in and required on every token.
    pub issuer: String,
    /// Access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_ttl: Duration,
    /// Refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_ttl: Duration,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set by the deployment
            issuer: "tollgate".to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            leeway_secs: 0,
        }
    }
}

impl TokenConfig {
    /// Creates a configuration with the given secret and default lifetimes.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the access token lifetime.
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Sets the refresh token lifetime.
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Returns the lifetime for a token kind.
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::generation("token signing secret is not configured"));
        }
        if self.access_ttl.is_zero() || self.refresh_ttl.is_zero() {
            return Err(TokenError::generation("token lifetimes must be non-zero"));
        }
        if self.secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                "Token secret is shorter than recommended ({} bytes)",
                RECOMMENDED_SECRET_LEN
            );
        }
        Ok(())
    }
}

// =============================================================================
// IssuedToken
// =============================================================================

/// A freshly signed token and the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Encoded token.
    pub token: String,
    /// Claims inside the token.
    pub claims: Claims,
}

impl IssuedToken {
    /// Returns the remaining lifetime, or zero if already expired.
    pub fn remaining(&self) -> Duration {
        self.claims.time_until_expiration().unwrap_or(Duration::ZERO)
    }
}

// =============================================================================
// TokenCodec
// =============================================================================

/// Mints and verifies HS256 tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    config: Arc<TokenConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenCodec {
    /// Creates a codec from configuration.
    pub fn new(config: TokenConfig) -> Result<Self, TokenError> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "nbf", "sub", "iss"]);
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = config.leeway_secs;

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Mints a token of `kind` for `subject` that expires after `ttl`.
    pub fn mint(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let claims = Claims::new(subject, kind, ttl.as_secs() as i64)
            .with_issuer(&self.config.issuer);
        self.sign(claims)
    }

    /// Signs prepared claims.
    pub fn sign(&self, claims: Claims) -> Result<IssuedToken, TokenError> {
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::generation(format!("failed to sign token: {}", e)))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verifies signature, structure, time bounds, issuer and kind.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;

        if claims.typ != kind {
            return Err(TokenError::invalid(InvalidReason::WrongKind));
        }
        if kind == TokenKind::Refresh && claims.jti().map_or(true, str::is_empty) {
            return Err(TokenError::invalid(InvalidReason::BadClaims));
        }

        Ok(claims)
    }

    /// Returns the configured lifetime for a token kind.
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        self.config.ttl(kind)
    }

    /// Returns the issuer.
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.config.issuer)
            .field("access_ttl", &self.config.access_ttl)
            .field("refresh_ttl", &self.config.refresh_ttl)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
