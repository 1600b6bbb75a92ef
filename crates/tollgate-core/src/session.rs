// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session lifecycle.
//!
//! [`SessionManager`] combines the [`TokenCodec`] with a [`SessionStore`]:
//!
//! - an access token is honored only while `session:{sub}` is `"active"`
//! - a refresh token is honored only while `refresh:{jti}` holds its subject
//!
//! The manager keeps no in-memory state; everything lives in the store.
//!
//! # Request Policy
//!
//! ```text
//! access valid                     -> subject
//! access invalid, refresh valid    -> rotate, subject + new access token
//! otherwise                        -> reject (5xx if the store failed, else 401)
//! ```

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{SessionError, SessionResult, TokenError};
use crate::store::{SessionStore, SESSION_ACTIVE};
use crate::token::{IssuedToken, TokenCodec, TokenKind};

// =============================================================================
// Types
// =============================================================================

/// Access and refresh tokens minted together at login.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    /// Short-lived access token.
    pub access: IssuedToken,
    /// Long-lived refresh token.
    pub refresh: IssuedToken,
}

/// A refresh token that passed verification and store binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshGrant {
    /// Subject bound to the refresh entry.
    pub subject: String,
    /// Refresh token identifier.
    pub jti: String,
}

/// Outcome of request-level authentication.
#[derive(Debug, Clone)]
pub struct Authenticated {
    /// Authenticated subject.
    pub subject: String,
    /// Access token minted by silent rotation, if one happened.
    pub rotated_access: Option<IssuedToken>,
}

impl Authenticated {
    /// Returns `true` if the access token was silently rotated.
    pub fn was_rotated(&self) -> bool {
        self.rotated_access.is_some()
    }
}

// =============================================================================
// SessionManager
// =============================================================================

/// Issues, validates, rotates and revokes sessions.
#[derive(Debug, Clone)]
pub struct SessionManager {
    codec: TokenCodec,
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    /// Creates a session manager.
    pub fn new(codec: TokenCodec, store: Arc<dyn SessionStore>) -> Self {
        Self { codec, store }
    }

    /// Returns the token codec.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Mints an access/refresh pair for `subject` and records both in the store.
    ///
    /// If a write fails the caller gets [`SessionError::SessionStorage`]; any
    /// token minted here stays unusable because validation requires the
    /// corresponding store entry.
    pub async fn issue(&self, subject: &str) -> SessionResult<SessionTokens> {
        let access_ttl = self.codec.ttl(TokenKind::Access);
        let refresh_ttl = self.codec.ttl(TokenKind::Refresh);

        let access = self.codec.mint(subject, TokenKind::Access, access_ttl)?;
        let refresh = self.codec.mint(subject, TokenKind::Refresh, refresh_ttl)?;
        let jti = refresh_jti(&refresh)?;

        self.store
            .store_session(subject, access_ttl)
            .await
            .map_err(SessionError::SessionStorage)?;
        self.store
            .store_refresh(jti, subject, refresh_ttl)
            .await
            .map_err(SessionError::SessionStorage)?;

        debug!(subject = %subject, "Session issued");
        Ok(SessionTokens { access, refresh })
    }

    /// Validates an access token and returns its subject.
    pub async fn validate_access(&self, token: &str) -> SessionResult<String> {
        let claims = self.codec.verify(token, TokenKind::Access)?;

        let status = self
            .store
            .session_status(&claims.sub)
            .await
            .map_err(SessionError::StoreUnavailable)?;

        match status.as_deref() {
            Some(SESSION_ACTIVE) => Ok(claims.sub),
            _ => Err(SessionError::SessionNotFound),
        }
    }

    /// Validates a refresh token against its store binding.
    pub async fn validate_refresh(&self, token: &str) -> SessionResult<RefreshGrant> {
        let claims = self.codec.verify(token, TokenKind::Refresh)?;
        let jti = claims.jti.ok_or(SessionError::RefreshTokenInvalid)?;

        let bound = self
            .store
            .refresh_subject(&jti)
            .await
            .map_err(SessionError::StoreUnavailable)?;

        match bound {
            Some(subject) if subject == claims.sub => Ok(RefreshGrant { subject, jti }),
            Some(_) => {
                warn!(subject = %claims.sub, "Refresh token bound to a different subject");
                Err(SessionError::RefreshTokenInvalid)
            }
            None => Err(SessionError::RefreshTokenInvalid),
        }
    }

    /// Mints a new access token from a valid refresh token.
    ///
    /// The refresh token itself is not replaced.
    pub async fn rotate(&self, refresh_token: &str) -> SessionResult<IssuedToken> {
        let grant = self.validate_refresh(refresh_token).await?;

        let access_ttl = self.codec.ttl(TokenKind::Access);
        let access = self
            .codec
            .mint(&grant.subject, TokenKind::Access, access_ttl)?;

        self.store
            .store_session(&grant.subject, access_ttl)
            .await
            .map_err(SessionError::SessionStorage)?;

        debug!(subject = %grant.subject, "Access token rotated");
        Ok(access)
    }

    /// Deletes the session marker and one refresh entry.
    ///
    /// Revoking something already gone is not an error.
    pub async fn revoke(&self, subject: &str, jti: &str) -> SessionResult<()> {
        self.store
            .revoke(subject, jti)
            .await
            .map_err(SessionError::StoreUnavailable)?;

        debug!(subject = %subject, "Session revoked");
        Ok(())
    }

    /// Applies the request-level policy to whatever credentials were presented.
    pub async fn authenticate(
        &self,
        access: Option<&str>,
        refresh: Option<&str>,
    ) -> SessionResult<Authenticated> {
        let access_error = match access {
            Some(token) => match self.validate_access(token).await {
                Ok(subject) => {
                    return Ok(Authenticated {
                        subject,
                        rotated_access: None,
                    })
                }
                // Never rotate past a store outage.
                Err(err) if err.is_infrastructure() => return Err(err),
                Err(err) => Some(err),
            },
            None => None,
        };

        match (refresh, access_error) {
            (Some(token), _) => {
                let issued = self.rotate(token).await?;
                Ok(Authenticated {
                    subject: issued.claims.sub.clone(),
                    rotated_access: Some(issued),
                })
            }
            (None, Some(err)) => Err(err),
            (None, None) => Err(SessionError::NoCredentials),
        }
    }
}

fn refresh_jti(issued: &IssuedToken) -> Result<&str, TokenError> {
    issued
        .claims
        .jti()
        .ok_or_else(|| TokenError::generation("refresh token minted without jti"))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InvalidReason, StoreError};
    use crate::store::{keys, MemoryStore};
    use crate::token::{Claims, TokenConfig};

    const SECRET: &str = "session-test-secret-long-enough-for-hs256";

    fn manager() -> (SessionManager, MemoryStore) {
        let store = MemoryStore::new();
        let codec = TokenCodec::new(TokenConfig::new(SECRET)).unwrap();
        (SessionManager::new(codec, Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_issue_then_validate_access() {
        let (sessions, store) = manager();
        let tokens = sessions.issue("user-1").await.unwrap();

        let subject = sessions.validate_access(&tokens.access.token).await.unwrap();
        assert_eq!(subject, "user-1");

        let jti = tokens.refresh.claims.jti().unwrap();
        assert_eq!(store.get(&keys::session("user-1")).as_deref(), Some("active"));
        assert_eq!(store.get(&keys::refresh(jti)).as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn test_expired_access_rejected_despite_marker() {
        let (sessions, _store) = manager();
        sessions.issue("user-1").await.unwrap();

        let claims = Claims::new("user-1", TokenKind::Access, -60).with_issuer("tollgate");
        let expired = sessions.codec().sign(claims).unwrap();

        let err = sessions.validate_access(&expired.token).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::TokenInvalid {
                reason: InvalidReason::Expired
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_marker_means_revoked() {
        let (sessions, store) = manager();
        let tokens = sessions.issue("user-1").await.unwrap();

        store.remove(&keys::session("user-1"));

        let err = sessions
            .validate_access(&tokens.access.token)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::SessionNotFound));
    }

    #[tokio::test]
    async fn test_silent_rotation() {
        let (sessions, store) = manager();
        let tokens = sessions.issue("user-1").await.unwrap();
        store.remove(&keys::session("user-1"));

        let auth = sessions
            .authenticate(Some(&tokens.access.token), Some(&tokens.refresh.token))
            .await
            .unwrap();

        assert_eq!(auth.subject, "user-1");
        let rotated = auth.rotated_access.expect("rotation should mint a token");
        assert_eq!(
            sessions.validate_access(&rotated.token).await.unwrap(),
            "user-1"
        );
    }

    #[tokio::test]
    async fn test_valid_access_has_no_side_effect() {
        let (sessions, _store) = manager();
        let tokens = sessions.issue("user-1").await.unwrap();

        let auth = sessions
            .authenticate(Some(&tokens.access.token), Some(&tokens.refresh.token))
            .await
            .unwrap();

        assert!(!auth.was_rotated());
    }

    #[tokio::test]
    async fn test_refresh_bound_to_other_subject() {
        let (sessions, store) = manager();
        let tokens = sessions.issue("user-1").await.unwrap();
        let jti = tokens.refresh.claims.jti().unwrap();

        store.insert(keys::refresh(jti), "user-2", None);

        let err = sessions
            .validate_refresh(&tokens.refresh.token)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::RefreshTokenInvalid));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (sessions, _store) = manager();
        let tokens = sessions.issue("user-1").await.unwrap();
        let jti = tokens.refresh.claims.jti().unwrap();

        sessions.revoke("user-1", jti).await.unwrap();
        sessions.revoke("user-1", jti).await.unwrap();

        let err = sessions
            .authenticate(Some(&tokens.access.token), Some(&tokens.refresh.token))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::RefreshTokenInvalid));
    }

    #[tokio::test]
    async fn test_multiple_refresh_tokens_revoked_independently() {
        let (sessions, _store) = manager();
        let first = sessions.issue("user-1").await.unwrap();
        let second = sessions.issue("user-1").await.unwrap();

        sessions
            .revoke("user-1", first.refresh.claims.jti().unwrap())
            .await
            .unwrap();

        assert!(sessions.validate_refresh(&first.refresh.token).await.is_err());
        assert!(sessions.validate_refresh(&second.refresh.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_no_credentials() {
        let (sessions, _store) = manager();
        let err = sessions.authenticate(None, None).await.unwrap_err();
        assert!(matches!(err, SessionError::NoCredentials));
        assert_eq!(err.status_code(), 401);
    }

    #[tokio::test]
    async fn test_store_outage_is_infrastructure_error() {
        let (sessions, store) = manager();
        let tokens = sessions.issue("user-1").await.unwrap();
        store.set_available(false);

        let err = sessions
            .authenticate(Some(&tokens.access.token), Some(&tokens.refresh.token))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::StoreUnavailable(StoreError::Unavailable { .. })
        ));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_issue_storage_failure() {
        let (sessions, store) = manager();
        store.set_available(false);

        let err = sessions.issue("user-1").await.unwrap_err();
        assert!(matches!(err, SessionError::SessionStorage(_)));
    }
}
