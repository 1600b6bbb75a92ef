// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Session Integration Tests
//!
//! - `test_session_*`: issue, validate, rotate, revoke
//! - `test_policy_*`: request-level authentication policy
//! - `test_outage_*`: store failures

use std::sync::Arc;
use std::time::Duration;

use tollgate_core::{
    keys, Claims, InvalidReason, SessionError, SessionManager, TokenCodec, TokenKind,
};
use tollgate_tests::prelude::*;

fn expired_access(codec: &TokenCodec, subject: &str) -> String {
    let claims = Claims::new(subject, TokenKind::Access, -60).with_issuer(codec.issuer());
    codec.sign(claims).unwrap().token
}

fn failing_sessions() -> (SessionManager, FailingStore) {
    let store = FailingStore::new();
    let codec = TokenCodec::new(token_config()).unwrap();
    (SessionManager::new(codec, Arc::new(store.clone())), store)
}

// =============================================================================
// Session Lifecycle
// =============================================================================

#[tokio::test]
async fn test_session_issue_writes_marker_and_refresh_entry() {
    init_test_logging();
    let (sessions, store) = memory_sessions();

    let tokens = sessions.issue("user-1").await.unwrap();
    let jti = tokens.refresh.claims.jti().unwrap();

    assert_eq!(store.get(&keys::session("user-1")).as_deref(), Some("active"));
    assert_eq!(store.get(&keys::refresh(jti)).as_deref(), Some("user-1"));

    let marker_ttl = store.ttl(&keys::session("user-1")).unwrap();
    assert!(marker_ttl <= Duration::from_secs(15 * 60));
    let refresh_ttl = store.ttl(&keys::refresh(jti)).unwrap();
    assert!(refresh_ttl > Duration::from_secs(29 * 24 * 3600));
}

#[tokio::test]
async fn test_session_rotate_keeps_refresh_token() {
    let (sessions, store) = memory_sessions();
    let tokens = sessions.issue("user-1").await.unwrap();
    store.remove(&keys::session("user-1"));

    let access = sessions.rotate(&tokens.refresh.token).await.unwrap();

    assert_eq!(sessions.validate_access(&access.token).await.unwrap(), "user-1");
    // The refresh token still works for another rotation.
    assert!(sessions.rotate(&tokens.refresh.token).await.is_ok());
}

#[tokio::test]
async fn test_session_revoke_blocks_both_tokens() {
    let (sessions, _store) = memory_sessions();
    let tokens = sessions.issue("user-1").await.unwrap();
    let jti = tokens.refresh.claims.jti().unwrap();

    sessions.revoke("user-1", jti).await.unwrap();

    assert!(matches!(
        sessions.validate_access(&tokens.access.token).await,
        Err(SessionError::SessionNotFound)
    ));
    assert!(matches!(
        sessions.rotate(&tokens.refresh.token).await,
        Err(SessionError::RefreshTokenInvalid)
    ));

    // Revoking again is not an error.
    sessions.revoke("user-1", jti).await.unwrap();
}

#[tokio::test]
async fn test_session_refresh_token_rejected_as_access() {
    let (sessions, _store) = memory_sessions();
    let tokens = sessions.issue("user-1").await.unwrap();

    assert!(matches!(
        sessions.validate_access(&tokens.refresh.token).await,
        Err(SessionError::TokenInvalid {
            reason: InvalidReason::WrongKind
        })
    ));
}

// =============================================================================
// Authentication Policy
// =============================================================================

#[tokio::test]
async fn test_policy_valid_access_has_no_side_effect() {
    let (sessions, store) = memory_sessions();
    let tokens = sessions.issue("user-1").await.unwrap();
    let before = store.len();

    let outcome = sessions
        .authenticate(Some(&tokens.access.token), Some(&tokens.refresh.token))
        .await
        .unwrap();

    assert_eq!(outcome.subject, "user-1");
    assert!(!outcome.was_rotated());
    assert_eq!(store.len(), before);
}

#[tokio::test]
async fn test_policy_expired_access_rotates() {
    let (sessions, _store) = memory_sessions();
    let tokens = sessions.issue("user-1").await.unwrap();
    let stale = expired_access(sessions.codec(), "user-1");

    let outcome = sessions
        .authenticate(Some(&stale), Some(&tokens.refresh.token))
        .await
        .unwrap();

    let rotated = outcome.rotated_access.unwrap();
    assert_eq!(rotated.claims.sub, "user-1");
    assert_eq!(sessions.validate_access(&rotated.token).await.unwrap(), "user-1");
}

#[tokio::test]
async fn test_policy_refresh_only_rotates() {
    let (sessions, _store) = memory_sessions();
    let tokens = sessions.issue("user-1").await.unwrap();

    let outcome = sessions
        .authenticate(None, Some(&tokens.refresh.token))
        .await
        .unwrap();
    assert!(outcome.was_rotated());
}

#[tokio::test]
async fn test_policy_expired_access_without_refresh_fails() {
    let (sessions, _store) = memory_sessions();
    let stale = expired_access(sessions.codec(), "user-1");

    let err = sessions.authenticate(Some(&stale), None).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::TokenInvalid {
            reason: InvalidReason::Expired
        }
    ));
    assert_eq!(err.status_code(), 401);
}

#[tokio::test]
async fn test_policy_nothing_presented() {
    let (sessions, _store) = memory_sessions();

    let err = sessions.authenticate(None, None).await.unwrap_err();
    assert!(matches!(err, SessionError::NoCredentials));
}

#[tokio::test]
async fn test_policy_refresh_for_another_subject_is_refused() {
    let (sessions, store) = memory_sessions();
    let tokens = sessions.issue("user-1").await.unwrap();
    let jti = tokens.refresh.claims.jti().unwrap();
    store.insert(keys::refresh(jti), "user-2", Some(Duration::from_secs(60)));

    let err = sessions
        .authenticate(None, Some(&tokens.refresh.token))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::RefreshTokenInvalid));
}

// =============================================================================
// Store Outages
// =============================================================================

#[tokio::test]
async fn test_outage_during_access_check_does_not_rotate() {
    let (sessions, store) = failing_sessions();
    let tokens = sessions.issue("user-1").await.unwrap();
    store.fail(StoreOp::SessionRead);

    let err = sessions
        .authenticate(Some(&tokens.access.token), Some(&tokens.refresh.token))
        .await
        .unwrap_err();

    assert!(err.is_infrastructure());
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_outage_during_issue_is_storage_error() {
    let (sessions, store) = failing_sessions();
    store.fail(StoreOp::RefreshWrite);

    let err = sessions.issue("user-1").await.unwrap_err();
    assert!(matches!(err, SessionError::SessionStorage(_)));

    // The marker is written first.
    assert!(store.inner().get(&keys::session("user-1")).is_some());
}

#[tokio::test]
async fn test_outage_during_rotation_write() {
    let (sessions, store) = failing_sessions();
    let tokens = sessions.issue("user-1").await.unwrap();
    store.fail(StoreOp::SessionWrite);

    let err = sessions.rotate(&tokens.refresh.token).await.unwrap_err();
    assert!(matches!(err, SessionError::SessionStorage(_)));
}

#[tokio::test]
async fn test_outage_during_revoke() {
    let (sessions, store) = failing_sessions();
    store.fail(StoreOp::Revoke);

    let err = sessions.revoke("user-1", "jti").await.unwrap_err();
    assert!(matches!(err, SessionError::StoreUnavailable(_)));
}
