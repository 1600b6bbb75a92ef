// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # HTTP Integration Tests
//!
//! The assembled router driven in-process.
//!
//! - `test_login_*`: admin and user login, refresh cookie
//! - `test_session_*`: me, silent rotation, explicit refresh, logout
//! - `test_admin_*`: session revocation
//! - `test_health_*`: liveness and readiness

use std::sync::Arc;

use axum::http::{header, Method, StatusCode};
use serde_json::json;
use tollgate_api::{ApiConfig, ApiServer, AppState, Environment, NEW_ACCESS_TOKEN_HEADER};
use tollgate_core::keys;
use tollgate_tests::prelude::*;
use tower::ServiceExt;

async fn user_login(app: &TestApp, username: &str, password: &str) -> TestResponse {
    app.send(
        TestApp::request(Method::POST, "/api/auth/user-login")
            .json(json!({"username": username, "password": password})),
    )
    .await
}

async fn me(app: &TestApp, access: Option<&str>, refresh: Option<&str>) -> TestResponse {
    let mut request = TestApp::request(Method::GET, "/api/auth/me");
    if let Some(token) = access {
        request = request.bearer(token);
    }
    if let Some(token) = refresh {
        request = request.refresh_cookie(token);
    }
    app.send(request.empty()).await
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_admin_sets_cookie_and_returns_access_token() {
    init_test_logging();
    let app = TestApp::new();

    let response = app
        .send(
            TestApp::request(Method::POST, "/api/auth/admin/login")
                .json(json!({"secretKey": ADMIN_SECRET})),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let access = response.access_token().unwrap();
    assert_eq!(response.body["tokenType"], "Bearer");

    let cookie = response.set_cookie().unwrap();
    assert!(cookie.starts_with("refreshToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=2592000"));

    assert_eq!(
        app.state.sessions.validate_access(&access).await.unwrap(),
        "admin"
    );
}

#[tokio::test]
async fn test_login_admin_wrong_secret() {
    let app = TestApp::new();

    let response = app
        .send(
            TestApp::request(Method::POST, "/api/auth/admin/login")
                .json(json!({"secretKey": "guess"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), Some("Invalid secret password"));
    assert!(response.set_cookie().is_none());
}

#[tokio::test]
async fn test_login_admin_disabled_without_hash() {
    let app = TestApp::with_config(ApiConfig::default().with_secret(TEST_SECRET));

    let response = app
        .send(
            TestApp::request(Method::POST, "/api/auth/admin/login")
                .json(json!({"secretKey": ADMIN_SECRET})),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_production_cookie_is_same_site_none() {
    let app = TestApp::with_config(test_config().with_environment(Environment::Production));

    let response = user_login(&app, "alice", "alice-pw").await;
    assert!(response.set_cookie().unwrap().contains("SameSite=None"));
}

#[tokio::test]
async fn test_login_user() {
    let app = TestApp::new();

    let response = user_login(&app, "alice", "alice-pw").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.refresh_token().is_some());

    let rejected = user_login(&app, "alice", "nope").await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    assert_eq!(rejected.error(), Some("Invalid username or password"));
}

#[tokio::test]
async fn test_login_malformed_body() {
    let app = TestApp::new();

    let response = app
        .send(
            TestApp::request(Method::POST, "/api/auth/user-login")
                .json(json!({"user": "alice"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), Some("Invalid request body"));
}

#[tokio::test]
async fn test_login_store_outage_is_500() {
    let store = Arc::new(FailingStore::new());
    let state = AppState::builder()
        .config(test_config())
        .store(store.clone())
        .credentials(Arc::new(test_users()))
        .build()
        .unwrap();
    let router = ApiServer::new(state).router();
    store.fail(StoreOp::RefreshWrite);

    let response = router
        .oneshot(
            TestApp::request(Method::POST, "/api/auth/user-login")
                .json(json!({"username": "alice", "password": "alice-pw"})),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

// =============================================================================
// Session Endpoints
// =============================================================================

#[tokio::test]
async fn test_session_me_with_valid_access() {
    let app = TestApp::new();
    let tokens = app.session_for("alice").await;

    let response = me(&app, Some(&tokens.access.token), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["subject"], "alice");
    assert_eq!(response.body["rotated"], false);
    assert!(response.header(NEW_ACCESS_TOKEN_HEADER).is_none());
}

#[tokio::test]
async fn test_session_silent_rotation() {
    let app = TestApp::new();
    let tokens = app.session_for("alice").await;
    app.store.remove(&keys::session("alice"));

    let response = me(&app, Some(&tokens.access.token), Some(&tokens.refresh.token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["rotated"], true);
    let rotated = response.header(NEW_ACCESS_TOKEN_HEADER).unwrap();
    assert_eq!(
        app.state.sessions.validate_access(rotated).await.unwrap(),
        "alice"
    );
}

#[tokio::test]
async fn test_session_expired_without_refresh() {
    let app = TestApp::new();
    let tokens = app.session_for("alice").await;
    app.store.remove(&keys::session("alice"));

    let response = me(&app, Some(&tokens.access.token), None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), Some("Session expired, please log in again"));
}

#[tokio::test]
async fn test_session_no_credentials() {
    let app = TestApp::new();

    let response = me(&app, None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), Some("Unauthorized"));
}

#[tokio::test]
async fn test_session_malformed_authorization_header() {
    let app = TestApp::new();

    let response = app
        .send(
            TestApp::request(Method::GET, "/api/auth/me")
                .header("Authorization", "Token abc")
                .empty(),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_explicit_refresh() {
    let app = TestApp::new();
    let login = user_login(&app, "alice", "alice-pw").await;
    let refresh = login.refresh_token().unwrap();

    let response = app
        .send(
            TestApp::request(Method::POST, "/api/auth/refresh")
                .refresh_cookie(&refresh)
                .empty(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let access = response.access_token().unwrap();
    assert_eq!(
        app.state.sessions.validate_access(&access).await.unwrap(),
        "alice"
    );
}

#[tokio::test]
async fn test_session_refresh_without_cookie() {
    let app = TestApp::new();

    let response = app
        .send(TestApp::request(Method::POST, "/api/auth/refresh").empty())
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_logout_revokes_and_clears_cookie() {
    let app = TestApp::new();
    let login = user_login(&app, "alice", "alice-pw").await;
    let access = login.access_token().unwrap();
    let refresh = login.refresh_token().unwrap();

    let response = app
        .send(
            TestApp::request(Method::POST, "/api/auth/logout")
                .bearer(&access)
                .refresh_cookie(&refresh)
                .empty(),
        )
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.set_cookie().unwrap().contains("Max-Age=0"));

    let after = me(&app, Some(&access), Some(&refresh)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_logout_after_rotation_returns_no_access_token() {
    let app = TestApp::new();
    let login = user_login(&app, "alice", "alice-pw").await;
    let access = login.access_token().unwrap();
    let refresh = login.refresh_token().unwrap();
    app.store.remove(&keys::session("alice"));

    let response = app
        .send(
            TestApp::request(Method::POST, "/api/auth/logout")
                .bearer(&access)
                .refresh_cookie(&refresh)
                .empty(),
        )
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.header(NEW_ACCESS_TOKEN_HEADER).is_none());
    assert!(app.store.get(&keys::session("alice")).is_none());
}

#[tokio::test]
async fn test_session_logout_requires_refresh_cookie() {
    let app = TestApp::new();
    let tokens = app.session_for("alice").await;

    let response = app
        .send(
            TestApp::request(Method::POST, "/api/auth/logout")
                .bearer(&tokens.access.token)
                .empty(),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_logout_with_foreign_refresh_token() {
    let app = TestApp::new();
    let alice = app.session_for("alice").await;
    let bob = app.session_for("bob").await;

    let response = app
        .send(
            TestApp::request(Method::POST, "/api/auth/logout")
                .bearer(&alice.access.token)
                .refresh_cookie(&bob.refresh.token)
                .empty(),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Bob's session is untouched.
    assert!(app.state.sessions.validate_access(&bob.access.token).await.is_ok());
}

// =============================================================================
// Admin
// =============================================================================

async fn revoke(app: &TestApp, access: &str, subject: &str, jti: &str) -> TestResponse {
    app.send(
        TestApp::request(Method::POST, "/api/admin/sessions/revoke")
            .bearer(access)
            .json(json!({"subject": subject, "jti": jti})),
    )
    .await
}

#[tokio::test]
async fn test_admin_revokes_another_session() {
    let app = TestApp::new();
    let admin = app.session_for("admin").await;
    let bob = app.session_for("bob").await;
    let jti = bob.refresh.claims.jti().unwrap();

    let response = revoke(&app, &admin.access.token, "bob", jti).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["revoked"], true);
    assert!(app.state.sessions.validate_access(&bob.access.token).await.is_err());
    assert!(app.state.sessions.rotate(&bob.refresh.token).await.is_err());
}

#[tokio::test]
async fn test_admin_capability_holder_may_revoke() {
    let app = TestApp::new();
    let alice = app.session_for("alice").await;
    let bob = app.session_for("bob").await;

    let jti = bob.refresh.claims.jti().unwrap();

    let response = revoke(&app, &alice.access.token, "bob", jti).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_revoke_forbidden_without_capability() {
    let app = TestApp::new();
    let bob = app.session_for("bob").await;
    let alice = app.session_for("alice").await;

    let jti = alice.refresh.claims.jti().unwrap();

    let response = revoke(&app, &bob.access.token, "alice", jti).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error(), Some("Forbidden"));
    assert!(app.state.sessions.validate_access(&alice.access.token).await.is_ok());
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_ok() {
    let app = TestApp::new();

    let response = app
        .send(TestApp::request(Method::GET, "/api/health").empty())
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_health_ready_tracks_store() {
    let app = TestApp::new();

    let ready = app
        .send(TestApp::request(Method::GET, "/api/ready").empty())
        .await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.body["status"], "ready");

    app.store.set_available(false);
    let down = app
        .send(TestApp::request(Method::GET, "/api/ready").empty())
        .await;
    assert_eq!(down.status, StatusCode::SERVICE_UNAVAILABLE);
}
