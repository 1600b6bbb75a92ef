// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built configuration, state and an in-process HTTP client.

use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tollgate_api::{password::hash_secret, ApiConfig, ApiServer, AppState};
use tollgate_core::{
    MemoryStore, SessionManager, SessionTokens, StaticCapabilities, TokenCodec, TokenConfig,
};
use tower::ServiceExt;

use super::mocks::StaticUsers;

/// Signing secret used across the suites.
pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Admin secret whose hash is placed in [`test_config`].
pub const ADMIN_SECRET: &str = "let-me-in";

/// Capability guarding admin session revocation.
pub const REVOKE: &str = "sessions.revoke";

/// Argon2 hash of [`ADMIN_SECRET`], computed once per test binary.
pub fn admin_secret_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_secret(ADMIN_SECRET).expect("hash admin secret"))
}

/// Token configuration with the shared test secret.
pub fn token_config() -> TokenConfig {
    TokenConfig::new(TEST_SECRET)
}

/// Session manager over a fresh in-memory store.
pub fn memory_sessions() -> (Arc<SessionManager>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let codec = TokenCodec::new(token_config()).expect("codec");
    (Arc::new(SessionManager::new(codec, store.clone())), store)
}

/// API configuration with the test secret and admin hash.
pub fn test_config() -> ApiConfig {
    let mut config = ApiConfig::default().with_secret(TEST_SECRET);
    config.admin.secret_hash = Some(admin_secret_hash().to_string());
    config
}

/// Users known to [`TestApp`]: `alice` may revoke sessions, `bob` may not.
pub fn test_users() -> StaticUsers {
    StaticUsers::new()
        .with_user("alice", "alice-pw", "alice")
        .with_user("bob", "bob-pw", "bob")
}

/// Capabilities matching [`test_users`].
pub fn test_capabilities() -> StaticCapabilities {
    StaticCapabilities::new().grant("alice", [REVOKE])
}

// =============================================================================
// TestApp
// =============================================================================

/// The full router over an in-memory store.
pub struct TestApp {
    /// Shared store (inspect or break it from tests).
    pub store: Arc<MemoryStore>,
    /// Application state.
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// Builds the app with [`test_config`].
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Builds the app with a custom configuration.
    pub fn with_config(config: ApiConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::builder()
            .config(config)
            .store(store.clone())
            .credentials(Arc::new(test_users()))
            .capabilities(Arc::new(test_capabilities()))
            .build()
            .expect("app state");
        let router = ApiServer::new(state.clone()).router();

        Self {
            store,
            state,
            router,
        }
    }

    /// Issues a session directly, bypassing login.
    pub async fn session_for(&self, subject: &str) -> SessionTokens {
        self.state.sessions.issue(subject).await.expect("issue")
    }

    /// Sends a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Starts a request to `path`.
    pub fn request(method: Method, path: &str) -> RequestBuilder {
        RequestBuilder {
            builder: Request::builder().method(method).uri(path),
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RequestBuilder
// =============================================================================

/// Small wrapper over `http::request::Builder` for the common headers.
pub struct RequestBuilder {
    builder: axum::http::request::Builder,
}

impl RequestBuilder {
    /// Adds `Authorization: Bearer <token>`.
    pub fn bearer(mut self, token: &str) -> Self {
        self.builder = self
            .builder
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        self
    }

    /// Adds the refresh cookie.
    pub fn refresh_cookie(mut self, token: &str) -> Self {
        self.builder = self
            .builder
            .header(header::COOKIE, format!("refreshToken={}", token));
        self
    }

    /// Adds an arbitrary header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets `X-Forwarded-For`.
    pub fn from_ip(mut self, ip: &str) -> Self {
        self.builder = self.builder.header("X-Forwarded-For", ip);
        self
    }

    /// Finishes with a JSON body.
    pub fn json(self, body: Value) -> Request<Body> {
        self.builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    /// Finishes with an empty body.
    pub fn empty(self) -> Request<Body> {
        self.builder.body(Body::empty()).expect("request")
    }
}

// =============================================================================
// TestResponse
// =============================================================================

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// JSON body, or `Null` if empty or not JSON.
    pub body: Value,
}

impl TestResponse {
    /// Returns a header as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the `Set-Cookie` header.
    pub fn set_cookie(&self) -> Option<&str> {
        self.header(header::SET_COOKIE.as_str())
    }

    /// Returns the value set for the refresh cookie.
    pub fn refresh_token(&self) -> Option<String> {
        self.set_cookie()
            .and_then(|cookie| cookie.split(';').next())
            .and_then(|pair| pair.strip_prefix("refreshToken="))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// Returns `accessToken` from the body.
    pub fn access_token(&self) -> Option<String> {
        self.body["accessToken"].as_str().map(str::to_string)
    }

    /// Returns `error` from the body.
    pub fn error(&self) -> Option<&str> {
        self.body["error"].as_str()
    }
}
