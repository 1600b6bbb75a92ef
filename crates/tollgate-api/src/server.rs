// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.
//!
//! ```text
//! /api/auth/admin/login, /api/auth/user-login, /api/auth/refresh
//!     rate limit (login)
//! /api/auth/me, /api/auth/logout
//!     rate limit (api) -> auth
//! /api/admin/sessions/revoke
//!     rate limit (api) -> auth -> permission (sessions.revoke)
//! /api/health
//!     rate limit (health)
//! /api/ready
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{AuthInterceptor, Chain, PermissionInterceptor, RateLimitInterceptor};
use crate::state::AppState;
use crate::NEW_ACCESS_TOKEN_HEADER;

/// Capability required to revoke another subject's session.
pub const REVOKE_PERMISSION: &str = "sessions.revoke";

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self { state, config }
    }

    /// Creates the router with all routes and interceptor chains.
    pub fn router(&self) -> Router {
        let state = &self.state;
        let limits = &self.config.rate_limit;

        let limit = |tag: &str, rule| {
            RateLimitInterceptor::from_rule(state.counter.clone(), tag.to_string(), rule)
        };
        let login_limit = limit("login", limits.login);
        let api_limit = limit("api", limits.api);
        let health_limit = limit("health", limits.health);
        let auth = AuthInterceptor::new(state.sessions.clone())
            .with_cookie_name(self.config.cookie.name.clone());

        let login_routes = Router::new()
            .route("/api/auth/admin/login", post(handlers::admin_login))
            .route("/api/auth/user-login", post(handlers::user_login))
            .route("/api/auth/refresh", post(handlers::refresh))
            .route_layer(Chain::new().with(login_limit));

        let session_routes = Router::new()
            .route("/api/auth/me", get(handlers::me))
            .route("/api/auth/logout", post(handlers::logout))
            .route_layer(Chain::new().with(api_limit.clone()).with(auth.clone()));

        let admin_routes = Router::new()
            .route("/api/admin/sessions/revoke", post(handlers::revoke_session))
            .route_layer(
                Chain::new()
                    .with(api_limit)
                    .with(auth)
                    .with(PermissionInterceptor::require(
                        state.permissions.clone(),
                        REVOKE_PERMISSION,
                    )),
            );

        let health_routes = Router::new()
            .route("/api/health", get(handlers::health))
            .route_layer(Chain::new().with(health_limit))
            .route("/api/ready", get(handlers::ready));

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.request_timeout,
            ))
            .layer(create_cors_layer(&self.config));

        Router::new()
            .merge(login_routes)
            .merge(session_routes)
            .merge(admin_routes)
            .merge(health_routes)
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    /// Runs the server.
    pub async fn run(self) -> ApiResult<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Runs the server with graceful shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let router = self.router();

        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind: {}", e)))?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");

        Ok(())
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Creates the CORS layer from configuration.
///
/// Credentials rule out a literal `*`, so a wildcard origin mirrors the
/// request's `Origin` instead.
fn create_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = &config.cors;

    let origins = if cors.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let parsed: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([HeaderName::from_static(NEW_ACCESS_TOKEN_HEADER)])
        .allow_credentials(cors.allow_credentials)
        .max_age(Duration::from_secs(cors.max_age))
}

// =============================================================================
// Tests
// =============================================================================
