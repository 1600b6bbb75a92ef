// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tollgate-api
//!
//! HTTP surface of the Tollgate session layer.
//!
//! This crate provides the interceptor chain (rate limit, authentication,
//! permission), the refresh cookie, login/refresh/logout endpoints and the
//! axum server that wires them together.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod context;
pub mod cookie;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod response;
pub mod server;
pub mod state;

pub use config::{
    AdminSettings, ApiConfig, ConfigError, CookieSettings, CorsConfig, Environment,
    RateLimitSettings, StoreBackend, StoreSettings,
};
pub use context::{AuthContext, SessionEnded};
pub use error::{ApiError, ApiResult};
pub use middleware::{Chain, Interceptor, Next};
pub use server::{ApiServer, REVOKE_PERMISSION};
pub use state::{AppState, AppStateBuilder, CredentialVerifier, NoUsers};

/// Response header carrying a silently rotated access token.
pub const NEW_ACCESS_TOKEN_HEADER: &str = "x-new-access-token";

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
