// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Refresh token cookie.
//!
//! ```text
//! Set-Cookie: refreshToken=<jwt>; Path=/; Max-Age=2592000; HttpOnly; Secure; SameSite=Lax
//! ```
//!
//! `SameSite=Lax` in development, `SameSite=None` in production.

use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::{CookieSettings, Environment};
use crate::error::ApiError;

/// Default refresh cookie name.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Returns the `SameSite` attribute for an environment.
pub fn same_site(environment: Environment) -> &'static str {
    match environment {
        Environment::Development => "Lax",
        Environment::Production => "None",
    }
}

/// Builds the `Set-Cookie` value carrying a refresh token.
pub fn refresh_cookie(
    settings: &CookieSettings,
    token: &str,
    max_age: Duration,
) -> Result<HeaderValue, ApiError> {
    let value = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; Secure; SameSite={}",
        settings.name,
        token,
        max_age.as_secs(),
        same_site(settings.environment)
    );
    HeaderValue::from_str(&value)
        .map_err(|e| ApiError::internal(format!("Invalid cookie value: {}", e)))
}

/// Builds a `Set-Cookie` value that expires the refresh cookie.
pub fn clear_refresh_cookie(settings: &CookieSettings) -> Result<HeaderValue, ApiError> {
    refresh_cookie(settings, "", Duration::ZERO)
}

/// Returns the named cookie from the request's `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

// =============================================================================
// Tests
// =============================================================================
