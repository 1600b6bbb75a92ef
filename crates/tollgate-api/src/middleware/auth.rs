// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session authentication interceptor.
//!
//! Reads the access token from `Authorization: Bearer` and the refresh token
//! from the refresh cookie, then applies the session policy. When the access
//! token is rotated the new one is returned in `X-New-Access-Token`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    response::{IntoResponse, Response},
};
use tollgate_core::SessionManager;

use super::{Interceptor, Next};
use crate::context::{AuthContext, SessionEnded};
use crate::cookie::{read_cookie, REFRESH_COOKIE};
use crate::error::ApiError;
use crate::extractors::client_ip;
use crate::NEW_ACCESS_TOKEN_HEADER;

/// Authenticates the request and inserts an [`AuthContext`].
#[derive(Debug, Clone)]
pub struct AuthInterceptor {
    sessions: Arc<SessionManager>,
    cookie_name: String,
}

impl AuthInterceptor {
    /// Creates an interceptor reading the default refresh cookie.
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self {
            sessions,
            cookie_name: REFRESH_COOKIE.to_string(),
        }
    }

    /// Sets the refresh cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }
}

#[async_trait]
impl Interceptor for AuthInterceptor {
    async fn intercept(&self, mut req: Request<Body>, next: Next) -> Response {
        let access = match extract_bearer_token(&req) {
            Ok(token) => token,
            Err(e) => return e.into_response(),
        };
        let refresh = read_cookie(req.headers(), &self.cookie_name).map(str::to_string);

        let authenticated = match self
            .sessions
            .authenticate(access.as_deref(), refresh.as_deref())
            .await
        {
            Ok(authenticated) => authenticated,
            Err(e) => {
                tracing::debug!(error = %e, error_code = e.error_code(), "Authentication failed");
                return ApiError::from(e).into_response();
            }
        };

        let ctx = AuthContext::new(authenticated.subject.as_str())
            .with_rotation(authenticated.was_rotated())
            .with_client_ip(client_ip(req.headers(), req.extensions()));
        req.extensions_mut().insert(ctx);

        let rotated = match authenticated.rotated_access {
            Some(issued) => match HeaderValue::from_str(&issued.token) {
                Ok(value) => Some(value),
                Err(e) => {
                    return ApiError::internal(format!("Unencodable access token: {}", e))
                        .into_response()
                }
            },
            None => None,
        };

        let mut response = next.run(req).await;
        if response.extensions().get::<SessionEnded>().is_some() {
            return response;
        }
        if let Some(value) = rotated {
            tracing::debug!(subject = %authenticated.subject, "Access token silently rotated");
            response.headers_mut().insert(NEW_ACCESS_TOKEN_HEADER, value);
        }
        response
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Extracts the bearer token from the Authorization header.
///
/// A missing header is `Ok(None)`; a header that is not `Bearer <token>` is a
/// bad request.
pub fn extract_bearer_token<B>(req: &Request<B>) -> Result<Option<String>, ApiError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| Some(token.to_string()))
        .ok_or_else(|| ApiError::bad_request("Malformed Authorization header"))
}

// =============================================================================
// Tests
// =============================================================================
