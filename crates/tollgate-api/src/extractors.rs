// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for API handlers.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, Extensions, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;

use crate::context::AuthContext;
use crate::error::ApiError;

/// Caller identity used when neither a forwarded address nor a peer address
/// is available.
pub const UNKNOWN_CALLER: &str = "unknown";

// =============================================================================
// Caller Identity
// =============================================================================

/// Returns the first `X-Forwarded-For` entry, if any.
fn forwarded_for(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Returns the peer address recorded by `into_make_service_with_connect_info`.
fn peer_ip(extensions: &Extensions) -> Option<IpAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Identity a rate limit is keyed on: the first `X-Forwarded-For` entry if
/// present, else the connection's remote IP.
pub fn caller_identity(headers: &HeaderMap, extensions: &Extensions) -> String {
    forwarded_for(headers)
        .map(str::to_string)
        .or_else(|| peer_ip(extensions).map(|ip| ip.to_string()))
        .unwrap_or_else(|| UNKNOWN_CALLER.to_string())
}

/// Best-effort client IP for logging.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    forwarded_for(headers)
        .and_then(|s| s.parse().ok())
        .or_else(|| peer_ip(extensions))
}

// =============================================================================
// Auth Extractor
// =============================================================================

/// Extractor for authenticated requests.
///
/// Extracts the `AuthContext` inserted by the authentication interceptor.
/// Returns 401 if the route was not behind one.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Auth(ctx): Auth) -> impl IntoResponse {
///     format!("Hello, {}", ctx.subject)
/// }
/// ```
pub struct Auth(pub AuthContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

// =============================================================================
// Client IP Extractor
// =============================================================================

/// Extractor for the client IP address.
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_ip(&parts.headers, &parts.extensions)))
    }
}

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// Extractor for JSON payloads that rejects with the standard error body.
pub struct ValidatedJson<T>(pub T);

impl<S, T> axum::extract::FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(
        req: axum::http::Request<axum::body::Body>,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|_| ApiError::bad_request("Invalid request body"))?;

        Ok(ValidatedJson(value))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer(ip: &str) -> Extensions {
        let mut extensions = Extensions::new();
        let addr: SocketAddr = format!("{}:5000", ip).parse().unwrap();
        extensions.insert(ConnectInfo(addr));
        extensions
    }

    #[test]
    fn test_forwarded_for_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Forwarded-For",
            HeaderValue::from_static("1.2.3.4, 10.0.0.1"),
        );

        assert_eq!(caller_identity(&headers, &peer("127.0.0.1")), "1.2.3.4");
        assert_eq!(
            client_ip(&headers, &peer("127.0.0.1")),
            Some("1.2.3.4".parse().unwrap())
        );
    }

    #[test]
    fn test_falls_back_to_peer() {
        let headers = HeaderMap::new();

        assert_eq!(caller_identity(&headers, &peer("192.168.1.7")), "192.168.1.7");
    }

    #[test]
    fn test_unknown_caller() {
        assert_eq!(
            caller_identity(&HeaderMap::new(), &Extensions::new()),
            UNKNOWN_CALLER
        );
        assert!(client_ip(&HeaderMap::new(), &Extensions::new()).is_none());
    }

    #[test]
    fn test_unparseable_forwarded_still_keys() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static("proxy-a"));

        assert_eq!(caller_identity(&headers, &Extensions::new()), "proxy-a");
        assert!(client_ip(&headers, &Extensions::new()).is_none());
    }
}
