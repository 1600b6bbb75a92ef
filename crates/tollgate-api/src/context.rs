// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication context.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authentication context for a request.
///
/// Inserted into the request extensions by the authentication interceptor
/// and read by later interceptors and handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated subject.
    pub subject: String,
    /// Whether the access token was silently rotated on this request.
    pub rotated: bool,
    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<IpAddr>,
    /// Request ID for tracing.
    pub request_id: Uuid,
}

impl AuthContext {
    /// Creates a context for an authenticated subject.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            rotated: false,
            client_ip: None,
            request_id: Uuid::now_v7(),
        }
    }

    /// Marks the context as silently rotated.
    pub fn with_rotation(mut self, rotated: bool) -> Self {
        self.rotated = rotated;
        self
    }

    /// Sets the client IP address.
    pub fn with_client_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.client_ip = ip;
        self
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }
}

/// Response extension set by handlers that end the caller's session.
///
/// The authentication interceptor drops a silently rotated access token from
/// such a response, since the session marker it depends on is already gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEnded;
