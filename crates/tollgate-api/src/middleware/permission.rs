// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission interceptor.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tollgate_core::PermissionChecker;

use super::{Interceptor, Next};
use crate::context::AuthContext;
use crate::error::ApiError;

/// Forwards only callers holding at least one of the required capabilities.
///
/// Must run after [`AuthInterceptor`](super::AuthInterceptor).
#[derive(Debug, Clone)]
pub struct PermissionInterceptor {
    checker: Arc<PermissionChecker>,
    required: Vec<String>,
}

impl PermissionInterceptor {
    /// Requires any one of `permissions`.
    pub fn any_of<I, S>(checker: Arc<PermissionChecker>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            checker,
            required: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Requires a single permission.
    pub fn require(checker: Arc<PermissionChecker>, permission: impl Into<String>) -> Self {
        Self::any_of(checker, [permission.into()])
    }
}

#[async_trait]
impl Interceptor for PermissionInterceptor {
    async fn intercept(&self, req: Request<Body>, next: Next) -> Response {
        let Some(subject) = req
            .extensions()
            .get::<AuthContext>()
            .map(|ctx| ctx.subject.clone())
        else {
            return ApiError::unauthorized("Unauthorized").into_response();
        };

        let required: Vec<&str> = self.required.iter().map(String::as_str).collect();
        match self.checker.check_any(&subject, &required).await {
            Ok(true) => next.run(req).await,
            Ok(false) => {
                tracing::debug!(subject = %subject, required = ?self.required, "Permission denied");
                ApiError::forbidden(format!("missing any of {:?}", self.required)).into_response()
            }
            Err(e) => ApiError::from(e).into_response(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::StatusCode;
    use tollgate_core::{AdminGrant, StaticCapabilities};

    use crate::middleware::{interceptor_fn, Chain};

    fn checker() -> Arc<PermissionChecker> {
        let table = StaticCapabilities::new().grant("alice", ["sessions.revoke"]);
        Arc::new(PermissionChecker::new(Arc::new(AdminGrant::new(
            Arc::new(table),
            "admin",
        ))))
    }

    async fn call_as(subject: Option<&'static str>) -> StatusCode {
        let chain = Chain::new()
            .with(interceptor_fn(move |mut req: Request<Body>, next: Next| async move {
                if let Some(subject) = subject {
                    req.extensions_mut().insert(AuthContext::new(subject));
                }
                next.run(req).await
            }))
            .with(PermissionInterceptor::require(checker(), "sessions.revoke"));

        chain
            .run(Request::new(Body::empty()), |_req| async {
                StatusCode::OK.into_response()
            })
            .await
            .status()
    }

    #[tokio::test]
    async fn test_granted() {
        assert_eq!(call_as(Some("alice")).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_bypass() {
        assert_eq!(call_as(Some("admin")).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_denied() {
        assert_eq!(call_as(Some("bob")).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unauthenticated() {
        assert_eq!(call_as(None).await, StatusCode::UNAUTHORIZED);
    }
}
