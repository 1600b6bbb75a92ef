// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Administrative handlers.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, ValidatedJson};
use crate::state::AppState;

/// Session revocation request.
#[derive(Debug, Deserialize)]
pub struct RevokeSessionRequest {
    /// Subject whose session marker is removed.
    pub subject: String,
    /// Refresh token identifier to delete.
    pub jti: String,
}

/// Session revocation result.
#[derive(Debug, Serialize, Deserialize)]
pub struct RevokeSessionResponse {
    /// Always `true` on success; revoking an absent session still succeeds.
    pub revoked: bool,
}

/// POST /api/admin/sessions/revoke
pub async fn revoke_session(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(request): ValidatedJson<RevokeSessionRequest>,
) -> ApiResult<Json<RevokeSessionResponse>> {
    if request.subject.is_empty() || request.jti.is_empty() {
        return Err(ApiError::bad_request("subject and jti are required"));
    }

    state.sessions.revoke(&request.subject, &request.jti).await?;
    tracing::info!(
        actor = %ctx.subject,
        subject = %request.subject,
        "Session revoked by administrator"
    );

    Ok(Json(RevokeSessionResponse { revoked: true }))
}
