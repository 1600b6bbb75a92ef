// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tollgate_core::{SessionTokens, TokenKind};

use crate::context::{AuthContext, SessionEnded};
use crate::cookie::{clear_refresh_cookie, read_cookie, refresh_cookie};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, ClientIp, ValidatedJson};
use crate::password::verify_secret;
use crate::response::{IdentityResponse, TokenResponse};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Admin login request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginRequest {
    /// Admin secret.
    pub secret_key: String,
}

/// User login request.
#[derive(Debug, Deserialize)]
pub struct UserLoginRequest {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

// =============================================================================
// Login
// =============================================================================

/// POST /api/auth/admin/login
pub async fn admin_login(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    ValidatedJson(request): ValidatedJson<AdminLoginRequest>,
) -> ApiResult<Response> {
    let admin = &state.config.admin;

    let accepted = match admin.secret_hash.as_deref() {
        Some(hash) => verify_secret(hash, &request.secret_key)?,
        None => {
            tracing::warn!("Admin login attempted but no admin secret is configured");
            false
        }
    };
    if !accepted {
        tracing::warn!(client_ip = ?client_ip, "Admin login rejected");
        return Err(ApiError::unauthorized("Invalid secret password"));
    }

    let tokens = state.sessions.issue(&admin.subject).await?;
    tracing::info!(subject = %admin.subject, client_ip = ?client_ip, "Admin logged in");

    login_response(&state, tokens)
}

/// POST /api/auth/user-login
pub async fn user_login(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    ValidatedJson(request): ValidatedJson<UserLoginRequest>,
) -> ApiResult<Response> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let Some(subject) = state
        .credentials
        .verify(&request.username, &request.password)
        .await?
    else {
        tracing::warn!(username = %request.username, client_ip = ?client_ip, "User login rejected");
        return Err(ApiError::unauthorized("Invalid username or password"));
    };

    let tokens = state.sessions.issue(&subject).await?;
    tracing::info!(subject = %subject, client_ip = ?client_ip, "User logged in");

    login_response(&state, tokens)
}

/// Access token in the body, refresh token in the cookie.
fn login_response(state: &AppState, tokens: SessionTokens) -> ApiResult<Response> {
    let cookie = refresh_cookie(
        &state.config.cookie,
        &tokens.refresh.token,
        state.sessions.codec().ttl(TokenKind::Refresh),
    )?;

    let mut response = Json(TokenResponse::new(&tokens.access)).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

// =============================================================================
// Refresh
// =============================================================================

/// POST /api/auth/refresh
///
/// Mints a new access token from the refresh cookie. The refresh token itself
/// is not replaced.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<TokenResponse>> {
    let token = read_cookie(&headers, &state.config.cookie.name)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    let access = state.sessions.rotate(token).await?;
    tracing::debug!(subject = %access.claims.sub, "Access token refreshed");

    Ok(Json(TokenResponse::new(&access)))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /api/auth/logout
///
/// Revokes the caller's session marker and the presented refresh token.
pub async fn logout(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let token = read_cookie(&headers, &state.config.cookie.name)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    let claims = state
        .sessions
        .codec()
        .verify(token, TokenKind::Refresh)
        .map_err(|_| ApiError::unauthorized("Unauthorized"))?;
    if claims.sub != ctx.subject {
        tracing::warn!(subject = %ctx.subject, "Logout with another subject's refresh token");
        return Err(ApiError::forbidden("Refresh token belongs to another subject"));
    }
    let jti = claims
        .jti()
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    state.sessions.revoke(&ctx.subject, jti).await?;
    log_logout(&ctx);

    let mut response = StatusCode::NO_CONTENT.into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, clear_refresh_cookie(&state.config.cookie)?);
    response.extensions_mut().insert(SessionEnded);
    Ok(response)
}

fn log_logout(ctx: &AuthContext) {
    tracing::info!(
        subject = %ctx.subject,
        client_ip = ?ctx.client_ip,
        request_id = %ctx.request_id,
        "Logged out"
    );
}

// =============================================================================
// Me
// =============================================================================

/// GET /api/auth/me
pub async fn me(Auth(ctx): Auth) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        subject: ctx.subject,
        rotated: ctx.rotated,
    })
}
