// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handlers.

use std::time::Instant;

use axum::{extract::State, Json};

use crate::error::{ApiError, ApiResult};
use crate::response::{HealthResponse, ReadinessResponse};
use crate::state::AppState;

/// GET /api/health
///
/// Liveness check. Returns 200 OK if the service is running.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// GET /api/ready
///
/// Readiness check; 503 when the credential store does not answer.
pub async fn ready(State(state): State<AppState>) -> ApiResult<Json<ReadinessResponse>> {
    let started = Instant::now();
    if let Err(e) = state.store().ping().await {
        tracing::warn!(error = %e, "Readiness check failed");
        return Err(ApiError::service_unavailable("Credential store unavailable"));
    }

    Ok(Json(ReadinessResponse {
        status: "ready".to_string(),
        store_latency_ms: started.elapsed().as_millis() as u64,
    }))
}
