// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request interceptors.
//!
//! - [`Chain`]: ordered interceptor pipeline usable as a `tower::Layer`
//! - [`RateLimitInterceptor`]: fixed-window ceiling per scope and caller
//! - [`AuthInterceptor`]: access/refresh policy with silent rotation
//! - [`PermissionInterceptor`]: capability gate
//!
//! Recommended order: rate limit, then authentication, then permission.

mod auth;
mod chain;
mod permission;
mod rate_limit;

pub use auth::{extract_bearer_token, AuthInterceptor};
pub use chain::{interceptor_fn, Chain, ChainService, FnInterceptor, Interceptor, Next};
pub use permission::PermissionInterceptor;
pub use rate_limit::RateLimitInterceptor;
