// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Tollgate Integration Tests
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Pre-built configuration, state and an HTTP test client
//!   - `mocks`: Recording and failure-injecting implementations of the core traits
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p tollgate-tests
//! cargo test -p tollgate-tests --test integration_session
//! cargo test -p tollgate-tests --test integration_rate_limit
//! cargo test -p tollgate-tests --test integration_middleware
//! cargo test -p tollgate-tests --test integration_http
//! ```
//!
//! ## Test Categories
//!
//! ### Session Tests (`integration_session.rs`)
//! - Issue, validate, rotate, revoke
//! - Silent rotation policy and store outages
//!
//! ### Rate Limit Tests (`integration_rate_limit.rs`)
//! - Fixed windows under a paused clock
//! - Scope and caller isolation
//!
//! ### Middleware Tests (`integration_middleware.rs`)
//! - Interceptor ordering and short-circuiting
//! - Permission gate with admin wildcard
//!
//! ### HTTP Tests (`integration_http.rs`)
//! - Login, refresh cookie, rotation header, logout, admin revoke, health

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::fixtures::*;
    pub use crate::common::init_test_logging;
    pub use crate::common::mocks::*;
}
