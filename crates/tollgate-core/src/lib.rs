// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tollgate-core
//!
//! Session, rate limiting and capability primitives for the Tollgate
//! authentication layer.
//!
//! - **Store**: credential store contracts with Redis and in-memory backends
//! - **Token**: HS256 access/refresh token codec
//! - **Session**: issue, validate, rotate and revoke, plus the request-level
//!   authentication policy
//! - **RateLimit**: atomic fixed-window limiter
//! - **Permission**: capability checks with a wildcard admin grant
//!
//! ## Feature Flags
//!
//! - `redis` (default): enables `RedisStore`
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tollgate_core::{MemoryStore, SessionManager, TokenCodec, TokenConfig};
//!
//! let codec = TokenCodec::new(TokenConfig::new("a-long-random-secret"))?;
//! let sessions = SessionManager::new(codec, Arc::new(MemoryStore::new()));
//!
//! let tokens = sessions.issue("user-42").await?;
//! assert_eq!(sessions.validate_access(&tokens.access.token).await?, "user-42");
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod permission;
pub mod ratelimit;
pub mod session;
pub mod store;
pub mod token;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use error::{
    InvalidReason, PermissionError, RateLimitError, SessionError, SessionResult, StoreError,
    StoreResult, TokenError,
};
pub use permission::{
    AdminGrant, CapabilityLookup, CapabilitySet, PermissionChecker, StaticCapabilities, WILDCARD,
};
pub use ratelimit::{scope_key, FixedWindowLimiter, RateLimitRule, RateLimiter};
pub use session::{Authenticated, RefreshGrant, SessionManager, SessionTokens};
pub use store::{keys, MemoryStore, SessionStore, WindowCounter, SESSION_ACTIVE};
#[cfg(feature = "redis")]
pub use store::{RedisStore, RedisStoreConfig};
pub use token::{Claims, IssuedToken, TokenCodec, TokenConfig, TokenKind};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
