// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API request handlers.

pub mod admin;
pub mod auth;
pub mod health;

pub use admin::revoke_session;
pub use auth::{admin_login, logout, me, refresh, user_login};
pub use health::{health, ready};
