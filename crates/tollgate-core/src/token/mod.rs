// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Signed, expiring tokens.
//!
//! This module provides:
//! - Claims shared by access and refresh tokens
//! - The HS256 token codec and its configuration

mod claims;
mod codec;

pub use claims::{Claims, TokenKind};
pub use codec::{IssuedToken, TokenCodec, TokenConfig};
