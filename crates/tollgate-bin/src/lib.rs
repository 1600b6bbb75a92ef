// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tollgate-bin
//!
//! CLI binary for the Tollgate session service.
//!
//! - CLI argument parsing with clap
//! - YAML configuration with environment overrides
//! - Static user directory
//! - Logging initialization
//! - Command implementations (serve, validate, hash-secret, version)
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default command)
//! TOLLGATE_JWT_SECRET=... tollgate
//!
//! # Start with custom config
//! tollgate -c /etc/tollgate/tollgate.yaml
//!
//! # Validate configuration
//! tollgate validate
//!
//! # Hash the admin secret for `admin.secret_hash`
//! tollgate hash-secret "correct horse battery staple"
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod shutdown;

pub use cli::{Cli, Commands};
pub use config::{load_config, TollgateConfig};
pub use directory::{UserDirectory, UserEntry};
pub use error::{BinError, BinResult};
pub use logging::init_logging;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
