// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration file loading.
//!
//! # Loading Pipeline
//!
//! 1. Parse the YAML file (missing sections take their defaults)
//! 2. Apply environment variable overrides
//! 3. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! TOLLGATE_JWT_SECRET=...          session.secret (required somewhere)
//! TOLLGATE_ENV=production          cookie.environment
//! TOLLGATE_REDIS_URL=redis://...   store.redis.url
//! TOLLGATE_PORT=9090               port
//! TOLLGATE_ADMIN_SECRET_HASH=...   admin.secret_hash
//! ```

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tollgate_api::{ApiConfig, ConfigError, Environment};
use tracing::{debug, info};

use crate::directory::UserEntry;
use crate::error::{BinError, BinResult};

/// Signing secret.
pub const ENV_JWT_SECRET: &str = "TOLLGATE_JWT_SECRET";
/// Deployment environment.
pub const ENV_ENVIRONMENT: &str = "TOLLGATE_ENV";
/// Redis connection URL.
pub const ENV_REDIS_URL: &str = "TOLLGATE_REDIS_URL";
/// Listen port.
pub const ENV_PORT: &str = "TOLLGATE_PORT";
/// Admin secret hash.
pub const ENV_ADMIN_SECRET_HASH: &str = "TOLLGATE_ADMIN_SECRET_HASH";

// =============================================================================
// TollgateConfig
// =============================================================================

/// Top-level configuration file.
///
/// ```yaml
/// api:
///   port: 8080
///   session:
///     access_ttl: 15m
///     refresh_ttl: 30d
///   store:
///     backend: redis
///     redis:
///       url: redis://127.0.0.1:6379
/// users:
///   - username: operator
///     password_hash: $argon2id$...
///     capabilities: [sessions.revoke]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TollgateConfig {
    /// HTTP server and session settings.
    pub api: ApiConfig,
    /// Static user directory.
    pub users: Vec<UserEntry>,
}

impl TollgateConfig {
    /// Validates the server settings and the user directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()?;

        for (i, user) in self.users.iter().enumerate() {
            if user.username.is_empty() {
                return Err(ConfigError::invalid(format!("users[{}].username", i), "must not be empty"));
            }
            if user.password_hash.is_empty() {
                return Err(ConfigError::invalid(
                    format!("users[{}].password_hash", i),
                    "must not be empty (see `tollgate hash-secret`)",
                ));
            }
            if user.subject() == self.api.admin.subject {
                return Err(ConfigError::invalid(
                    format!("users[{}].subject", i),
                    format!(
                        "'{}' is reserved for the admin login (admin.subject)",
                        user.subject()
                    ),
                ));
            }
            if self.users[..i].iter().any(|u| u.username == user.username) {
                return Err(ConfigError::invalid(
                    format!("users[{}].username", i),
                    format!("duplicate username '{}'", user.username),
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Loads, overrides and validates the configuration at `path`.
pub fn load_config(path: impl AsRef<Path>) -> BinResult<TollgateConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {}", path.display());

    if !path.exists() {
        return Err(BinError::config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    finish(config, |name| env::var(name).ok())
}

/// Builds the configuration from defaults and the environment alone.
pub fn load_from_env() -> BinResult<TollgateConfig> {
    finish(TollgateConfig::default(), |name| env::var(name).ok())
}

/// Parses YAML content without overrides or validation.
pub fn parse_config(content: &str) -> BinResult<TollgateConfig> {
    if content.trim().is_empty() {
        return Ok(TollgateConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| BinError::config(format!("Failed to parse YAML: {}", e)))
}

fn finish<F>(mut config: TollgateConfig, lookup: F) -> BinResult<TollgateConfig>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, lookup)?;
    config.validate()?;

    debug!(
        users = config.users.len(),
        backend = ?config.api.store.backend,
        environment = config.api.cookie.environment.as_str(),
        "Configuration loaded"
    );
    Ok(config)
}

/// Applies overrides from `lookup` (normally the process environment).
pub fn apply_env_overrides<F>(config: &mut TollgateConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let api = &mut config.api;

    if let Some(value) = lookup(ENV_JWT_SECRET) {
        api.session.secret = value;
    }
    if let Some(value) = lookup(ENV_ENVIRONMENT) {
        api.cookie.environment = Environment::parse(&value).ok_or_else(|| {
            ConfigError::invalid(ENV_ENVIRONMENT, "expected 'development' or 'production'")
        })?;
    }
    if let Some(value) = lookup(ENV_REDIS_URL) {
        api.store.redis.url = value;
    }
    if let Some(value) = lookup(ENV_PORT) {
        api.port = value
            .parse()
            .map_err(|_| ConfigError::invalid(ENV_PORT, "expected valid port number"))?;
    }
    if let Some(value) = lookup(ENV_ADMIN_SECRET_HASH) {
        api.admin.secret_hash = Some(value).filter(|hash| !hash.is_empty());
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
