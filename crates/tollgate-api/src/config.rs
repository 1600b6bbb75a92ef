// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tollgate_core::ratelimit::RateLimitRule;
use tollgate_core::{RedisStoreConfig, TokenConfig};

// =============================================================================
// ConfigError
// =============================================================================

/// A configuration value that cannot be used.
#[derive(Debug, Error)]
#[error("Validation failed for '{field}': {message}")]
pub struct ConfigError {
    /// Offending field path.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ConfigError {
    /// Creates a validation error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// ApiConfig
// =============================================================================

/// Configuration for the API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host address.
    pub host: IpAddr,
    /// Server port.
    pub port: u16,
    /// Request timeout.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Graceful shutdown timeout.
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Token signing and lifetimes.
    pub session: TokenConfig,
    /// Refresh cookie attributes.
    pub cookie: CookieSettings,
    /// Credential store backend.
    pub store: StoreSettings,
    /// Per-scope rate ceilings.
    pub rate_limit: RateLimitSettings,
    /// Admin login.
    pub admin: AdminSettings,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
            cors: CorsConfig::default(),
            session: TokenConfig::default(),
            cookie: CookieSettings::default(),
            store: StoreSettings::default(),
            rate_limit: RateLimitSettings::default(),
            admin: AdminSettings::default(),
        }
    }
}

impl ApiConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the token signing secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.session.secret = secret.into();
        self
    }

    /// Sets the deployment environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.cookie.environment = environment;
        self
    }

    /// Checks the values the server cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.secret.is_empty() {
            return Err(ConfigError::invalid(
                "session.secret",
                "a signing secret is required (set TOLLGATE_JWT_SECRET)",
            ));
        }
        if self.session.access_ttl.is_zero() {
            return Err(ConfigError::invalid("session.access_ttl", "must be non-zero"));
        }
        if self.session.refresh_ttl.is_zero() {
            return Err(ConfigError::invalid("session.refresh_ttl", "must be non-zero"));
        }
        self.rate_limit.validate()?;
        if self.request_timeout.is_zero() {
            return Err(ConfigError::invalid("request_timeout", "must be non-zero"));
        }
        Ok(())
    }
}

// =============================================================================
// Environment
// =============================================================================

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    #[default]
    Development,
    /// Production deployment.
    Production,
}

impl Environment {
    /// Parses an environment name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }

    /// Returns the environment name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CookieSettings
// =============================================================================

/// Refresh cookie configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    /// Deployment environment; selects the `SameSite` attribute.
    pub environment: Environment,
    /// Cookie name.
    pub name: String,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            name: crate::cookie::REFRESH_COOKIE.to_string(),
        }
    }
}

// =============================================================================
// StoreSettings
// =============================================================================

/// Credential store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Redis.
    #[default]
    Redis,
    /// Process-local map; state is lost on restart.
    Memory,
}

/// Credential store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Which backend to use.
    pub backend: StoreBackend,
    /// Redis connection settings.
    pub redis: RedisStoreConfig,
}

// =============================================================================
// RateLimitSettings
// =============================================================================

/// Rate ceilings for each route group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Login endpoints.
    pub login: RateLimitRule,
    /// Authenticated API endpoints.
    pub api: RateLimitRule,
    /// Health endpoint.
    pub health: RateLimitRule,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            login: RateLimitRule::login(),
            api: RateLimitRule::api(),
            health: RateLimitRule::api(),
        }
    }
}

impl RateLimitSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, rule) in [("login", &self.login), ("api", &self.api), ("health", &self.health)] {
            if rule.max_requests == 0 {
                return Err(ConfigError::invalid(
                    format!("rate_limit.{}.max_requests", name),
                    "must be at least 1",
                ));
            }
            if rule.window.is_zero() {
                return Err(ConfigError::invalid(
                    format!("rate_limit.{}.window", name),
                    "must be non-zero",
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// AdminSettings
// =============================================================================

/// Admin login configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    /// Subject issued to the admin; granted the wildcard capability.
    pub subject: String,
    /// Argon2 PHC hash of the admin secret. Admin login is disabled when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_hash: Option<String>,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            subject: "admin".to_string(),
            secret_hash: None,
        }
    }
}

// =============================================================================
// CorsConfig
// =============================================================================

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. `*` mirrors the request origin.
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    pub allowed_methods: Vec<String>,
    /// Whether to allow credentials (the refresh cookie).
    pub allow_credentials: bool,
    /// Max age for preflight cache (seconds).
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            allow_credentials: true,
            max_age: 3600,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
