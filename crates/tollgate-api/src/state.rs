// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tollgate_core::{
    AdminGrant, CapabilityLookup, PermissionChecker, SessionManager, SessionStore,
    StaticCapabilities, TokenCodec, WindowCounter,
};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

// =============================================================================
// CredentialVerifier
// =============================================================================

/// Checks username/password pairs for user login.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + std::fmt::Debug {
    /// Returns the subject for valid credentials, `None` for invalid ones.
    async fn verify(&self, username: &str, password: &str) -> ApiResult<Option<String>>;
}

/// Verifier that rejects everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUsers;

#[async_trait]
impl CredentialVerifier for NoUsers {
    async fn verify(&self, _username: &str, _password: &str) -> ApiResult<Option<String>> {
        Ok(None)
    }
}

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers and interceptors.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Session manager.
    pub sessions: Arc<SessionManager>,
    /// Counter backing every rate limit scope.
    pub counter: Arc<dyn WindowCounter>,
    /// Permission checker (admin subject already granted the wildcard).
    pub permissions: Arc<PermissionChecker>,
    /// User credential verifier.
    pub credentials: Arc<dyn CredentialVerifier>,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the session manager.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Returns the credential store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        self.sessions.store()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions)
            .field("credentials", &self.credentials)
            .finish()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
///
/// The session store and window counter are usually the same backend; a
/// type implementing both can be passed to [`AppStateBuilder::store`].
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    sessions: Option<Arc<dyn SessionStore>>,
    counter: Option<Arc<dyn WindowCounter>>,
    capabilities: Option<Arc<dyn CapabilityLookup>>,
    credentials: Option<Arc<dyn CredentialVerifier>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses one backend for sessions and rate limiting.
    pub fn store<T>(mut self, store: Arc<T>) -> Self
    where
        T: SessionStore + WindowCounter + 'static,
    {
        self.sessions = Some(store.clone() as Arc<dyn SessionStore>);
        self.counter = Some(store as Arc<dyn WindowCounter>);
        self
    }

    /// Sets the session store.
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(store);
        self
    }

    /// Sets the rate limit counter.
    pub fn window_counter(mut self, counter: Arc<dyn WindowCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Sets the capability source for non-admin subjects.
    pub fn capabilities(mut self, lookup: Arc<dyn CapabilityLookup>) -> Self {
        self.capabilities = Some(lookup);
        self
    }

    /// Sets the user credential verifier.
    pub fn credentials(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.credentials = Some(verifier);
        self
    }

    /// Builds the AppState.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| ApiError::internal(e.to_string()))?;

        let sessions = self
            .sessions
            .ok_or_else(|| ApiError::internal("session store not configured"))?;
        let counter = self
            .counter
            .ok_or_else(|| ApiError::internal("rate limit counter not configured"))?;

        let codec = TokenCodec::new(config.session.clone())
            .map_err(|e| ApiError::internal(e.to_string()))?;

        let capabilities = self
            .capabilities
            .unwrap_or_else(|| Arc::new(StaticCapabilities::new()));
        let lookup = AdminGrant::new(capabilities, config.admin.subject.clone());

        Ok(AppState {
            config: Arc::new(config),
            sessions: Arc::new(SessionManager::new(codec, sessions)),
            counter,
            permissions: Arc::new(PermissionChecker::new(Arc::new(lookup))),
            credentials: self.credentials.unwrap_or_else(|| Arc::new(NoUsers)),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
