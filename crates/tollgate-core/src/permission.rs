// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Capability checks.
//!
//! A caller is granted a set of capability names by a [`CapabilityLookup`].
//! The wildcard capability [`WILDCARD`] grants every permission, and
//! [`AdminGrant`] hands it to the configured admin subject.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PermissionError;

/// Capability that satisfies every permission check.
pub const WILDCARD: &str = "*";

/// Capability names granted to one subject.
pub type CapabilitySet = HashSet<String>;

// =============================================================================
// CapabilityLookup
// =============================================================================

/// Source of the capabilities granted to a subject.
#[async_trait]
pub trait CapabilityLookup: Send + Sync + std::fmt::Debug {
    /// Returns the capability names granted to `subject`.
    ///
    /// Unknown subjects get an empty set; `Err` means the source failed.
    async fn capabilities(&self, subject: &str) -> Result<CapabilitySet, PermissionError>;
}

/// Fixed subject-to-capabilities table.
#[derive(Debug, Clone, Default)]
pub struct StaticCapabilities {
    grants: HashMap<String, CapabilitySet>,
}

impl StaticCapabilities {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants capabilities to a subject.
    pub fn grant<I, S>(mut self, subject: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grants
            .entry(subject.into())
            .or_default()
            .extend(capabilities.into_iter().map(Into::into));
        self
    }
}

#[async_trait]
impl CapabilityLookup for StaticCapabilities {
    async fn capabilities(&self, subject: &str) -> Result<CapabilitySet, PermissionError> {
        Ok(self.grants.get(subject).cloned().unwrap_or_default())
    }
}

/// Decorator granting [`WILDCARD`] to the admin subject.
///
/// Other subjects are resolved by the wrapped lookup.
#[derive(Debug, Clone)]
pub struct AdminGrant {
    inner: Arc<dyn CapabilityLookup>,
    admin_subject: String,
}

impl AdminGrant {
    /// Wraps `inner`, granting the wildcard to `admin_subject`.
    pub fn new(inner: Arc<dyn CapabilityLookup>, admin_subject: impl Into<String>) -> Self {
        Self {
            inner,
            admin_subject: admin_subject.into(),
        }
    }
}

#[async_trait]
impl CapabilityLookup for AdminGrant {
    async fn capabilities(&self, subject: &str) -> Result<CapabilitySet, PermissionError> {
        if subject == self.admin_subject {
            return Ok(CapabilitySet::from([WILDCARD.to_string()]));
        }
        self.inner.capabilities(subject).await
    }
}

// =============================================================================
// PermissionChecker
// =============================================================================

/// Tests capability membership through an injected lookup.
#[derive(Debug, Clone)]
pub struct PermissionChecker {
    lookup: Arc<dyn CapabilityLookup>,
}

impl PermissionChecker {
    /// Creates a checker.
    pub fn new(lookup: Arc<dyn CapabilityLookup>) -> Self {
        Self { lookup }
    }

    /// Returns `true` if `subject` holds `permission` or the wildcard.
    pub async fn check(&self, subject: &str, permission: &str) -> Result<bool, PermissionError> {
        self.check_any(subject, &[permission]).await
    }

    /// Returns `true` if `subject` holds any of `permissions` or the wildcard.
    pub async fn check_any(
        &self,
        subject: &str,
        permissions: &[&str],
    ) -> Result<bool, PermissionError> {
        let granted = self.lookup.capabilities(subject).await?;

        Ok(granted.contains(WILDCARD) || permissions.iter().any(|p| granted.contains(*p)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct BrokenLookup;

    #[async_trait]
    impl CapabilityLookup for BrokenLookup {
        async fn capabilities(&self, _subject: &str) -> Result<CapabilitySet, PermissionError> {
            Err(PermissionError::lookup("database offline"))
        }
    }

    fn checker() -> PermissionChecker {
        let table = StaticCapabilities::new()
            .grant("alice", ["workspace.read", "workspace.write"])
            .grant("bob", ["workspace.read"]);
        PermissionChecker::new(Arc::new(AdminGrant::new(Arc::new(table), "admin")))
    }

    #[tokio::test]
    async fn test_check_membership() {
        let checker = checker();

        assert!(checker.check("alice", "workspace.write").await.unwrap());
        assert!(!checker.check("bob", "workspace.write").await.unwrap());
        assert!(!checker.check("mallory", "workspace.read").await.unwrap());
    }

    #[tokio::test]
    async fn test_check_any() {
        let checker = checker();

        assert!(checker
            .check_any("bob", &["workspace.write", "workspace.read"])
            .await
            .unwrap());
        assert!(!checker.check_any("bob", &["sessions.revoke"]).await.unwrap());
        assert!(!checker.check_any("alice", &[]).await.unwrap());
    }

    #[tokio::test]
    async fn test_admin_holds_wildcard() {
        let checker = checker();

        assert!(checker.check("admin", "sessions.revoke").await.unwrap());
        assert!(checker.check_any("admin", &["anything"]).await.unwrap());
    }

    #[tokio::test]
    async fn test_wildcard_from_table() {
        let table = StaticCapabilities::new().grant("ops", [WILDCARD]);
        let checker = PermissionChecker::new(Arc::new(table));

        assert!(checker.check("ops", "sessions.revoke").await.unwrap());
    }

    #[tokio::test]
    async fn test_lookup_failure_propagates() {
        let checker = PermissionChecker::new(Arc::new(BrokenLookup));

        assert!(matches!(
            checker.check("alice", "workspace.read").await,
            Err(PermissionError::Lookup { .. })
        ));
    }
}
