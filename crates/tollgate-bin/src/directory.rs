// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Static user directory loaded from the configuration file.
//!
//! Serves both user login (argon2 password check) and capability lookup.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tollgate_api::password::verify_secret;
use tollgate_api::{ApiResult, CredentialVerifier};
use tollgate_core::{CapabilityLookup, CapabilitySet, PermissionError};

/// A configured user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    /// Login name.
    pub username: String,
    /// Argon2 PHC hash of the password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Session subject; defaults to the username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Granted capabilities.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl UserEntry {
    /// Returns the session subject for this user.
    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or(&self.username)
    }
}

/// In-memory user table.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    by_username: HashMap<String, UserEntry>,
    grants: HashMap<String, CapabilitySet>,
}

impl UserDirectory {
    /// Builds the directory from configured entries.
    pub fn new(users: impl IntoIterator<Item = UserEntry>) -> Self {
        let mut directory = Self::default();
        for user in users {
            directory
                .grants
                .entry(user.subject().to_string())
                .or_default()
                .extend(user.capabilities.iter().cloned());
            directory.by_username.insert(user.username.clone(), user);
        }
        directory
    }

    /// Returns the number of users.
    pub fn len(&self) -> usize {
        self.by_username.len()
    }

    /// Returns `true` if no users are configured.
    pub fn is_empty(&self) -> bool {
        self.by_username.is_empty()
    }
}

#[async_trait]
impl CredentialVerifier for UserDirectory {
    async fn verify(&self, username: &str, password: &str) -> ApiResult<Option<String>> {
        let Some(user) = self.by_username.get(username) else {
            return Ok(None);
        };

        if verify_secret(&user.password_hash, password)? {
            Ok(Some(user.subject().to_string()))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl CapabilityLookup for UserDirectory {
    async fn capabilities(&self, subject: &str) -> Result<CapabilitySet, PermissionError> {
        Ok(self.grants.get(subject).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_api::password::hash_secret;

    fn directory() -> UserDirectory {
        UserDirectory::new([
            UserEntry {
                username: "operator".to_string(),
                password_hash: hash_secret("op-password").unwrap(),
                subject: None,
                capabilities: vec!["sessions.revoke".to_string()],
            },
            UserEntry {
                username: "viewer".to_string(),
                password_hash: hash_secret("view-password").unwrap(),
                subject: Some("user-17".to_string()),
                capabilities: vec![],
            },
        ])
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let directory = directory();

        assert_eq!(
            directory.verify("operator", "op-password").await.unwrap(),
            Some("operator".to_string())
        );
        assert_eq!(
            directory.verify("viewer", "view-password").await.unwrap(),
            Some("user-17".to_string())
        );
        assert_eq!(directory.verify("operator", "wrong").await.unwrap(), None);
        assert_eq!(directory.verify("ghost", "op-password").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_capabilities_by_subject() {
        let directory = directory();

        assert!(directory
            .capabilities("operator")
            .await
            .unwrap()
            .contains("sessions.revoke"));
        assert!(directory.capabilities("user-17").await.unwrap().is_empty());
        assert!(directory.capabilities("viewer").await.unwrap().is_empty());
    }
}
