// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Argon2 secret hashing.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$...`), which carry
//! their own salt and parameters.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::error::{ApiError, ApiResult};

/// Hashes a secret into a PHC string with a random salt.
pub fn hash_secret(secret: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash secret: {}", e)))
}

/// Checks a secret against a PHC string.
///
/// A malformed hash is a configuration fault, not a wrong secret.
pub fn verify_secret(phc: &str, secret: &str) -> ApiResult<bool> {
    let parsed = PasswordHash::new(phc)
        .map_err(|e| ApiError::internal(format!("Malformed secret hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let phc = hash_secret("open sesame").unwrap();

        assert!(phc.starts_with("$argon2"));
        assert!(verify_secret(&phc, "open sesame").unwrap());
        assert!(!verify_secret(&phc, "open sesame!").unwrap());
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_secret("x").unwrap(), hash_secret("x").unwrap());
    }

    #[test]
    fn test_malformed_hash() {
        assert!(verify_secret("not-a-hash", "x").is_err());
    }
}
