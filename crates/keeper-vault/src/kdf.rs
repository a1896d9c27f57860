// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id credential hashing and verification.
//!
//! Passwords are hashed with Argon2id (Version::V0x13) under a fresh random
//! salt and persisted as a PHC string. Verification parses the stored PHC
//! string, so records hashed under older parameters still verify after the
//! configured cost changes.

use std::sync::Arc;

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use keeper_core::{CredentialHash, CredentialVerifier, KeeperError};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};

const SALT_LEN: usize = 16;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl KdfParams {
    pub fn from_config(config: &keeper_config::model::VaultConfig) -> Self {
        Self {
            memory_cost: config.kdf_memory_cost,
            iterations: config.kdf_iterations,
            parallelism: config.kdf_parallelism,
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::from_config(&keeper_config::model::VaultConfig::default())
    }
}

/// Hashes new credentials and verifies presented ones.
pub struct CredentialHasher {
    params: KdfParams,
    /// Hash of a random throwaway password, verified against when a login
    /// does not exist.
    decoy: String,
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl CredentialHasher {
    /// Create a hasher. Computes one decoy hash up front.
    pub fn new(params: KdfParams) -> Result<Self, KeeperError> {
        let mut throwaway = [0u8; 32];
        SystemRandom::new()
            .fill(&mut throwaway)
            .map_err(|_| KeeperError::Internal("failed to generate decoy password".to_string()))?;

        let mut hasher = Self {
            params,
            decoy: String::new(),
        };
        hasher.decoy = hasher.hash_bytes(&throwaway)?.hash;
        Ok(hasher)
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    fn argon2(&self) -> Result<Argon2<'static>, KeeperError> {
        let params = Params::new(
            self.params.memory_cost,
            self.params.iterations,
            self.params.parallelism,
            Some(32),
        )
        .map_err(|e| KeeperError::Internal(format!("invalid Argon2id parameters: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash `password` under a fresh random salt.
    pub fn hash(&self, password: &SecretString) -> Result<CredentialHash, KeeperError> {
        self.hash_bytes(password.expose_secret().as_bytes())
    }

    fn hash_bytes(&self, password: &[u8]) -> Result<CredentialHash, KeeperError> {
        let salt = generate_salt()?;
        let phc = self
            .argon2()?
            .hash_password(password, &salt)
            .map_err(|e| KeeperError::Internal(format!("Argon2id hashing failed: {e}")))?;
        Ok(CredentialHash {
            hash: phc.to_string(),
            salt: salt.as_str().to_string(),
        })
    }

    /// Check `password` against a stored PHC string.
    fn verify_phc(&self, password: &[u8], phc: &str) -> Result<bool, KeeperError> {
        let parsed = PasswordHash::new(phc)
            .map_err(|e| KeeperError::Internal(format!("stored credential is malformed: {e}")))?;
        match self.argon2()?.verify_password(password, &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(KeeperError::Internal(format!(
                "Argon2id verification failed: {e}"
            ))),
        }
    }
}

fn generate_salt() -> Result<SaltString, KeeperError> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| KeeperError::Internal("failed to generate random salt".to_string()))?;
    SaltString::encode_b64(&salt)
        .map_err(|e| KeeperError::Internal(format!("failed to encode salt: {e}")))
}

/// A presented password, ready to be checked by storage-side login.
///
/// Owns its inputs so storage can move it onto a blocking thread.
pub struct PasswordCheck {
    hasher: Arc<CredentialHasher>,
    password: SecretString,
}

impl PasswordCheck {
    pub fn new(hasher: Arc<CredentialHasher>, password: SecretString) -> Self {
        Self { hasher, password }
    }
}

impl CredentialVerifier for PasswordCheck {
    fn verify(&self, stored: &CredentialHash) -> Result<bool, KeeperError> {
        self.hasher
            .verify_phc(self.password.expose_secret().as_bytes(), &stored.hash)
    }

    fn verify_absent(&self) {
        let _ = self
            .hasher
            .verify_phc(self.password.expose_secret().as_bytes(), &self.hasher.decoy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> CredentialHasher {
        CredentialHasher::new(KdfParams {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    fn check(hasher: &Arc<CredentialHasher>, password: &str) -> PasswordCheck {
        PasswordCheck::new(Arc::clone(hasher), secret(password))
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn hash_then_verify_accepts_same_password() {
        let hasher = Arc::new(fast_hasher());
        let stored = hasher.hash(&secret("correct horse battery staple")).unwrap();

        assert!(check(&hasher, "correct horse battery staple").verify(&stored).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hasher = Arc::new(fast_hasher());
        let stored = hasher.hash(&secret("right")).unwrap();

        assert!(!check(&hasher, "wrong").verify(&stored).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let hasher = fast_hasher();
        let a = hasher.hash(&secret("pw")).unwrap();
        let b = hasher.hash(&secret("pw")).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn stored_hash_is_argon2id_phc_embedding_the_salt() {
        let hasher = fast_hasher();
        let stored = hasher.hash(&secret("pw")).unwrap();
        assert!(stored.hash.starts_with("$argon2id$v=19$"));
        assert!(stored.hash.contains(&stored.salt));
    }

    #[test]
    fn verification_uses_parameters_from_the_stored_hash() {
        let old = fast_hasher();
        let stored = old.hash(&secret("pw")).unwrap();

        let newer = Arc::new(
            CredentialHasher::new(KdfParams {
                memory_cost: 2048,
                iterations: 2,
                parallelism: 1,
            })
            .unwrap(),
        );
        assert!(check(&newer, "pw").verify(&stored).unwrap());
    }

    #[test]
    fn malformed_stored_hash_is_internal_error() {
        let hasher = Arc::new(fast_hasher());
        let stored = CredentialHash {
            hash: "not-a-phc-string".to_string(),
            salt: String::new(),
        };
        assert!(matches!(
            check(&hasher, "pw").verify(&stored),
            Err(KeeperError::Internal(_))
        ));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let result = CredentialHasher::new(KdfParams {
            memory_cost: 1,
            iterations: 0,
            parallelism: 0,
        });
        assert!(matches!(result, Err(KeeperError::Internal(_))));
    }

    #[test]
    fn default_params_follow_config_defaults() {
        let params = KdfParams::default();
        assert_eq!(params.memory_cost, 65536);
        assert_eq!(params.iterations, 3);
        assert_eq!(params.parallelism, 4);
    }
}
