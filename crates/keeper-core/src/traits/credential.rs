// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential verification trait used by storage-side login.

use crate::error::KeeperError;
use crate::types::CredentialHash;

/// Checks a presented credential against stored hash material.
///
/// Storage owns the lookup; the verifier owns the hashing scheme. This keeps
/// password hashing out of the storage crate.
pub trait CredentialVerifier: Send + Sync {
    /// Returns `Ok(true)` if the presented credential matches `stored`.
    fn verify(&self, stored: &CredentialHash) -> Result<bool, KeeperError>;

    /// Called when no user matches the login, so that both outcomes spend
    /// comparable time. Defaults to a no-op.
    fn verify_absent(&self) {}
}
