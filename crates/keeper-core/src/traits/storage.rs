// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage trait for users and ciphertext-bearing records.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::KeeperError;
use crate::traits::credential::CredentialVerifier;
use crate::types::{CredentialHash, HealthStatus, RecordId, RecordKind, StoredRecord, UserId};

/// Produces the ciphertext for a freshly inserted record.
///
/// Receives the storage-assigned id so the record key can be derived from it.
/// Runs inside the insert transaction; an `Err` rolls the insert back.
pub type Sealer = Box<dyn FnOnce(RecordId) -> Result<Vec<u8>, KeeperError> + Send + 'static>;

/// Persistence of user accounts and sealed records.
///
/// Implementations return only typed outcomes: `StorageError::NotFound`,
/// `StorageError::Conflict`, or `StorageError::Unavailable` for transient
/// faults. Plaintext never crosses this boundary.
#[async_trait]
pub trait VaultStore: Send + Sync + 'static {
    /// Returns the human-readable name of this backend.
    fn name(&self) -> &str;

    /// Creates a user. Fails with `Conflict` if the login is taken.
    async fn create_user(
        &self,
        login: &str,
        credential: &CredentialHash,
    ) -> Result<UserId, KeeperError>;

    /// Resolves a login to its user id if `verifier` accepts the stored
    /// credential. Unknown login and rejected credential both fail with
    /// `NotFound`.
    ///
    /// Verification is CPU-bound; implementations run it on a blocking
    /// thread, never on the async executor.
    async fn authenticate_user(
        &self,
        login: &str,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Result<UserId, KeeperError>;

    /// Inserts a record, seals it with its assigned id, and commits.
    ///
    /// Fails with `Conflict` if `(owner, kind, lookup_key)` already exists.
    /// If `sealer` fails nothing is committed. The sealer is the last step
    /// before commit, so a caller that abandons the write can refuse there.
    async fn store_record(
        &self,
        owner: UserId,
        kind: RecordKind,
        lookup_key: &str,
        sealer: Sealer,
    ) -> Result<RecordId, KeeperError>;

    /// Fetches the sealed record owned by `owner`. Fails with `NotFound` if
    /// absent or owned by someone else.
    async fn fetch_record(
        &self,
        owner: UserId,
        kind: RecordKind,
        lookup_key: &str,
    ) -> Result<StoredRecord, KeeperError>;

    /// Performs a health check and returns the backend's current status.
    async fn health_check(&self) -> Result<HealthStatus, KeeperError>;

    /// Flushes pending writes and releases the backend.
    async fn close(&self) -> Result<(), KeeperError>;
}
