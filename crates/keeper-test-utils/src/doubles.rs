// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store and key-keeper doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keeper_core::{
    CredentialHash, CredentialVerifier, HealthStatus, KeeperError, KeyError, KeyKeeper, RecordId,
    RecordKey, RecordKind, Sealer, StorageError, StoredRecord, UserId, VaultStore,
};
use tokio::sync::Mutex;

#[derive(Default)]
struct State {
    users: Vec<(String, CredentialHash)>,
    records: HashMap<(UserId, RecordKind, String), StoredRecord>,
    next_record_id: i64,
}

/// In-memory store with the same outcome contract as the SQLite store.
///
/// Every trait call bumps a counter, so tests can assert that a rejected
/// request never reached storage.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call. Used to exercise request timeouts.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Number of trait calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of persisted records of `kind`.
    pub async fn record_count(&self, kind: RecordKind) -> usize {
        self.state
            .lock()
            .await
            .records
            .keys()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    /// Raw ciphertext of a record, for asserting that no plaintext is stored.
    pub async fn ciphertext(
        &self,
        owner: UserId,
        kind: RecordKind,
        lookup_key: &str,
    ) -> Option<Vec<u8>> {
        self.state
            .lock()
            .await
            .records
            .get(&(owner, kind, lookup_key.to_string()))
            .map(|r| r.ciphertext.clone())
    }

    /// Flip one bit of a stored ciphertext. Returns false if absent.
    pub async fn corrupt(&self, owner: UserId, kind: RecordKind, lookup_key: &str) -> bool {
        let mut state = self.state.lock().await;
        match state
            .records
            .get_mut(&(owner, kind, lookup_key.to_string()))
            .and_then(|r| r.ciphertext.last_mut())
        {
            Some(byte) => {
                *byte ^= 0x01;
                true
            }
            None => false,
        }
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl VaultStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_user(
        &self,
        login: &str,
        credential: &CredentialHash,
    ) -> Result<UserId, KeeperError> {
        self.enter().await;
        let mut state = self.state.lock().await;
        if state.users.iter().any(|(l, _)| l == login) {
            return Err(StorageError::Conflict.into());
        }
        state.users.push((login.to_string(), credential.clone()));
        Ok(UserId(state.users.len() as i64))
    }

    async fn authenticate_user(
        &self,
        login: &str,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Result<UserId, KeeperError> {
        self.enter().await;
        let found = self
            .state
            .lock()
            .await
            .users
            .iter()
            .enumerate()
            .find(|(_, (l, _))| l == login)
            .map(|(index, (_, stored))| (UserId(index as i64 + 1), stored.clone()));

        let accepted = tokio::task::spawn_blocking(
            move || -> Result<Option<UserId>, KeeperError> {
                match &found {
                    Some((id, stored)) => Ok(verifier.verify(stored)?.then_some(*id)),
                    None => {
                        verifier.verify_absent();
                        Ok(None)
                    }
                }
            },
        )
        .await
        .map_err(|e| KeeperError::Internal(format!("credential check task failed: {e}")))??;
        accepted.ok_or_else(|| StorageError::NotFound.into())
    }

    async fn store_record(
        &self,
        owner: UserId,
        kind: RecordKind,
        lookup_key: &str,
        sealer: Sealer,
    ) -> Result<RecordId, KeeperError> {
        self.enter().await;
        let mut state = self.state.lock().await;
        if owner.0 < 1 || owner.0 > state.users.len() as i64 {
            return Err(StorageError::NotFound.into());
        }
        let slot = (owner, kind, lookup_key.to_string());
        if state.records.contains_key(&slot) {
            return Err(StorageError::Conflict.into());
        }

        let id = RecordId(state.next_record_id + 1);
        let ciphertext = sealer(id)?;
        state.next_record_id = id.0;
        state.records.insert(slot, StoredRecord { id, ciphertext });
        Ok(id)
    }

    async fn fetch_record(
        &self,
        owner: UserId,
        kind: RecordKind,
        lookup_key: &str,
    ) -> Result<StoredRecord, KeeperError> {
        self.enter().await;
        self.state
            .lock()
            .await
            .records
            .get(&(owner, kind, lookup_key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound.into())
    }

    async fn health_check(&self) -> Result<HealthStatus, KeeperError> {
        Ok(HealthStatus::Healthy)
    }

    async fn close(&self) -> Result<(), KeeperError> {
        Ok(())
    }
}

/// Store whose every call fails as transiently unavailable.
#[derive(Debug, Default)]
pub struct UnavailableStore;

impl UnavailableStore {
    fn fail<T>() -> Result<T, KeeperError> {
        Err(KeeperError::unavailable("connection refused"))
    }
}

#[async_trait]
impl VaultStore for UnavailableStore {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn create_user(&self, _: &str, _: &CredentialHash) -> Result<UserId, KeeperError> {
        Self::fail()
    }

    async fn authenticate_user(
        &self,
        _: &str,
        _: Arc<dyn CredentialVerifier>,
    ) -> Result<UserId, KeeperError> {
        Self::fail()
    }

    async fn store_record(
        &self,
        _: UserId,
        _: RecordKind,
        _: &str,
        _: Sealer,
    ) -> Result<RecordId, KeeperError> {
        Self::fail()
    }

    async fn fetch_record(
        &self,
        _: UserId,
        _: RecordKind,
        _: &str,
    ) -> Result<StoredRecord, KeeperError> {
        Self::fail()
    }

    async fn health_check(&self) -> Result<HealthStatus, KeeperError> {
        Ok(HealthStatus::Unhealthy("connection refused".to_string()))
    }

    async fn close(&self) -> Result<(), KeeperError> {
        Ok(())
    }
}

/// Key keeper with no usable derivation source.
#[derive(Debug, Default)]
pub struct UnavailableKeyKeeper;

impl KeyKeeper for UnavailableKeyKeeper {
    fn key_for(&self, _: UserId, _: RecordId, _: RecordKind) -> Result<RecordKey, KeeperError> {
        Err(KeyError::Unavailable {
            detail: "key service unreachable".to_string(),
        }
        .into())
    }
}
