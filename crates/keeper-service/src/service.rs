// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport-facing surface: the gate in front of the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use keeper_auth::{AuthGate, JwtAuthority, Operation, TokenSource};
use keeper_config::KeeperConfig;
use keeper_core::{BankCard, KeeperError, RecordId, RecordKind, UserId};
use keeper_storage::SqliteStore;
use keeper_vault::{CredentialHasher, DerivedKeyKeeper, KdfParams};
use secrecy::SecretString;
use tracing::info;
use zeroize::Zeroizing;

use crate::orchestrator::VaultOrchestrator;

/// Every vault operation, each behind the auth gate.
#[derive(Debug)]
pub struct KeeperService {
    orchestrator: VaultOrchestrator,
    gate: AuthGate,
}

impl KeeperService {
    pub fn new(orchestrator: VaultOrchestrator, gate: AuthGate) -> Self {
        Self { orchestrator, gate }
    }

    /// Wire the full stack from configuration.
    ///
    /// Fails if the signing secret is missing or the database cannot be
    /// opened. A missing master key is not fatal here; record operations
    /// report it as `KeyError::Unavailable`.
    pub async fn open(config: &KeeperConfig) -> Result<Self, KeeperError> {
        let authority = Arc::new(JwtAuthority::from_config(&config.auth)?);
        let store = Arc::new(SqliteStore::open(&config.storage).await?);
        let keys = Arc::new(DerivedKeyKeeper::from_config(&config.vault));
        let hasher = Arc::new(CredentialHasher::new(KdfParams::from_config(&config.vault))?);

        let orchestrator = VaultOrchestrator::new(store, keys, hasher, authority.clone())
            .with_request_timeout(Duration::from_secs(config.service.request_timeout_secs));
        info!(
            service = %config.service.name,
            database = %config.storage.database_path,
            "keeper service ready"
        );
        Ok(Self::new(orchestrator, AuthGate::new(authority)))
    }

    pub fn orchestrator(&self) -> &VaultOrchestrator {
        &self.orchestrator
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    pub async fn register(
        &self,
        credentials: &dyn TokenSource,
        login: &str,
        password: &SecretString,
    ) -> Result<UserId, KeeperError> {
        self.gate
            .guard(Operation::Register, credentials, |_| {
                self.orchestrator.register(login, password)
            })
            .await
    }

    pub async fn login(
        &self,
        credentials: &dyn TokenSource,
        login: &str,
        password: &SecretString,
    ) -> Result<String, KeeperError> {
        self.gate
            .guard(Operation::Login, credentials, |_| {
                self.orchestrator.login(login, password)
            })
            .await
    }

    pub async fn store_secret(
        &self,
        credentials: &dyn TokenSource,
        kind: RecordKind,
        lookup_key: &str,
        payload: &[u8],
    ) -> Result<RecordId, KeeperError> {
        let ctx = self.gate.authenticate(Operation::StoreSecret, credentials)?;
        self.orchestrator
            .store_secret(&ctx, kind, lookup_key, payload)
            .await
    }

    pub async fn fetch_secret(
        &self,
        credentials: &dyn TokenSource,
        kind: RecordKind,
        lookup_key: &str,
    ) -> Result<Zeroizing<Vec<u8>>, KeeperError> {
        let ctx = self.gate.authenticate(Operation::FetchSecret, credentials)?;
        self.orchestrator.fetch_secret(&ctx, kind, lookup_key).await
    }

    pub async fn store_card(
        &self,
        credentials: &dyn TokenSource,
        card: &BankCard,
    ) -> Result<RecordId, KeeperError> {
        let ctx = self.gate.authenticate(Operation::StoreCard, credentials)?;
        self.orchestrator.store_card(&ctx, card).await
    }

    pub async fn fetch_card(
        &self,
        credentials: &dyn TokenSource,
        last_four: &str,
    ) -> Result<BankCard, KeeperError> {
        let ctx = self.gate.authenticate(Operation::FetchCard, credentials)?;
        self.orchestrator.fetch_card(&ctx, last_four).await
    }

    pub async fn close(&self) -> Result<(), KeeperError> {
        self.orchestrator.close().await
    }
}
