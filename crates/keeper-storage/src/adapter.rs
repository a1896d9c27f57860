// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`VaultStore`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use keeper_config::model::StorageConfig;
use keeper_core::{
    CredentialHash, CredentialVerifier, HealthStatus, KeeperError, RecordId, RecordKind, Sealer,
    StorageError, StoredRecord, UserId, VaultStore,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed vault store.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open the database described by `config`, running migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, KeeperError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite vault store initialized");
        Ok(Self { db })
    }

    /// Store backed by a private in-memory database.
    pub async fn in_memory() -> Result<Self, KeeperError> {
        Ok(Self {
            db: Database::open_in_memory().await?,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl VaultStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn create_user(
        &self,
        login: &str,
        credential: &CredentialHash,
    ) -> Result<UserId, KeeperError> {
        let id = queries::users::insert_user(&self.db, login, credential).await?;
        debug!(user_id = %id, "user created");
        Ok(id)
    }

    async fn authenticate_user(
        &self,
        login: &str,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Result<UserId, KeeperError> {
        let found = queries::users::find_credential(&self.db, login).await?;
        let (id, stored) = found.unzip();
        if verify_blocking(verifier, stored).await? {
            id.ok_or_else(|| StorageError::NotFound.into())
        } else {
            Err(StorageError::NotFound.into())
        }
    }

    async fn store_record(
        &self,
        owner: UserId,
        kind: RecordKind,
        lookup_key: &str,
        sealer: Sealer,
    ) -> Result<RecordId, KeeperError> {
        let id = queries::records::insert_sealed(&self.db, owner, kind, lookup_key, sealer).await?;
        debug!(user_id = %owner, %kind, record_id = %id, "record stored");
        Ok(id)
    }

    async fn fetch_record(
        &self,
        owner: UserId,
        kind: RecordKind,
        lookup_key: &str,
    ) -> Result<StoredRecord, KeeperError> {
        queries::records::find_record(&self.db, owner, kind, lookup_key)
            .await?
            .ok_or_else(|| StorageError::NotFound.into())
    }

    async fn health_check(&self) -> Result<HealthStatus, KeeperError> {
        let probe = self
            .db
            .connection()
            .call(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await;
        match probe {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn close(&self) -> Result<(), KeeperError> {
        self.db.checkpoint().await?;
        debug!("WAL checkpoint complete");
        self.db.close().await
    }
}

/// Run `verifier` on tokio's blocking pool. An absent credential still
/// exercises the verifier's decoy path and never matches.
async fn verify_blocking(
    verifier: Arc<dyn CredentialVerifier>,
    stored: Option<CredentialHash>,
) -> Result<bool, KeeperError> {
    tokio::task::spawn_blocking(move || match stored {
        Some(stored) => verifier.verify(&stored),
        None => {
            verifier.verify_absent();
            Ok(false)
        }
    })
    .await
    .map_err(|e| KeeperError::Internal(format!("credential check task failed: {e}")))?
}
