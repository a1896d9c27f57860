// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness assembling real vault components.
//!
//! `TestHarness` owns a temporary SQLite database, a derived key keeper, a
//! low-cost Argon2id hasher and a JWT authority. Callers compose them into
//! an orchestrator, swapping in doubles where a test needs a failure.

use std::sync::Arc;

use keeper_auth::JwtAuthority;
use keeper_config::model::StorageConfig;
use keeper_core::KeeperError;
use keeper_storage::SqliteStore;
use keeper_vault::{CredentialHasher, DerivedKeyKeeper, KdfParams};
use secrecy::SecretString;

/// Signing secret used by [`test_authority`].
pub const TEST_TOKEN_SECRET: &str = "keeper-test-signing-secret-0123456789abcdef";

const TEST_MASTER_KEY: [u8; 32] = [0x5a; 32];

/// Argon2id hasher with the cheapest parameters the algorithm accepts.
pub fn fast_hasher() -> Arc<CredentialHasher> {
    let params = KdfParams {
        memory_cost: 1024,
        iterations: 1,
        parallelism: 1,
    };
    match CredentialHasher::new(params) {
        Ok(hasher) => Arc::new(hasher),
        Err(e) => panic!("test hasher parameters rejected: {e}"),
    }
}

/// JWT authority over [`TEST_TOKEN_SECRET`] with the given lifetime.
pub fn test_authority(ttl_secs: u64) -> Arc<JwtAuthority> {
    match JwtAuthority::new(&SecretString::from(TEST_TOKEN_SECRET.to_string()), ttl_secs) {
        Ok(authority) => Arc::new(authority),
        Err(e) => panic!("test token secret rejected: {e}"),
    }
}

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    master_key: Option<[u8; 32]>,
    token_ttl_secs: u64,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            master_key: Some(TEST_MASTER_KEY),
            token_ttl_secs: 3 * 60 * 60,
        }
    }

    /// Use a specific master key for record key derivation.
    pub fn with_master_key(mut self, key: [u8; 32]) -> Self {
        self.master_key = Some(key);
        self
    }

    /// Build with no master key, so record operations fail as key-unavailable.
    pub fn without_master_key(mut self) -> Self {
        self.master_key = None;
        self
    }

    pub fn with_token_ttl(mut self, secs: u64) -> Self {
        self.token_ttl_secs = secs;
        self
    }

    /// Create the temp directory and open the database.
    pub async fn build(self) -> Result<TestHarness, KeeperError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| KeeperError::Internal(format!("cannot create temp dir: {e}")))?;
        let db_path = temp_dir.path().join("vault.db");
        let storage_config = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let store = Arc::new(SqliteStore::open(&storage_config).await?);

        let keys = Arc::new(match self.master_key {
            Some(key) => DerivedKeyKeeper::new(&key),
            None => DerivedKeyKeeper::unconfigured(),
        });

        Ok(TestHarness {
            store,
            keys,
            hasher: fast_hasher(),
            authority: test_authority(self.token_ttl_secs),
            storage_config,
            _temp_dir: temp_dir,
        })
    }
}

/// Real components over a throwaway database.
///
/// The database lives as long as the harness.
pub struct TestHarness {
    pub store: Arc<SqliteStore>,
    pub keys: Arc<DerivedKeyKeeper>,
    pub hasher: Arc<CredentialHasher>,
    pub authority: Arc<JwtAuthority>,
    pub storage_config: StorageConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }
}
