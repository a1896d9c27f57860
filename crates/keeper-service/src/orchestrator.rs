// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-operation composition of hashing, storage, key derivation and sealing.
//!
//! Every operation validates its inputs before touching storage and runs
//! under the configured request timeout. Lower-level outcomes pass through
//! with their family intact; the one translation is storage `NotFound` on
//! login, which becomes `AuthError::InvalidCredentials`.
//!
//! A timed-out write never commits behind the caller's back: record inserts
//! settle a `CommitClaim` between the sealer and the deadline, and account
//! inserts are bounded only up to the point where storage takes them over.

use std::future::Future;
use std::pin::pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use keeper_auth::{AuthContext, Operation, TokenIssuer};
use keeper_core::{
    AuthError, BankCard, CredentialVerifier, HealthStatus, KeeperError, KeyKeeper, RecordId,
    RecordKind, Sealer, StorageError, UserId, VaultStore,
};
use keeper_vault::{open, seal, CredentialHasher, PasswordCheck};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use crate::validate;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Composes the vault components for each logical operation.
pub struct VaultOrchestrator {
    store: Arc<dyn VaultStore>,
    keys: Arc<dyn KeyKeeper>,
    hasher: Arc<CredentialHasher>,
    issuer: Arc<dyn TokenIssuer>,
    request_timeout: Duration,
}

impl VaultOrchestrator {
    pub fn new(
        store: Arc<dyn VaultStore>,
        keys: Arc<dyn KeyKeeper>,
        hasher: Arc<CredentialHasher>,
        issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            store,
            keys,
            hasher,
            issuer,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Bound every operation by `timeout`. Expiry surfaces as retryable
    /// `StorageError::Unavailable`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Create an account and return its id.
    pub async fn register(
        &self,
        login: &str,
        password: &SecretString,
    ) -> Result<UserId, KeeperError> {
        validate::login(login)?;
        validate::password(password)?;

        let result = async {
            let credential = self
                .within(Operation::Register, async {
                    let hasher = Arc::clone(&self.hasher);
                    let password = owned(password);
                    tokio::task::spawn_blocking(move || hasher.hash(&password))
                        .await
                        .map_err(|e| KeeperError::Internal(format!("hashing task failed: {e}")))?
                })
                .await?;
            // Single-statement insert, bounded by the store's busy timeout.
            // Dropping it mid-flight could still commit the account.
            self.store.create_user(login, &credential).await
        }
        .await;

        if let Ok(user) = &result {
            info!(user_id = %user, "user registered");
        }
        report(Operation::Register, result)
    }

    /// Verify credentials and issue a bearer token.
    ///
    /// Wrong password and unknown login are indistinguishable.
    pub async fn login(&self, login: &str, password: &SecretString) -> Result<String, KeeperError> {
        validate::login(login)?;
        validate::password(password)?;

        let result = self
            .within(Operation::Login, async {
                let check: Arc<dyn CredentialVerifier> =
                    Arc::new(PasswordCheck::new(Arc::clone(&self.hasher), owned(password)));
                let user = self
                    .store
                    .authenticate_user(login, check)
                    .await
                    .map_err(|e| match e {
                        KeeperError::Storage(StorageError::NotFound) => {
                            KeeperError::Auth(AuthError::InvalidCredentials)
                        }
                        other => other,
                    })?;
                debug!(user_id = %user, "credentials accepted");
                self.issuer.issue(user)
            })
            .await;
        report(Operation::Login, result)
    }

    /// Seal `payload` under a key bound to the new record and persist it.
    ///
    /// On timeout the write is abandoned and rolls back, unless it already
    /// reached commit, in which case the committed outcome is returned.
    pub async fn store_secret(
        &self,
        ctx: &AuthContext,
        kind: RecordKind,
        lookup_key: &str,
        payload: &[u8],
    ) -> Result<RecordId, KeeperError> {
        validate::lookup_key(lookup_key)?;
        validate::payload(payload)?;

        let user = ctx.user();
        let keys = Arc::clone(&self.keys);
        let plaintext = Zeroizing::new(payload.to_vec());
        let claim = Arc::new(CommitClaim::default());
        let sealer_claim = Arc::clone(&claim);
        let sealer: Sealer = Box::new(move |record| {
            if sealer_claim.is_abandoned() {
                return Err(abandoned());
            }
            let key = keys.key_for(user, record, kind)?;
            let ciphertext = seal(&plaintext, &key)?;
            if sealer_claim.commit() {
                Ok(ciphertext)
            } else {
                Err(abandoned())
            }
        });

        let mut work = pin!(self.store.store_record(user, kind, lookup_key, sealer));
        let result = match tokio::time::timeout(self.request_timeout, work.as_mut()).await {
            Ok(result) => result,
            Err(_) if claim.abandon() => {
                debug!(user_id = %user, %kind, "store abandoned before commit");
                Err(self.timed_out(Operation::StoreSecret))
            }
            // Already committing; report what storage actually did.
            Err(_) => work.await,
        };
        if let Ok(record) = &result {
            debug!(user_id = %user, %kind, record_id = %record, "secret stored");
        }
        report(Operation::StoreSecret, result)
    }

    /// Look up, re-derive the key, and open a record owned by `ctx`'s user.
    pub async fn fetch_secret(
        &self,
        ctx: &AuthContext,
        kind: RecordKind,
        lookup_key: &str,
    ) -> Result<Zeroizing<Vec<u8>>, KeeperError> {
        validate::lookup_key(lookup_key)?;

        let user = ctx.user();
        let result = self
            .within(Operation::FetchSecret, async {
                let record = self.store.fetch_record(user, kind, lookup_key).await?;
                let key = self.keys.key_for(user, record.id, kind)?;
                let plaintext = open(&record.ciphertext, &key)?;
                debug!(user_id = %user, %kind, record_id = %record.id, "secret opened");
                Ok(plaintext)
            })
            .await;
        report(Operation::FetchSecret, result)
    }

    /// Validate and store a bank card, keyed by its last four digits.
    pub async fn store_card(
        &self,
        ctx: &AuthContext,
        card: &BankCard,
    ) -> Result<RecordId, KeeperError> {
        card.validate()?;
        let encoded = Zeroizing::new(
            serde_json::to_vec(card)
                .map_err(|e| KeeperError::Internal(format!("failed to encode card: {e}")))?,
        );
        self.store_secret(ctx, RecordKind::BankCard, card.last_four(), &encoded)
            .await
    }

    /// Fetch the card whose number ends in `last_four`.
    pub async fn fetch_card(
        &self,
        ctx: &AuthContext,
        last_four: &str,
    ) -> Result<BankCard, KeeperError> {
        validate::last_four(last_four)?;
        let plaintext = self
            .fetch_secret(ctx, RecordKind::BankCard, last_four)
            .await?;
        serde_json::from_slice(&plaintext).map_err(|e| {
            error!(error = %e, "stored card payload does not decode");
            KeeperError::Internal(format!("stored card is unreadable: {e}"))
        })
    }

    pub async fn health_check(&self) -> Result<HealthStatus, KeeperError> {
        self.store.health_check().await
    }

    /// Flush and release storage.
    pub async fn close(&self) -> Result<(), KeeperError> {
        info!(store = self.store.name(), "closing vault store");
        self.store.close().await
    }

    async fn within<T>(
        &self,
        operation: Operation,
        work: impl Future<Output = Result<T, KeeperError>>,
    ) -> Result<T, KeeperError> {
        match tokio::time::timeout(self.request_timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(self.timed_out(operation)),
        }
    }

    fn timed_out(&self, operation: Operation) -> KeeperError {
        KeeperError::unavailable(format!(
            "{operation} timed out after {:?}",
            self.request_timeout
        ))
    }
}

/// Settles, exactly once, whether a record insert commits or is abandoned.
#[derive(Debug, Default)]
struct CommitClaim(AtomicU8);

impl CommitClaim {
    const OPEN: u8 = 0;
    const COMMITTING: u8 = 1;
    const ABANDONED: u8 = 2;

    /// Claimed by the sealer as its last step. False once abandoned.
    fn commit(&self) -> bool {
        self.settle(Self::COMMITTING)
    }

    /// Claimed when the deadline passes. False if the sealer got there first.
    fn abandon(&self) -> bool {
        self.settle(Self::ABANDONED)
    }

    fn is_abandoned(&self) -> bool {
        self.0.load(Ordering::Acquire) == Self::ABANDONED
    }

    fn settle(&self, to: u8) -> bool {
        self.0
            .compare_exchange(Self::OPEN, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

fn abandoned() -> KeeperError {
    KeeperError::unavailable("store-secret abandoned after its deadline")
}

fn owned(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_owned())
}

/// Log a failed outcome at the level its family calls for, then pass it on.
fn report<T>(operation: Operation, result: Result<T, KeeperError>) -> Result<T, KeeperError> {
    if let Err(err) = &result {
        match err {
            KeeperError::Crypto(_)
            | KeeperError::Key(_)
            | KeeperError::Internal(_)
            | KeeperError::Storage(StorageError::Unavailable { .. }) => {
                error!(%operation, error = %err, "operation failed");
            }
            KeeperError::Auth(_) => warn!(%operation, error = %err, "operation refused"),
            KeeperError::Validation(_)
            | KeeperError::Storage(StorageError::NotFound | StorageError::Conflict) => {
                debug!(%operation, error = %err, "operation rejected");
            }
        }
    }
    result
}

impl std::fmt::Debug for VaultOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultOrchestrator")
            .field("store", &self.store.name())
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}
