// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the vault pipeline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use keeper_auth::{AuthGate, JwtAuthority, Operation, RequestCredentials, TokenIssuer};
use keeper_core::{
    AuthError, BankCard, CryptoError, KeeperError, KeyError, KeyKeeper, RecordId, RecordKey,
    RecordKind, StorageError, UserId, VaultStore, GENERIC_FAILURE,
};
use keeper_service::{KeeperService, VaultOrchestrator};
use keeper_test_utils::{
    fast_hasher, test_authority, MemoryStore, TestHarness, UnavailableKeyKeeper, UnavailableStore,
};
use keeper_vault::{CredentialHasher, DerivedKeyKeeper, KdfParams};
use secrecy::SecretString;

fn pw(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

fn visa() -> BankCard {
    BankCard {
        number: "4111111111111111".to_string(),
        holder: "ALICE LIDDELL".to_string(),
        expiry: "09/29".to_string(),
        cvc: "123".to_string(),
    }
}

async fn sqlite_service() -> (KeeperService, TestHarness) {
    let harness = TestHarness::builder().build().await.unwrap();
    let orchestrator = VaultOrchestrator::new(
        harness.store.clone(),
        harness.keys.clone(),
        harness.hasher.clone(),
        harness.authority.clone(),
    );
    let gate = AuthGate::new(harness.authority.clone());
    (KeeperService::new(orchestrator, gate), harness)
}

fn service_over(
    store: Arc<dyn VaultStore>,
    keys: Arc<dyn KeyKeeper>,
) -> (KeeperService, Arc<JwtAuthority>) {
    let authority = test_authority(3600);
    let orchestrator = VaultOrchestrator::new(store, keys, fast_hasher(), authority.clone());
    (
        KeeperService::new(orchestrator, AuthGate::new(authority.clone())),
        authority,
    )
}

fn memory_keys() -> Arc<dyn KeyKeeper> {
    Arc::new(DerivedKeyKeeper::new(&[7u8; 32]))
}

async fn register_and_login(service: &KeeperService, login: &str) -> RequestCredentials {
    let anon = RequestCredentials::anonymous();
    service.register(&anon, login, &pw("pw-of-user")).await.unwrap();
    let token = service.login(&anon, login, &pw("pw-of-user")).await.unwrap();
    RequestCredentials::bearer(token)
}

#[tokio::test]
async fn alice_stores_and_fetches_a_login_password() {
    let (service, _harness) = sqlite_service().await;
    let anon = RequestCredentials::anonymous();

    let alice = service.register(&anon, "alice", &pw("s3cret")).await.unwrap();
    assert!(alice.0 > 0);

    let token = service.login(&anon, "alice", &pw("s3cret")).await.unwrap();
    let creds = RequestCredentials::bearer(&token);

    let record = service
        .store_secret(&creds, RecordKind::LoginPassword, "github", b"hunter2")
        .await
        .unwrap();
    assert!(record.0 > 0);

    let plaintext = service
        .fetch_secret(&creds, RecordKind::LoginPassword, "github")
        .await
        .unwrap();
    assert_eq!(plaintext.as_slice(), b"hunter2");

    let err = service
        .fetch_secret(&creds, RecordKind::LoginPassword, "unknown")
        .await
        .unwrap_err();
    assert!(matches!(err, KeeperError::Storage(StorageError::NotFound)));
}

#[tokio::test]
async fn registering_the_same_login_twice_conflicts() {
    let (service, _harness) = sqlite_service().await;
    let anon = RequestCredentials::anonymous();

    service.register(&anon, "alice", &pw("one")).await.unwrap();
    let err = service.register(&anon, "alice", &pw("two")).await.unwrap_err();
    assert!(matches!(err, KeeperError::Storage(StorageError::Conflict)));
}

#[tokio::test]
async fn wrong_password_and_unknown_login_look_identical() {
    let (service, _harness) = sqlite_service().await;
    let anon = RequestCredentials::anonymous();
    service.register(&anon, "alice", &pw("right")).await.unwrap();

    let wrong_password = service.login(&anon, "alice", &pw("wrong")).await.unwrap_err();
    let unknown_login = service.login(&anon, "mallory", &pw("right")).await.unwrap_err();

    assert!(matches!(
        wrong_password,
        KeeperError::Auth(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        unknown_login,
        KeeperError::Auth(AuthError::InvalidCredentials)
    ));
    assert_eq!(wrong_password.public_message(), unknown_login.public_message());
}

#[tokio::test]
async fn another_owner_cannot_see_the_record() {
    let (service, _harness) = sqlite_service().await;
    let alice = register_and_login(&service, "alice").await;
    let bob = register_and_login(&service, "bob").await;

    service
        .store_secret(&alice, RecordKind::Text, "diary", b"dear diary")
        .await
        .unwrap();

    let err = service
        .fetch_secret(&bob, RecordKind::Text, "diary")
        .await
        .unwrap_err();
    assert!(matches!(err, KeeperError::Storage(StorageError::NotFound)));

    // Bob can use the same lookup key for his own record.
    service
        .store_secret(&bob, RecordKind::Text, "diary", b"bob's diary")
        .await
        .unwrap();
    let alices = service
        .fetch_secret(&alice, RecordKind::Text, "diary")
        .await
        .unwrap();
    assert_eq!(alices.as_slice(), b"dear diary");
}

#[tokio::test]
async fn duplicate_lookup_key_conflicts_but_other_kinds_are_independent() {
    let (service, _harness) = sqlite_service().await;
    let alice = register_and_login(&service, "alice").await;

    service
        .store_secret(&alice, RecordKind::Text, "shared", b"text")
        .await
        .unwrap();
    let err = service
        .store_secret(&alice, RecordKind::Text, "shared", b"again")
        .await
        .unwrap_err();
    assert!(matches!(err, KeeperError::Storage(StorageError::Conflict)));

    service
        .store_secret(&alice, RecordKind::LoginPassword, "shared", b"login")
        .await
        .unwrap();
    let login = service
        .fetch_secret(&alice, RecordKind::LoginPassword, "shared")
        .await
        .unwrap();
    assert_eq!(login.as_slice(), b"login");
}

#[tokio::test]
async fn empty_credentials_are_rejected_before_storage() {
    let store = Arc::new(MemoryStore::new());
    let (service, _) = service_over(store.clone(), memory_keys());
    let anon = RequestCredentials::anonymous();

    for (login, password) in [("", "pw"), ("alice", ""), ("   ", "pw")] {
        let err = service.register(&anon, login, &pw(password)).await.unwrap_err();
        assert!(matches!(err, KeeperError::Validation(_)), "register({login:?})");
        let err = service.login(&anon, login, &pw(password)).await.unwrap_err();
        assert!(matches!(err, KeeperError::Validation(_)), "login({login:?})");
    }
    assert_eq!(store.calls(), 0, "no storage call may precede validation");
}

#[tokio::test]
async fn empty_record_inputs_are_rejected_before_storage() {
    let store = Arc::new(MemoryStore::new());
    let (service, _) = service_over(store.clone(), memory_keys());
    let alice = register_and_login(&service, "alice").await;
    let baseline = store.calls();

    let err = service
        .store_secret(&alice, RecordKind::Text, "", b"content")
        .await
        .unwrap_err();
    assert!(matches!(err, KeeperError::Validation(_)));
    let err = service
        .store_secret(&alice, RecordKind::Text, "note", b"")
        .await
        .unwrap_err();
    assert!(matches!(err, KeeperError::Validation(_)));
    let err = service
        .fetch_secret(&alice, RecordKind::Text, "")
        .await
        .unwrap_err();
    assert!(matches!(err, KeeperError::Validation(_)));

    assert_eq!(store.calls(), baseline);
}

#[tokio::test]
async fn guarded_operations_without_a_valid_token_never_reach_storage() {
    let store = Arc::new(MemoryStore::new());
    let (service, _) = service_over(store.clone(), memory_keys());

    let no_token = RequestCredentials::anonymous();
    let forged = RequestCredentials::bearer("eyJhbGciOiJIUzI1NiJ9.e30.c2lnbmF0dXJl");
    for creds in [&no_token, &forged] {
        let err = service
            .store_secret(creds, RecordKind::Text, "note", b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, KeeperError::Auth(AuthError::Unauthenticated)));
        let err = service
            .fetch_secret(creds, RecordKind::Text, "note")
            .await
            .unwrap_err();
        assert!(matches!(err, KeeperError::Auth(AuthError::Unauthenticated)));
        let err = service.fetch_card(creds, "1111").await.unwrap_err();
        assert!(matches!(err, KeeperError::Auth(AuthError::Unauthenticated)));
    }
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn expired_token_is_unauthenticated() {
    let store = Arc::new(MemoryStore::new());
    let (service, authority) = service_over(store.clone(), memory_keys());
    let _ = register_and_login(&service, "alice").await;

    let stale = authority
        .issue_at(UserId(1), chrono_hours_ago(2))
        .unwrap();
    let err = service
        .fetch_secret(&RequestCredentials::bearer(stale), RecordKind::Text, "note")
        .await
        .unwrap_err();
    assert!(matches!(err, KeeperError::Auth(AuthError::Unauthenticated)));
}

fn chrono_hours_ago(hours: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now() - chrono::Duration::hours(hours)
}

#[tokio::test]
async fn stored_bytes_never_contain_the_plaintext() {
    let store = Arc::new(MemoryStore::new());
    let (service, _) = service_over(store.clone(), memory_keys());
    let alice = register_and_login(&service, "alice").await;

    service
        .store_secret(&alice, RecordKind::LoginPassword, "github", b"hunter2")
        .await
        .unwrap();
    let stored = store
        .ciphertext(UserId(1), RecordKind::LoginPassword, "github")
        .await
        .unwrap();
    assert!(!stored.windows(7).any(|w| w == b"hunter2"));
}

#[tokio::test]
async fn tampered_ciphertext_fails_as_crypto_error() {
    let store = Arc::new(MemoryStore::new());
    let (service, _) = service_over(store.clone(), memory_keys());
    let alice = register_and_login(&service, "alice").await;

    service
        .store_secret(&alice, RecordKind::Text, "note", b"integrity matters")
        .await
        .unwrap();
    assert!(store.corrupt(UserId(1), RecordKind::Text, "note").await);

    let err = service
        .fetch_secret(&alice, RecordKind::Text, "note")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        KeeperError::Crypto(CryptoError::AuthenticationFailed)
    ));
    assert_eq!(err.public_message(), GENERIC_FAILURE);
}

#[tokio::test]
async fn records_sealed_under_another_master_key_do_not_open() {
    let store = Arc::new(MemoryStore::new());
    let (writer, authority) = service_over(store.clone(), memory_keys());
    let alice = register_and_login(&writer, "alice").await;
    writer
        .store_secret(&alice, RecordKind::Text, "note", b"sealed")
        .await
        .unwrap();

    let other_keys: Arc<dyn KeyKeeper> = Arc::new(DerivedKeyKeeper::new(&[8u8; 32]));
    let reader = VaultOrchestrator::new(store.clone(), other_keys, fast_hasher(), authority.clone());
    let ctx = AuthGate::new(authority)
        .authenticate(Operation::FetchSecret, &alice)
        .unwrap();
    let err = reader
        .fetch_secret(&ctx, RecordKind::Text, "note")
        .await
        .unwrap_err();
    assert!(matches!(err, KeeperError::Crypto(_)));
}

#[tokio::test]
async fn unavailable_key_source_fails_and_persists_nothing() {
    let store = Arc::new(MemoryStore::new());
    let (service, _) = service_over(store.clone(), Arc::new(UnavailableKeyKeeper));
    let alice = register_and_login(&service, "alice").await;

    let err = service
        .store_secret(&alice, RecordKind::Text, "note", b"content")
        .await
        .unwrap_err();
    assert!(matches!(err, KeeperError::Key(KeyError::Unavailable { .. })));
    assert!(!err.is_retryable());
    assert_eq!(store.record_count(RecordKind::Text).await, 0);
}

#[tokio::test]
async fn missing_master_key_rolls_back_sqlite_insert() {
    let harness = TestHarness::builder().without_master_key().build().await.unwrap();
    let orchestrator = VaultOrchestrator::new(
        harness.store.clone(),
        harness.keys.clone(),
        harness.hasher.clone(),
        harness.authority.clone(),
    );
    let service = KeeperService::new(orchestrator, AuthGate::new(harness.authority.clone()));
    let alice = register_and_login(&service, "alice").await;

    let err = service
        .store_secret(&alice, RecordKind::LoginPassword, "github", b"hunter2")
        .await
        .unwrap_err();
    assert!(matches!(err, KeeperError::Key(_)));

    let count = keeper_storage::queries::records::count_records(
        harness.store.database(),
        RecordKind::LoginPassword,
    )
    .await
    .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn unavailable_storage_is_retryable_and_not_a_credential_failure() {
    let (service, _) = service_over(Arc::new(UnavailableStore), memory_keys());
    let anon = RequestCredentials::anonymous();

    let err = service.register(&anon, "alice", &pw("pw")).await.unwrap_err();
    assert!(err.is_retryable());

    let err = service.login(&anon, "alice", &pw("pw")).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(!matches!(err, KeeperError::Auth(_)));
    assert_eq!(err.public_message(), GENERIC_FAILURE);
}

#[tokio::test(start_paused = true)]
async fn slow_storage_times_out_as_unavailable() {
    let store = Arc::new(MemoryStore::with_delay(Duration::from_secs(60)));
    let authority = test_authority(3600);
    let orchestrator = VaultOrchestrator::new(store, memory_keys(), fast_hasher(), authority.clone())
        .with_request_timeout(Duration::from_secs(1));

    let token = authority.issue(UserId(1)).unwrap();
    let ctx = AuthGate::new(authority)
        .authenticate(Operation::FetchSecret, &RequestCredentials::bearer(token))
        .unwrap();

    let err = orchestrator
        .fetch_secret(&ctx, RecordKind::Text, "note")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        KeeperError::Storage(StorageError::Unavailable { .. })
    ));
}

/// Argon2id at the lowest cost the config accepts, still far above a
/// millisecond per verification.
fn production_cost_hasher() -> Arc<CredentialHasher> {
    Arc::new(
        CredentialHasher::new(KdfParams {
            memory_cost: 32768,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn login_verification_honours_the_request_timeout() {
    let hasher = production_cost_hasher();
    let store = Arc::new(MemoryStore::new());
    store
        .create_user("alice", &hasher.hash(&pw("s3cret")).unwrap())
        .await
        .unwrap();
    let orchestrator =
        VaultOrchestrator::new(store, memory_keys(), hasher, test_authority(3600))
            .with_request_timeout(Duration::from_millis(1));

    let err = orchestrator.login("alice", &pw("s3cret")).await.unwrap_err();
    assert!(
        matches!(err, KeeperError::Storage(StorageError::Unavailable { .. })),
        "expected a timeout, got {err:?}"
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn login_verification_leaves_the_executor_free() {
    let hasher = production_cost_hasher();
    let store = Arc::new(MemoryStore::new());
    store
        .create_user("alice", &hasher.hash(&pw("s3cret")).unwrap())
        .await
        .unwrap();
    let orchestrator =
        VaultOrchestrator::new(store, memory_keys(), hasher, test_authority(3600));

    // Single-threaded runtime: the ticker only runs while login is parked.
    let ticker = tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(2)).await;
        Instant::now()
    });
    orchestrator.login("alice", &pw("s3cret")).await.unwrap();
    let login_done = Instant::now();

    assert!(ticker.await.unwrap() < login_done);
}

/// Sleeps in every derivation, on whichever thread runs the sealer.
struct SlowKeys {
    inner: DerivedKeyKeeper,
    delay: Duration,
}

impl KeyKeeper for SlowKeys {
    fn key_for(
        &self,
        user: UserId,
        record: RecordId,
        kind: RecordKind,
    ) -> Result<RecordKey, KeeperError> {
        std::thread::sleep(self.delay);
        self.inner.key_for(user, record, kind)
    }
}

#[tokio::test]
async fn timed_out_store_rolls_back_and_retry_succeeds() {
    let harness = TestHarness::builder().build().await.unwrap();
    let keys: Arc<dyn KeyKeeper> = Arc::new(SlowKeys {
        inner: DerivedKeyKeeper::new(&[7u8; 32]),
        delay: Duration::from_millis(200),
    });
    let orchestrator = |timeout| {
        VaultOrchestrator::new(
            harness.store.clone(),
            keys.clone(),
            harness.hasher.clone(),
            harness.authority.clone(),
        )
        .with_request_timeout(timeout)
    };
    let hurried = orchestrator(Duration::from_millis(20));
    let patient = orchestrator(Duration::from_secs(30));

    let user = harness
        .store
        .create_user("alice", &harness.hasher.hash(&pw("pw")).unwrap())
        .await
        .unwrap();
    let token = harness.authority.issue(user).unwrap();
    let ctx = AuthGate::new(harness.authority.clone())
        .authenticate(Operation::StoreSecret, &RequestCredentials::bearer(token))
        .unwrap();

    let err = hurried
        .store_secret(&ctx, RecordKind::Text, "note", b"body")
        .await
        .unwrap_err();
    assert!(err.is_retryable(), "expected a timeout, got {err:?}");

    // Queued behind the abandoned insert on the storage thread.
    let count = keeper_storage::queries::records::count_records(
        harness.store.database(),
        RecordKind::Text,
    )
    .await
    .unwrap();
    assert_eq!(count, 0);

    patient
        .store_secret(&ctx, RecordKind::Text, "note", b"body")
        .await
        .unwrap();
    let fetched = patient
        .fetch_secret(&ctx, RecordKind::Text, "note")
        .await
        .unwrap();
    assert_eq!(fetched.as_slice(), b"body");
}

#[tokio::test]
async fn bank_card_roundtrip_keyed_by_last_four() {
    let (service, _harness) = sqlite_service().await;
    let alice = register_and_login(&service, "alice").await;

    service.store_card(&alice, &visa()).await.unwrap();
    let card = service.fetch_card(&alice, "1111").await.unwrap();
    assert_eq!(card, visa());

    let err = service.fetch_card(&alice, "4242").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn invalid_cards_are_rejected_before_storage() {
    let store = Arc::new(MemoryStore::new());
    let (service, _) = service_over(store.clone(), memory_keys());
    let alice = register_and_login(&service, "alice").await;
    let baseline = store.calls();

    let bad_checksum = BankCard {
        number: "4111111111111112".to_string(),
        ..visa()
    };
    let err = service.store_card(&alice, &bad_checksum).await.unwrap_err();
    assert!(matches!(err, KeeperError::Validation(_)));

    let err = service.fetch_card(&alice, "11").await.unwrap_err();
    assert!(matches!(err, KeeperError::Validation(_)));

    assert_eq!(store.calls(), baseline);
}
