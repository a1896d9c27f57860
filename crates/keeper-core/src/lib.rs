// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keeper secrets vault.
//!
//! This crate provides the error taxonomy, identifier and record types, and the
//! trait seams (storage, key derivation, credential verification) that the
//! rest of the workspace composes into the authenticate-then-encrypt pipeline.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{AuthError, CryptoError, KeeperError, KeyError, StorageError, GENERIC_FAILURE};
pub use types::{
    BankCard, CredentialHash, HealthStatus, RecordId, RecordKey, RecordKind, StoredRecord, UserId,
};

pub use traits::{CredentialVerifier, KeyKeeper, Sealer, VaultStore};
