// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for the Keeper secrets vault.
//!
//! Each component raises only its own family: storage returns [`StorageError`],
//! the encryptor returns [`CryptoError`], and so on. The orchestrator matches
//! these exhaustively and never widens one kind into another.

use thiserror::Error;

/// Message surfaced to callers for failures whose detail must stay internal.
pub const GENERIC_FAILURE: &str = "cannot complete request";

/// The primary error type returned by every Keeper operation.
#[derive(Debug, Error)]
pub enum KeeperError {
    /// Malformed or empty input, rejected before any I/O.
    #[error("validation error: {0}")]
    Validation(String),

    /// Identity could not be established or was refused.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Ciphertext did not authenticate under the derived key.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Persistence outcome other than success.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The key derivation source could not be used.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// Configuration or signing faults. Not recoverable for the process.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Authentication outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Wrong login or password. Never says which.
    #[error("invalid login or password")]
    InvalidCredentials,

    /// A guarded operation was attempted without a valid token.
    #[error("authentication required")]
    Unauthenticated,

    /// The presented token is malformed, unsigned, or expired.
    #[error("invalid or expired token")]
    InvalidToken,
}

/// Authenticated-encryption outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("ciphertext failed authentication -- wrong key or tampered data")]
    AuthenticationFailed,
}

/// Storage outcomes. Raw driver errors never cross this boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    Conflict,

    /// Connectivity or transient fault. The only retryable outcome.
    #[error("storage unavailable: {detail}")]
    Unavailable { detail: String },
}

/// Key derivation outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("record key source unavailable: {detail}")]
    Unavailable { detail: String },
}

impl KeeperError {
    /// Shorthand for a storage-unavailable error with the given detail.
    pub fn unavailable(detail: impl Into<String>) -> Self {
        KeeperError::Storage(StorageError::Unavailable {
            detail: detail.into(),
        })
    }

    /// Whether the caller may retry the request that produced this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, KeeperError::Storage(StorageError::Unavailable { .. }))
    }

    /// Whether this is a storage `NotFound` outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, KeeperError::Storage(StorageError::NotFound))
    }

    /// Caller-facing message.
    ///
    /// Validation and auth outcomes are specific; crypto, key, storage
    /// faults and internal errors collapse to [`GENERIC_FAILURE`] so the
    /// response cannot be used as a decryption or storage oracle.
    pub fn public_message(&self) -> String {
        match self {
            KeeperError::Validation(msg) => msg.clone(),
            KeeperError::Auth(e) => e.to_string(),
            KeeperError::Storage(StorageError::NotFound) => StorageError::NotFound.to_string(),
            KeeperError::Storage(StorageError::Conflict) => StorageError::Conflict.to_string(),
            KeeperError::Storage(StorageError::Unavailable { .. })
            | KeeperError::Crypto(_)
            | KeeperError::Key(_)
            | KeeperError::Internal(_) => GENERIC_FAILURE.to_string(),
        }
    }
}
