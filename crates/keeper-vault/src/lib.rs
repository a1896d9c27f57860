// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cryptographic building blocks for the Keeper secrets vault.
//!
//! - [`crypto`]: AES-256-GCM seal/open of record payloads.
//! - [`keys`]: deterministic per-record key derivation from a master secret.
//! - [`kdf`]: Argon2id credential hashing and verification.
//! - [`prompt`]: secret acquisition from the environment or a TTY.

pub mod crypto;
pub mod kdf;
pub mod keys;
pub mod prompt;

pub use crypto::{open, seal};
pub use kdf::{CredentialHasher, KdfParams, PasswordCheck};
pub use keys::DerivedKeyKeeper;
pub use prompt::{read_secret, read_secret_with_confirm};
