// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the orchestrator and its collaborators.
//!
//! Storage is async and uses `#[async_trait]` for dynamic dispatch; key
//! derivation and credential verification are synchronous pure functions.

pub mod credential;
pub mod keys;
pub mod storage;

pub use credential::CredentialVerifier;
pub use keys::KeyKeeper;
pub use storage::{Sealer, VaultStore};
