// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault orchestration for Keeper.
//!
//! [`VaultOrchestrator`] composes credential hashing, storage, key
//! derivation and sealing per operation. [`KeeperService`] puts the
//! [`AuthGate`](keeper_auth::AuthGate) in front of it and is what a
//! transport or the CLI talks to.

pub mod orchestrator;
pub mod service;
mod validate;

pub use orchestrator::VaultOrchestrator;
pub use service::KeeperService;
