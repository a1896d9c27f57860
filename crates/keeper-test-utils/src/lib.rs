// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Keeper.
//!
//! - [`MemoryStore`]: in-memory [`VaultStore`](keeper_core::VaultStore) that
//!   counts calls and can corrupt stored ciphertext.
//! - [`UnavailableStore`] and [`UnavailableKeyKeeper`]: doubles that fail
//!   every call with the retryable or key-unavailable outcome.
//! - [`TestHarness`]: real components over a temporary SQLite database with
//!   test-speed Argon2 parameters.

pub mod doubles;
pub mod harness;

pub use doubles::{MemoryStore, UnavailableKeyKeeper, UnavailableStore};
pub use harness::{fast_hasher, test_authority, TestHarness, TestHarnessBuilder, TEST_TOKEN_SECRET};
