// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-record key derivation.
//!
//! `key = HMAC-SHA256(master, "keeper/record-key/v1/<kind>/<user>/<record>")`.
//! The record kind is part of the message, so records with the same id in
//! different tables never share a key. Nothing here is stored.

use keeper_core::{KeeperError, KeyError, KeyKeeper, RecordId, RecordKey, RecordKind, UserId};
use ring::hmac;

const DERIVATION_LABEL: &str = "keeper/record-key/v1";

/// Derives record keys from a process-wide master secret.
///
/// Immutable after construction; safe to share behind an `Arc`.
pub struct DerivedKeyKeeper {
    master: Option<hmac::Key>,
}

impl std::fmt::Debug for DerivedKeyKeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKeyKeeper")
            .field("master", &self.master.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl DerivedKeyKeeper {
    /// Keeper backed by a 256-bit master secret.
    pub fn new(master: &[u8; 32]) -> Self {
        Self {
            master: Some(hmac::Key::new(hmac::HMAC_SHA256, master)),
        }
    }

    /// Keeper with no derivation source. Every call fails with
    /// `KeyError::Unavailable`.
    pub fn unconfigured() -> Self {
        Self { master: None }
    }

    /// Build from `[vault]` configuration. A missing or malformed master key
    /// yields an unconfigured keeper.
    pub fn from_config(config: &keeper_config::model::VaultConfig) -> Self {
        match config.master_key_bytes() {
            Some(bytes) => Self::new(&bytes),
            None => {
                tracing::warn!("vault.master_key not configured -- record operations will fail");
                Self::unconfigured()
            }
        }
    }

    fn derivation_message(user: UserId, record: RecordId, kind: RecordKind) -> String {
        format!("{DERIVATION_LABEL}/{}/{user}/{record}", kind.key_domain())
    }
}

impl KeyKeeper for DerivedKeyKeeper {
    fn key_for(
        &self,
        user: UserId,
        record: RecordId,
        kind: RecordKind,
    ) -> Result<RecordKey, KeeperError> {
        let master = self.master.as_ref().ok_or_else(|| KeyError::Unavailable {
            detail: "master key not configured".to_string(),
        })?;

        let tag = hmac::sign(master, Self::derivation_message(user, record, kind).as_bytes());
        let bytes: [u8; 32] = tag.as_ref().try_into().map_err(|_| KeyError::Unavailable {
            detail: "unexpected HMAC output length".to_string(),
        })?;
        Ok(RecordKey::from_bytes(bytes))
    }
}
