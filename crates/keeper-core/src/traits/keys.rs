// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-record key derivation trait.

use crate::error::KeeperError;
use crate::types::{RecordId, RecordKey, RecordKind, UserId};

/// Produces the symmetric key bound to one record.
///
/// Implementations must be deterministic: no key is stored, so the read path
/// recomputes it from the identifiers returned by the storage lookup.
pub trait KeyKeeper: Send + Sync + 'static {
    /// Returns the key for `(user, record, kind)`.
    ///
    /// Fails with `KeyError::Unavailable` when the derivation source cannot
    /// be used.
    fn key_for(
        &self,
        user: UserId,
        record: RecordId,
        kind: RecordKind,
    ) -> Result<RecordKey, KeeperError>;
}
