// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sealed record queries.
//!
//! Table names come from [`RecordKind::table`], a closed set of literals, so
//! formatting them into SQL is safe.

use keeper_core::{KeeperError, RecordId, RecordKind, Sealer, StorageError, StoredRecord, UserId};
use rusqlite::{params, OptionalExtension};

use crate::database::{constraint_kind, map_tr_err, ConstraintKind, Database};

/// Insert a record, seal it with its assigned id, and commit.
///
/// The row is inserted with an empty placeholder ciphertext, `sealer` runs
/// with the new id, and the real ciphertext replaces the placeholder. All
/// three steps share one transaction; if `sealer` fails the transaction is
/// dropped and nothing persists.
pub async fn insert_sealed(
    db: &Database,
    owner: UserId,
    kind: RecordKind,
    lookup_key: &str,
    sealer: Sealer,
) -> Result<RecordId, KeeperError> {
    let table = kind.table();
    let lookup_key = lookup_key.to_string();
    db.connection()
        .call(move |conn| -> Result<Result<RecordId, KeeperError>, rusqlite::Error> {
            let tx = conn.transaction()?;

            if let Err(e) = tx.execute(
                &format!("INSERT INTO {table} (owner_id, lookup_key, ciphertext) VALUES (?1, ?2, x'')"),
                params![owner.0, lookup_key],
            ) {
                return match constraint_kind(&e) {
                    Some(ConstraintKind::Unique) => Ok(Err(StorageError::Conflict.into())),
                    // Owner row is gone or never existed.
                    Some(ConstraintKind::ForeignKey) => Ok(Err(StorageError::NotFound.into())),
                    None => Err(e),
                };
            }
            let id = RecordId(tx.last_insert_rowid());

            let ciphertext = match sealer(id) {
                Ok(ciphertext) => ciphertext,
                Err(e) => return Ok(Err(e)),
            };

            tx.execute(
                &format!("UPDATE {table} SET ciphertext = ?1 WHERE id = ?2"),
                params![ciphertext, id.0],
            )?;
            tx.commit()?;
            Ok(Ok(id))
        })
        .await
        .map_err(map_tr_err)?
}

/// Fetch the record `(owner, kind, lookup_key)`. Rows owned by anyone else
/// are invisible.
pub async fn find_record(
    db: &Database,
    owner: UserId,
    kind: RecordKind,
    lookup_key: &str,
) -> Result<Option<StoredRecord>, KeeperError> {
    let table = kind.table();
    let lookup_key = lookup_key.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT id, ciphertext FROM {table} WHERE owner_id = ?1 AND lookup_key = ?2"),
                params![owner.0, lookup_key],
                |row| {
                    Ok(StoredRecord {
                        id: RecordId(row.get(0)?),
                        ciphertext: row.get(1)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of rows in `kind`'s table. Test and tooling helper.
pub async fn count_records(db: &Database, kind: RecordKind) -> Result<i64, KeeperError> {
    let table = kind.table();
    db.connection()
        .call(move |conn| conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0)))
        .await
        .map_err(map_tr_err)
}
