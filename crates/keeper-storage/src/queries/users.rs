// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User account queries.

use keeper_core::{CredentialHash, KeeperError, StorageError, UserId};
use rusqlite::{params, OptionalExtension};

use crate::database::{constraint_kind, map_tr_err, ConstraintKind, Database};

/// Insert a user. A taken login yields `StorageError::Conflict`.
pub async fn insert_user(
    db: &Database,
    login: &str,
    credential: &CredentialHash,
) -> Result<UserId, KeeperError> {
    let login = login.to_string();
    let credential = credential.clone();
    db.connection()
        .call(move |conn| -> Result<Result<UserId, KeeperError>, rusqlite::Error> {
            let inserted = conn.execute(
                "INSERT INTO users (login, password_hash, password_salt) VALUES (?1, ?2, ?3)",
                params![login, credential.hash, credential.salt],
            );
            match inserted {
                Ok(_) => Ok(Ok(UserId(conn.last_insert_rowid()))),
                Err(e) if matches!(constraint_kind(&e), Some(ConstraintKind::Unique)) => {
                    Ok(Err(StorageError::Conflict.into()))
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?
}

/// Load the stored credential for `login`, if the user exists.
pub async fn find_credential(
    db: &Database,
    login: &str,
) -> Result<Option<(UserId, CredentialHash)>, KeeperError> {
    let login = login.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, password_hash, password_salt FROM users WHERE login = ?1",
                params![login],
                |row| {
                    Ok((
                        UserId(row.get(0)?),
                        CredentialHash {
                            hash: row.get(1)?,
                            salt: row.get(2)?,
                        },
                    ))
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
