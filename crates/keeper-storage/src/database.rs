// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and migrations.
//!
//! All access is serialized through tokio-rusqlite's single background
//! thread. Do not open a second connection to the same file for writes.

use std::path::Path;

use keeper_core::{KeeperError, StorageError};
use tokio_rusqlite::Connection;
use tracing::debug;

/// Handle to the vault database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and migrate it.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, KeeperError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                KeeperError::unavailable(format!(
                    "cannot create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| KeeperError::unavailable(format!("cannot open database: {e}")))?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database. Used by tests and tooling.
    pub async fn open_in_memory() -> Result<Self, KeeperError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| KeeperError::unavailable(format!("cannot open database: {e}")))?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), KeeperError> {
        self.conn
            .call(move |conn| -> Result<Result<(), KeeperError>, rusqlite::Error> {
                if wal_mode {
                    let _mode: String = conn.pragma_update_and_check(
                        None,
                        "journal_mode",
                        "WAL",
                        |row| row.get(0),
                    )?;
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                }
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.busy_timeout(std::time::Duration::from_secs(5))?;
                Ok(crate::migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// The single shared connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL into the main file.
    pub async fn checkpoint(&self) -> Result<(), KeeperError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)
    }

    /// Stop the background thread. Later calls on any clone of the
    /// connection fail as unavailable.
    pub async fn close(&self) -> Result<(), KeeperError> {
        self.conn
            .clone()
            .close()
            .await
            .map_err(|e| KeeperError::unavailable(format!("failed to close database: {e}")))
    }
}

/// Collapse a tokio-rusqlite failure into `StorageError::Unavailable`.
///
/// Domain outcomes (conflict, not found) are decided inside the closures;
/// anything that reaches here is a driver or connectivity fault.
pub(crate) fn map_tr_err(err: tokio_rusqlite::Error<rusqlite::Error>) -> KeeperError {
    tracing::error!(error = %err, "sqlite call failed");
    KeeperError::Storage(StorageError::Unavailable {
        detail: err.to_string(),
    })
}

/// How a failed INSERT should surface.
pub(crate) enum ConstraintKind {
    Unique,
    ForeignKey,
}

/// Classify a constraint violation, if `err` is one we translate.
pub(crate) fn constraint_kind(err: &rusqlite::Error) -> Option<ConstraintKind> {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Some(ConstraintKind::Unique)
        }
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            Some(ConstraintKind::ForeignKey)
        }
        _ => None,
    }
}
