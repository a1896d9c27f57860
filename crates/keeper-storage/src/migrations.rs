// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied on
//! every database open.

use keeper_core::KeeperError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply all pending migrations to `conn`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), KeeperError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| KeeperError::unavailable(format!("schema migration failed: {e}")))?;
    Ok(())
}
