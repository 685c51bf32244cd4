//! The single, fixed SQLite schema for the task database.
//!
//! - `tasks` holds one row per [`TaskRecord`](crate::model::TaskRecord)
//! - `AUTOINCREMENT` keeps ids monotonic: a rowid is never handed out twice
//!
//! There is no migration path. A fresh database is created at
//! [`SCHEMA_VERSION`]; a database stamped with a newer version is refused.

use rusqlite::{Connection, types::Type};

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    is_completed INTEGER NOT NULL DEFAULT 0 CHECK (is_completed IN (0, 1))
);
";

/// The database carries a schema this binary does not understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("task database schema version {found} is newer than supported version {supported}")]
pub struct SchemaTooNew {
    pub found: u32,
    pub supported: u32,
}

/// Read `PRAGMA user_version` and convert it to a Rust `u32`.
///
/// # Errors
///
/// Returns an error if querying SQLite fails or the version value cannot be
/// represented as `u32`.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(version).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(error))
    })
}

/// Create the schema on an empty database, or verify an existing one.
///
/// Idempotent: DDL uses `IF NOT EXISTS` and the version is only stamped when
/// the database is still at version 0.
///
/// # Errors
///
/// Returns [`SchemaTooNew`] if the file was stamped by a newer binary, or the
/// underlying SQLite error if DDL fails.
pub fn ensure_schema(conn: &mut Connection) -> anyhow::Result<u32> {
    let found = current_schema_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(SchemaTooNew {
            found,
            supported: SCHEMA_VERSION,
        }
        .into());
    }

    if found < SCHEMA_VERSION {
        let tx = conn.transaction()?;
        tx.execute_batch(SCHEMA_SQL)?;
        tx.pragma_update(None, "user_version", i64::from(SCHEMA_VERSION))?;
        tx.commit()?;
        tracing::debug!(version = SCHEMA_VERSION, "created task schema");
    }

    Ok(SCHEMA_VERSION)
}
