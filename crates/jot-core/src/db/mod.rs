//! SQLite database utilities for the task table.
//!
//! Runtime defaults:
//! - `journal_mode = WAL` so readers in other processes are not blocked by writes
//! - `busy_timeout = 5s` to reduce transient lock failures under contention
//! - `synchronous = NORMAL`, durable across application crashes under WAL

pub mod query;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

/// Busy timeout used for task DB connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the task database, apply runtime pragmas, and ensure the schema.
///
/// # Errors
///
/// Returns an error if opening/configuring the database fails or the file
/// carries a schema newer than this binary understands.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create task db directory {}", parent.display()))?;
    }

    let mut conn =
        Connection::open(path).with_context(|| format!("open task database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    schema::ensure_schema(&mut conn)?;

    Ok(conn)
}

/// Open a private in-memory database with the schema applied.
///
/// # Errors
///
/// Returns an error if SQLite cannot allocate the database.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory task database")?;
    schema::ensure_schema(&mut conn)?;
    Ok(conn)
}

/// `PRAGMA data_version`: changes whenever another connection commits to the
/// database file. Commits made through `conn` itself do not change it.
///
/// # Errors
///
/// Returns an error if the pragma cannot be read.
pub fn data_version(conn: &Connection) -> Result<i64> {
    conn.query_row("PRAGMA data_version", [], |row| row.get(0))
        .context("read data_version")
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}
