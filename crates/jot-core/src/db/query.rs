//! `SQLite` statements for the `tasks` table.
//!
//! All functions take a shared `&Connection` and return typed
//! [`TaskRecord`]s (never raw rows). They are synchronous; the async
//! [`TaskStore`](crate::store::TaskStore) runs them on the blocking pool.

use crate::model::TaskRecord;
use anyhow::{Context, Result};
use rusqlite::{Connection, params};

const SELECT_COLUMNS: &str = "SELECT id, text, is_completed FROM tasks";

/// Insert a new task and return it with its assigned id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_task(conn: &Connection, text: &str) -> Result<TaskRecord> {
    conn.execute(
        "INSERT INTO tasks (text, is_completed) VALUES (?1, 0)",
        params![text],
    )
    .context("insert task")?;

    Ok(TaskRecord {
        id: conn.last_insert_rowid(),
        text: text.to_string(),
        is_completed: false,
    })
}

/// Replace the row matching `record.id` with `record` wholesale.
///
/// Returns `false` (and changes nothing) when no row has that id.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_task(conn: &Connection, record: &TaskRecord) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE tasks SET text = ?2, is_completed = ?3 WHERE id = ?1",
            params![record.id, record.text, record.is_completed],
        )
        .with_context(|| format!("update task {}", record.id))?;
    Ok(changed > 0)
}

/// Fetch a single task by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_task(conn: &Connection, id: i64) -> Result<Option<TaskRecord>> {
    let mut stmt = conn
        .prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
        .context("prepare get_task query")?;

    match stmt.query_row(params![id], row_to_task) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context(format!("get_task for {id}")),
    }
}

/// Every task in ascending id order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_tasks(conn: &Connection) -> Result<Vec<TaskRecord>> {
    let mut stmt = conn
        .prepare(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))
        .context("prepare list_tasks query")?;

    let rows = stmt
        .query_map([], row_to_task)
        .context("execute list_tasks query")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read list_tasks rows")
}

/// Number of stored tasks.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_tasks(conn: &Connection) -> Result<u64> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
        .context("count tasks")?;
    Ok(u64::try_from(count).unwrap_or(0))
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRecord> {
    Ok(TaskRecord {
        id: row.get(0)?,
        text: row.get(1)?,
        is_completed: row.get::<_, i64>(2)? != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn test_db() -> Connection {
        open_in_memory().expect("open in-memory db")
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let conn = test_db();
        let a = insert_task(&conn, "first").expect("insert");
        let b = insert_task(&conn, "second").expect("insert");
        assert!(b.id > a.id);
        assert!(!a.is_completed);
    }

    #[test]
    fn insert_accepts_empty_text() {
        let conn = test_db();
        let task = insert_task(&conn, "").expect("insert");
        assert_eq!(get_task(&conn, task.id).expect("get"), Some(task));
    }

    #[test]
    fn update_replaces_row_wholesale() {
        let conn = test_db();
        let task = insert_task(&conn, "draft").expect("insert");
        let replacement = TaskRecord {
            id: task.id,
            text: "final".to_string(),
            is_completed: true,
        };
        assert!(update_task(&conn, &replacement).expect("update"));
        assert_eq!(get_task(&conn, task.id).expect("get"), Some(replacement));
    }

    #[test]
    fn update_missing_id_is_noop() {
        let conn = test_db();
        let task = insert_task(&conn, "only").expect("insert");
        let ghost = TaskRecord {
            id: task.id + 100,
            text: "ghost".to_string(),
            is_completed: true,
        };
        assert!(!update_task(&conn, &ghost).expect("update"));
        assert_eq!(list_tasks(&conn).expect("list"), vec![task]);
    }

    #[test]
    fn get_task_not_found() {
        let conn = test_db();
        assert!(get_task(&conn, 42).expect("get").is_none());
    }

    #[test]
    fn list_tasks_orders_by_id() {
        let conn = test_db();
        for text in ["c", "a", "b"] {
            insert_task(&conn, text).expect("insert");
        }
        let ids: Vec<i64> = list_tasks(&conn)
            .expect("list")
            .into_iter()
            .map(|t| t.id)
            .collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert_eq!(count_tasks(&conn).expect("count"), 3);
    }

    #[test]
    fn ids_are_not_reused_after_row_removal() {
        let conn = test_db();
        let first = insert_task(&conn, "one").expect("insert");
        conn.execute("DELETE FROM tasks WHERE id = ?1", [first.id])
            .expect("manual delete");
        let second = insert_task(&conn, "two").expect("insert");
        assert!(second.id > first.id);
    }
}
