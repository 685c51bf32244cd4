use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single to-do item as stored in the `tasks` table.
///
/// `id` is assigned by the store and never reused. `text` is fixed at
/// creation; only `is_completed` changes afterwards, and only through
/// [`TaskRecord::toggled`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub text: String,
    pub is_completed: bool,
}

impl TaskRecord {
    /// Copy of this record with `is_completed` negated and every other field unchanged.
    #[must_use]
    pub fn toggled(&self) -> Self {
        Self {
            is_completed: !self.is_completed,
            ..self.clone()
        }
    }

    /// Checkbox marker used by text renderers.
    #[must_use]
    pub const fn marker(&self) -> &'static str {
        if self.is_completed { "[x]" } else { "[ ]" }
    }
}

/// Immutable, fully materialized view of every record at one point in time.
///
/// Records are ordered by ascending `id`. `revision` counts the successful
/// writes the store had applied when the snapshot was taken (0 for a store
/// that has not been written since it was opened). Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    revision: u64,
    tasks: Arc<[TaskRecord]>,
}

impl Snapshot {
    #[must_use]
    pub fn new(revision: u64, tasks: Vec<TaskRecord>) -> Self {
        Self {
            revision,
            tasks: tasks.into(),
        }
    }

    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&TaskRecord> {
        self.tasks
            .binary_search_by_key(&id, |task| task.id)
            .ok()
            .and_then(|index| self.tasks.get(index))
    }

    /// Number of completed records.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_completed).count()
    }
}
