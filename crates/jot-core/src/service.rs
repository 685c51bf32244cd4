//! Task intents: add and toggle.
//!
//! The service holds no state of its own. `toggle_task` reads the caller's
//! copy of a record and writes back the negation, so two concurrent toggles
//! of the same record can collapse into one (lost update). The store's
//! `update` replaces rows wholesale and does not compare-and-swap.

use crate::model::TaskRecord;
use crate::store::TaskStore;
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct TaskService {
    store: TaskStore,
}

impl TaskService {
    #[must_use]
    pub const fn new(store: TaskStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Create a task from raw user text. No trimming or validation.
    ///
    /// # Errors
    ///
    /// Propagates storage faults.
    pub async fn add_task(&self, text: impl Into<String>) -> Result<TaskRecord> {
        self.store.create(text).await
    }

    /// Write back `record` with its completion flag negated.
    ///
    /// Returns the record that was written, or `None` if the id no longer
    /// exists.
    ///
    /// # Errors
    ///
    /// Propagates storage faults.
    pub async fn toggle_task(&self, record: &TaskRecord) -> Result<Option<TaskRecord>> {
        let next = record.toggled();
        let written = self.store.update(next.clone()).await?;
        Ok(written.then_some(next))
    }
}
