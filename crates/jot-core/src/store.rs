//! The record store: durable task rows plus live snapshot subscriptions.
//!
//! Every write, the snapshot re-read that follows it, and the publish to
//! subscribers happen under one lock. That lock is the only serialization
//! point for task state, so a subscriber observes writes from a single caller
//! in the order they were issued, and a new subscriber can never miss a write
//! that lands between its initial snapshot and its registration.
//!
//! SQLite work runs on tokio's blocking pool. Dropping a pending `create` or
//! `update` future does not interrupt the write; it still commits (or fails)
//! as a whole.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use jot_core::store::TaskStore;
//!
//! let store = TaskStore::open(std::path::Path::new("jot.sqlite3"))?;
//! let mut live = store.subscribe().await?;
//! let initial = live.next().await;
//! store.create("water the plants").await?;
//! let updated = live.next().await;
//! # let _ = (initial, updated);
//! # Ok(())
//! # }
//! ```

use crate::db::{self, query};
use crate::model::{Snapshot, TaskRecord};
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Handle to the task database. Cheap to clone; clones share one connection
/// and one subscriber set.
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<StoreState>,
}

struct StoreState {
    conn: Connection,
    revision: u64,
    /// Last seen `PRAGMA data_version`, for noticing other processes' commits.
    data_version: i64,
    subscribers: Vec<mpsc::UnboundedSender<Snapshot>>,
}

impl StoreState {
    fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot::new(self.revision, query::list_tasks(&self.conn)?))
    }

    /// Bump the revision and push a fresh snapshot to every live subscriber,
    /// dropping the ones whose receiver is gone.
    fn publish(&mut self) -> Result<()> {
        self.revision += 1;
        let snapshot = self.snapshot()?;
        let before = self.subscribers.len();
        self.subscribers
            .retain(|subscriber| subscriber.send(snapshot.clone()).is_ok());
        debug!(
            revision = self.revision,
            tasks = snapshot.len(),
            subscribers = self.subscribers.len(),
            pruned = before - self.subscribers.len(),
            "published task snapshot"
        );
        Ok(())
    }
}

impl TaskStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or its schema is
    /// newer than this binary.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = db::open_database(path)?;
        let tasks = query::count_tasks(&conn)?;
        info!(path = %path.display(), tasks, "opened task store");
        Self::from_connection(conn)
    }

    /// A store backed by a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite cannot allocate the database.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let data_version = db::data_version(&conn)?;
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(StoreState {
                    conn,
                    revision: 0,
                    data_version,
                    subscribers: Vec::new(),
                }),
            }),
        })
    }

    /// Insert a new, not-completed task and notify every subscriber.
    ///
    /// `text` is stored as given; empty text is accepted.
    ///
    /// # Errors
    ///
    /// Storage faults are returned as-is; callers are not expected to recover.
    pub async fn create(&self, text: impl Into<String>) -> Result<TaskRecord> {
        let text = text.into();
        self.with_state(move |state| {
            let record = query::insert_task(&state.conn, &text)?;
            debug!(id = record.id, "created task");
            state.publish()?;
            Ok(record)
        })
        .await
    }

    /// Replace the stored task with the same id by `record`.
    ///
    /// Returns `false` when no task has that id; nothing is written and no
    /// subscriber is notified in that case.
    ///
    /// # Errors
    ///
    /// Storage faults are returned as-is; callers are not expected to recover.
    pub async fn update(&self, record: TaskRecord) -> Result<bool> {
        self.with_state(move |state| {
            let changed = query::update_task(&state.conn, &record)?;
            if changed {
                debug!(id = record.id, completed = record.is_completed, "updated task");
                state.publish()?;
            } else {
                debug!(id = record.id, "update ignored: no task with this id");
            }
            Ok(changed)
        })
        .await
    }

    /// Start a live view of the table.
    ///
    /// The returned subscription yields the current snapshot first, then one
    /// snapshot per later successful write. Subscribing again at any time
    /// starts a fresh, independent sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial snapshot cannot be read.
    pub async fn subscribe(&self) -> Result<Subscription> {
        self.with_state(|state| {
            let (tx, rx) = mpsc::unbounded_channel();
            let current = state.snapshot()?;
            // The receiver is alive, so this send cannot fail.
            let _ = tx.send(current);
            state.subscribers.push(tx);
            debug!(subscribers = state.subscribers.len(), "added task subscriber");
            Ok(Subscription { rx })
        })
        .await
    }

    /// The current snapshot, without subscribing.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be read.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.with_state(|state| state.snapshot()).await
    }

    /// Fetch one task by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be read.
    pub async fn get(&self, id: i64) -> Result<Option<TaskRecord>> {
        self.with_state(move |state| query::get_task(&state.conn, id))
            .await
    }

    /// Publish a fresh snapshot if another connection (usually another `jot`
    /// process) has committed to the database since the last check.
    ///
    /// Writes made through this store publish on their own and are not
    /// picked up here. Returns whether a snapshot was published.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be read.
    pub async fn refresh(&self) -> Result<bool> {
        self.with_state(|state| {
            let version = db::data_version(&state.conn)?;
            if version == state.data_version {
                return Ok(false);
            }
            state.data_version = version;
            debug!(data_version = version, "picked up an external commit");
            state.publish()?;
            Ok(true)
        })
        .await
    }

    /// Number of registered subscribers, including ones whose receiver was
    /// dropped since the last publish.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn subscriber_count(&self) -> Result<usize> {
        Ok(self.inner.lock()?.subscribers.len())
    }

    async fn with_state<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut StoreState) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut state = inner.lock()?;
            f(&mut state)
        })
        .await
        .context("task store worker did not complete")?
    }
}

impl Inner {
    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("task store lock poisoned"))
    }
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore").finish_non_exhaustive()
    }
}

/// A live sequence of snapshots from one [`TaskStore::subscribe`] call.
///
/// Ends (yields `None`) only once every handle to the store is dropped.
/// Dropping the subscription unregisters it on the next write.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Snapshot>,
}

impl Subscription {
    /// Wait for the next snapshot.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// The next snapshot if one is already queued.
    pub fn try_next(&mut self) -> Option<Snapshot> {
        self.rx.try_recv().ok()
    }

    /// Drain every queued snapshot and keep only the newest.
    pub fn latest(&mut self) -> Option<Snapshot> {
        let mut newest = None;
        while let Ok(snapshot) = self.rx.try_recv() {
            newest = Some(snapshot);
        }
        newest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn store() -> TaskStore {
        TaskStore::in_memory().expect("in-memory store")
    }

    async fn next_within(sub: &mut Subscription) -> Snapshot {
        timeout(Duration::from_secs(5), sub.next())
            .await
            .expect("snapshot should arrive")
            .expect("store still alive")
    }

    #[tokio::test]
    async fn create_assigns_fresh_ids_and_defaults_to_open() {
        let store = store();
        let a = store.create("first").await.expect("create");
        let b = store.create("second").await.expect("create");
        assert!(b.id > a.id);
        assert!(!a.is_completed && !b.is_completed);
        assert_eq!(store.get(a.id).await.expect("get"), Some(a));
    }

    #[tokio::test]
    async fn fresh_subscription_yields_current_state_immediately() {
        let store = store();
        let a = store.create("buy milk").await.expect("create");
        store.update(a.toggled()).await.expect("update");

        let mut sub = store.subscribe().await.expect("subscribe");
        let first = sub.try_next().expect("initial snapshot is queued on subscribe");
        assert_eq!(first.tasks(), &[a.toggled()]);
        assert_eq!(first.revision(), 2);
        assert!(sub.try_next().is_none());
    }

    #[tokio::test]
    async fn every_write_is_pushed_in_issue_order() {
        let store = store();
        let mut sub = store.subscribe().await.expect("subscribe");
        assert!(next_within(&mut sub).await.is_empty());

        let a = store.create("a").await.expect("create");
        let b = store.create("b").await.expect("create");
        store.update(a.toggled()).await.expect("update");

        let s1 = next_within(&mut sub).await;
        let s2 = next_within(&mut sub).await;
        let s3 = next_within(&mut sub).await;
        assert_eq!(s1.tasks(), &[a.clone()]);
        assert_eq!(s2.tasks(), &[a.clone(), b.clone()]);
        assert_eq!(s3.tasks(), &[a.toggled(), b]);
        assert!(s1.revision() < s2.revision() && s2.revision() < s3.revision());
    }

    #[tokio::test]
    async fn update_of_missing_id_changes_nothing_and_notifies_nobody() {
        let store = store();
        let a = store.create("real").await.expect("create");
        let mut sub = store.subscribe().await.expect("subscribe");
        let before = next_within(&mut sub).await;

        let ghost = TaskRecord {
            id: a.id + 1000,
            text: "ghost".into(),
            is_completed: true,
        };
        assert!(!store.update(ghost).await.expect("update"));

        assert!(sub.try_next().is_none());
        assert_eq!(store.snapshot().await.expect("snapshot"), before);
    }

    #[tokio::test]
    async fn every_subscriber_receives_each_write() {
        let store = store();
        let mut first = store.subscribe().await.expect("subscribe");
        let mut second = store.subscribe().await.expect("subscribe");
        next_within(&mut first).await;
        next_within(&mut second).await;

        store.create("shared").await.expect("create");

        assert_eq!(next_within(&mut first).await.len(), 1);
        assert_eq!(next_within(&mut second).await.len(), 1);
    }

    #[tokio::test]
    async fn dropped_subscriptions_are_pruned_on_publish() {
        let store = store();
        let keep = store.subscribe().await.expect("subscribe");
        let gone = store.subscribe().await.expect("subscribe");
        assert_eq!(store.subscriber_count().expect("count"), 2);

        drop(gone);
        store.create("prune").await.expect("create");
        assert_eq!(store.subscriber_count().expect("count"), 1);
        drop(keep);
    }

    #[tokio::test]
    async fn latest_coalesces_queued_snapshots() {
        let store = store();
        let mut sub = store.subscribe().await.expect("subscribe");
        for text in ["a", "b", "c"] {
            store.create(text).await.expect("create");
        }
        let newest = sub.latest().expect("queued snapshots");
        assert_eq!(newest.len(), 3);
        assert!(sub.try_next().is_none());
    }

    #[tokio::test]
    async fn subscription_ends_when_store_is_dropped() {
        let store = store();
        let mut sub = store.subscribe().await.expect("subscribe");
        next_within(&mut sub).await;
        drop(store);
        assert!(sub.next().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_get_unique_ids() {
        let store = store();
        let mut handles = Vec::new();
        for n in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(format!("task {n}")).await
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.expect("join").expect("create").id);
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 32);

        let snapshot = store.snapshot().await.expect("snapshot");
        let listed: Vec<i64> = snapshot.tasks().iter().map(|t| t.id).collect();
        assert_eq!(listed, ids);
        assert_eq!(snapshot.revision(), 32);
    }

    #[tokio::test]
    async fn store_survives_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("jot.sqlite3");
        let created = {
            let store = TaskStore::open(&path).expect("open");
            store.create("durable").await.expect("create")
        };
        let reopened = TaskStore::open(&path).expect("reopen");
        let snapshot = reopened.snapshot().await.expect("snapshot");
        assert_eq!(snapshot.tasks(), &[created]);
        assert_eq!(snapshot.revision(), 0);
    }

    #[tokio::test]
    async fn refresh_publishes_commits_from_another_connection() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("jot.sqlite3");
        let watcher = TaskStore::open(&path).expect("open watcher");
        let writer = TaskStore::open(&path).expect("open writer");

        let mut sub = watcher.subscribe().await.expect("subscribe");
        assert!(next_within(&mut sub).await.is_empty());
        assert!(!watcher.refresh().await.expect("refresh"), "nothing committed yet");

        let created = writer.create("from elsewhere").await.expect("create");
        assert!(watcher.refresh().await.expect("refresh"));
        let snapshot = next_within(&mut sub).await;
        assert_eq!(snapshot.tasks(), &[created]);
        assert_eq!(snapshot.revision(), 1);

        assert!(!watcher.refresh().await.expect("refresh"), "commit already seen");
        assert!(sub.try_next().is_none());
    }

    #[tokio::test]
    async fn refresh_ignores_own_writes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = TaskStore::open(&dir.path().join("jot.sqlite3")).expect("open");
        store.create("local").await.expect("create");
        assert!(!store.refresh().await.expect("refresh"));
    }
}
