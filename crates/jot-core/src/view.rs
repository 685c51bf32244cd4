//! Presentation-facing state, bound to the lifetime of a screen.
//!
//! A [`ViewScope`] owns every background task a screen starts. Dropping the
//! scope (the screen is dismissed) aborts whatever is still running. Store
//! writes already handed to SQLite finish as a unit, so an abort never leaves
//! a half-applied record.
//!
//! The models are identity adapters: [`TaskListModel`] republishes the store's
//! snapshots, [`ProfileModel`] republishes the fetcher's [`ProfileView`].

use crate::model::{ProfileView, Snapshot, TaskRecord};
use crate::profile::{ProfileFetcher, ProfileSource};
use crate::service::TaskService;
use anyhow::{Result, anyhow};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Owner of a screen's background tasks.
///
/// Must be used from within a tokio runtime.
pub struct ViewScope {
    name: &'static str,
    tasks: JoinSet<Result<()>>,
}

impl ViewScope {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            tasks: JoinSet::new(),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Run `future` until it finishes or the scope is dropped.
    pub fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.tasks.spawn(future);
    }

    /// Number of tasks that have not been collected by [`Self::poll_fault`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Collect finished tasks and surface the first fault among them.
    ///
    /// Storage faults are not recoverable here; callers are expected to
    /// propagate the error and tear the application down.
    ///
    /// # Errors
    ///
    /// Returns the error of a task that failed, or a description of a task
    /// that panicked.
    pub fn poll_fault(&mut self) -> Result<()> {
        while let Some(joined) = self.tasks.try_join_next() {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(fault)) => {
                    error!(scope = self.name, error = %fault, "background task failed");
                    return Err(fault);
                }
                Err(join_error) if join_error.is_cancelled() => {}
                Err(join_error) => {
                    error!(scope = self.name, error = %join_error, "background task panicked");
                    return Err(anyhow!("{} task panicked: {join_error}", self.name));
                }
            }
        }
        Ok(())
    }

    /// Abort every running task now.
    pub fn cancel(&mut self) {
        if !self.tasks.is_empty() {
            debug!(scope = self.name, tasks = self.tasks.len(), "cancelling view tasks");
        }
        self.tasks.abort_all();
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for ViewScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewScope")
            .field("name", &self.name)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

/// A write requested by the task-list screen.
#[derive(Debug)]
enum Intent {
    Add(String),
    Toggle(TaskRecord),
}

/// Live task list for the task-list screen.
///
/// Starts with an empty snapshot and follows the store from then on. Writes
/// are queued to a single worker, so the store applies them in the order the
/// screen issued them.
#[derive(Debug)]
pub struct TaskListModel {
    scope: ViewScope,
    intents: mpsc::UnboundedSender<Intent>,
    tasks: watch::Receiver<Snapshot>,
}

impl TaskListModel {
    #[must_use]
    pub fn new(service: TaskService) -> Self {
        let (tx, tasks) = watch::channel(Snapshot::default());
        let mut scope = ViewScope::new("task-list");

        let store = service.store().clone();
        scope.spawn(async move {
            let mut subscription = store.subscribe().await?;
            while let Some(snapshot) = subscription.next().await {
                if tx.send(snapshot).is_err() {
                    break;
                }
            }
            Ok(())
        });

        let (intents, mut queue) = mpsc::unbounded_channel();
        scope.spawn(async move {
            while let Some(intent) = queue.recv().await {
                match intent {
                    Intent::Add(text) => {
                        service.add_task(text).await?;
                    }
                    Intent::Toggle(record) => {
                        service.toggle_task(&record).await?;
                    }
                }
            }
            Ok(())
        });

        Self {
            scope,
            intents,
            tasks,
        }
    }

    /// The most recent snapshot received from the store.
    #[must_use]
    pub fn tasks(&self) -> Snapshot {
        self.tasks.borrow().clone()
    }

    /// A receiver that is notified whenever a new snapshot lands.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.tasks.clone()
    }

    /// Fire-and-forget: create a task from `text`.
    pub fn add_task(&self, text: impl Into<String>) {
        self.submit(Intent::Add(text.into()));
    }

    /// Fire-and-forget: flip the completion flag of `record`.
    pub fn toggle_task(&self, record: TaskRecord) {
        self.submit(Intent::Toggle(record));
    }

    fn submit(&self, intent: Intent) {
        // The worker only exits after a storage fault, which poll_fault reports.
        if let Err(rejected) = self.intents.send(intent) {
            warn!(intent = ?rejected.0, "task writer has stopped; dropping write");
        }
    }

    /// See [`ViewScope::poll_fault`].
    ///
    /// # Errors
    ///
    /// Returns the first storage fault raised by a background write.
    pub fn poll_fault(&mut self) -> Result<()> {
        self.scope.poll_fault()
    }
}

/// Tri-state profile for the profile screen.
#[derive(Debug)]
pub struct ProfileModel {
    scope: ViewScope,
    fetcher: ProfileFetcher,
    view: watch::Receiver<ProfileView>,
}

impl ProfileModel {
    /// A model with its own view sink, in the `Loading` state.
    #[must_use]
    pub fn new(source: Arc<dyn ProfileSource>) -> Self {
        let fetcher = ProfileFetcher::new(source);
        let view = fetcher.subscribe();
        Self {
            scope: ViewScope::new("profile"),
            fetcher,
            view,
        }
    }

    /// A model that starts fetching `handle` right away, as a screen does on mount.
    #[must_use]
    pub fn mount(source: Arc<dyn ProfileSource>, handle: impl Into<String>) -> Self {
        let mut model = Self::new(source);
        model.load(handle);
        model
    }

    /// Start a fetch in the background. Earlier fetches keep running.
    pub fn load(&mut self, handle: impl Into<String>) {
        let fetcher = self.fetcher.clone();
        let handle = handle.into();
        self.scope.spawn(async move {
            fetcher.fetch(&handle).await;
            Ok(())
        });
    }

    #[must_use]
    pub fn view(&self) -> ProfileView {
        self.view.borrow().clone()
    }

    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ProfileView> {
        self.view.clone()
    }

    #[must_use]
    pub const fn fetcher(&self) -> &ProfileFetcher {
        &self.fetcher
    }

    /// See [`ViewScope::poll_fault`].
    ///
    /// # Errors
    ///
    /// Returns an error only if a fetch task panicked.
    pub fn poll_fault(&mut self) -> Result<()> {
        self.scope.poll_fault()
    }
}
